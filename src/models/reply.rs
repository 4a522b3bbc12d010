//! 发帖请求

use std::fmt::Display;

/// 附件（文件名 + 原始字节）
#[derive(Clone, PartialEq, Eq)]
pub struct ReplyFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for ReplyFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplyFile")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// 一次发帖请求
///
/// 提交后不再修改；验证码重试时复用同一个请求，token 单独附加。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReplyRequest {
    /// 板块代码，例如 `b`
    pub board: String,
    /// 回复的主题帖编号，`None` 表示发新串
    pub thread_no: Option<u64>,
    /// 删帖密码
    pub password: String,
    /// 显示名称
    pub name: String,
    /// 选项栏（email 字段，sage 等）
    pub options: String,
    pub subject: Option<String>,
    /// 正文
    pub comment: String,
    pub file: Option<ReplyFile>,
    pub spoiler: bool,
}

impl ReplyRequest {
    /// 回复已有主题帖
    pub fn reply_to(board: impl Into<String>, thread_no: u64, comment: impl Into<String>) -> Self {
        Self {
            board: board.into(),
            thread_no: Some(thread_no),
            comment: comment.into(),
            ..Default::default()
        }
    }

    /// 发新串
    pub fn new_thread(board: impl Into<String>, comment: impl Into<String>) -> Self {
        Self {
            board: board.into(),
            comment: comment.into(),
            ..Default::default()
        }
    }
}

impl Display for ReplyRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.thread_no {
            Some(no) => write!(f, "[/{}/{}]", self.board, no),
            None => write!(f, "[/{}/ 新串]", self.board),
        }
    }
}
