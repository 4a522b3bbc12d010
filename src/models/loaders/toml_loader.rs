use crate::error::{AppError, Result};
use crate::models::reply::{ReplyFile, ReplyRequest};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs;

/// 回帖草稿（TOML 文件格式）
///
/// ```toml
/// board = "b"
/// thread_no = 12345
/// name = "Anonymous"
/// comment = "正文"
/// file_path = "cat.png"
/// spoiler = true
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ReplyDraft {
    pub board: String,
    #[serde(default)]
    pub thread_no: Option<u64>,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub options: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub comment: String,
    /// 附件路径，相对路径以草稿文件所在目录为基准
    #[serde(default)]
    pub file_path: Option<PathBuf>,
    #[serde(default)]
    pub spoiler: bool,
}

impl ReplyDraft {
    /// 读取附件并生成发帖请求
    pub async fn into_request(self, base_dir: &Path) -> Result<ReplyRequest> {
        let file = match &self.file_path {
            Some(path) => {
                let full = if path.is_absolute() {
                    path.clone()
                } else {
                    base_dir.join(path)
                };
                let bytes = fs::read(&full)
                    .await
                    .map_err(|e| AppError::file_read_failed(full.display().to_string(), e))?;
                let name = full
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| "file".to_string());
                tracing::debug!("已读取附件 {} ({} 字节)", name, bytes.len());
                Some(ReplyFile { name, bytes })
            }
            None => None,
        };

        Ok(ReplyRequest {
            board: self.board,
            thread_no: self.thread_no,
            password: self.password,
            name: self.name,
            options: self.options,
            subject: self.subject,
            comment: self.comment,
            file,
            spoiler: self.spoiler,
        })
    }
}

/// 从 TOML 文件加载回帖草稿并转换为 ReplyRequest
pub async fn load_reply_from_toml(toml_file_path: &Path) -> Result<ReplyRequest> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .map_err(|e| AppError::file_read_failed(toml_file_path.display().to_string(), e))?;

    let draft: ReplyDraft = toml::from_str(&content)
        .map_err(|e| AppError::toml_parse_failed(toml_file_path.display().to_string(), e))?;

    let base_dir = toml_file_path.parent().unwrap_or_else(|| Path::new("."));
    let request = draft.into_request(base_dir).await?;

    tracing::info!(
        "已加载回帖草稿 {}: {}",
        toml_file_path.display(),
        request
    );

    Ok(request)
}
