//! 发帖表单组装 - 业务能力层

use reqwest::multipart::{Form, Part};

use crate::models::ReplyRequest;

/// 附加到表单上的验证码参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptchaParam {
    pub field_name: String,
    pub token: String,
}

impl CaptchaParam {
    pub fn new(field_name: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            token: token.into(),
        }
    }
}

/// 组装文本字段（不含附件）
///
/// - `thread` 只在回复已有主题帖时出现
/// - `subject` 为空时不发送
/// - 勾选防剧透时附加 `spoiler=on`
/// - 带验证码时最后附加 token 字段
pub fn build_post_fields(
    reply: &ReplyRequest,
    captcha: Option<&CaptchaParam>,
) -> Vec<(String, String)> {
    let mut fields = vec![("board".to_string(), reply.board.clone())];

    if let Some(thread_no) = reply.thread_no {
        fields.push(("thread".to_string(), thread_no.to_string()));
    }

    fields.push(("password".to_string(), reply.password.clone()));
    fields.push(("name".to_string(), reply.name.clone()));
    fields.push(("email".to_string(), reply.options.clone()));

    if let Some(subject) = reply.subject.as_deref().filter(|s| !s.is_empty()) {
        fields.push(("subject".to_string(), subject.to_string()));
    }

    fields.push(("body".to_string(), reply.comment.clone()));

    if reply.spoiler {
        fields.push(("spoiler".to_string(), "on".to_string()));
    }

    if let Some(captcha) = captcha {
        fields.push((captcha.field_name.clone(), captcha.token.clone()));
    }

    fields
}

/// 附件部分，没有附件时为 `None`
pub fn build_file_part(reply: &ReplyRequest) -> Option<Part> {
    let file = reply.file.as_ref()?;
    let part = Part::bytes(file.bytes.clone())
        .file_name(file.name.clone())
        .mime_str("application/octet-stream")
        .unwrap_or_else(|_| Part::bytes(file.bytes.clone()).file_name(file.name.clone()));
    Some(part)
}

/// 组装 multipart 表单
pub fn build_multipart(reply: &ReplyRequest, captcha: Option<&CaptchaParam>) -> Form {
    let form = build_post_fields(reply, captcha)
        .into_iter()
        .fold(Form::new(), |form, (key, value)| form.text(key, value));

    match build_file_part(reply) {
        Some(part) => form.part("file", part),
        None => form,
    }
}
