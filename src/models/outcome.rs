//! 发帖结果与响应上下文

use reqwest::Url;

/// 一次发帖响应的分类结果
///
/// 每次分类只会得到其中一种。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// 发帖成功
    Posted { thread_no: u64, post_no: u64 },
    /// 站点要求先通过验证码，`raw_detail` 为完整响应体
    NeedsAuthentication { raw_detail: String },
    /// 站点拒绝了本次发帖，`message` 已去除 HTML 转义，可直接展示
    Error { message: String },
}

impl ReplyOutcome {
    pub fn is_posted(&self) -> bool {
        matches!(self, ReplyOutcome::Posted { .. })
    }

    pub fn needs_authentication(&self) -> bool {
        matches!(self, ReplyOutcome::NeedsAuthentication { .. })
    }
}

/// 响应的最终地址（重定向之后）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseContext {
    /// 已编码的路径，例如 `/b/res/12345`
    pub encoded_path: String,
    /// 已编码的片段（`#` 之后的部分）
    pub encoded_fragment: Option<String>,
}

impl ResponseContext {
    pub fn new(encoded_path: impl Into<String>, encoded_fragment: Option<&str>) -> Self {
        Self {
            encoded_path: encoded_path.into(),
            encoded_fragment: encoded_fragment.map(str::to_string),
        }
    }

    pub fn from_url(url: &Url) -> Self {
        Self::new(url.path(), url.fragment())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_from_url_with_fragment() {
        let url = Url::parse("https://example.org/b/res/12345#67890").unwrap();
        let ctx = ResponseContext::from_url(&url);
        assert_eq!(ctx.encoded_path, "/b/res/12345");
        assert_eq!(ctx.encoded_fragment.as_deref(), Some("67890"));
    }

    #[test]
    fn test_context_from_url_without_fragment() {
        let url = Url::parse("https://example.org/b/res/12345").unwrap();
        let ctx = ResponseContext::from_url(&url);
        assert_eq!(ctx.encoded_fragment, None);
    }
}
