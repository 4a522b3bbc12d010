//! 发帖响应分类 - 业务能力层
//!
//! 纯函数：输入响应体与最终地址，输出 [`ReplyOutcome`]。不做任何 IO，可在任意线程调用。
//!
//! 识别规则按优先级依次为：
//!
//! 1. 验证码标记：响应体包含 `"captcha": true`（冒号后最多一个空格，大小写敏感）
//! 2. 错误页：`<h1 ...>Error</h1>` 之后出现的最后一个 `<h2 ...>详情</h2>`
//! 3. 帖子地址：路径形如 `/<word>/<word>/<digits>`，数字为主题帖编号；
//!    若地址带片段，片段即回复编号，否则回复编号等于主题帖编号

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{ReplyOutcome, ResponseContext};

/// 找不到帖子编号时返回的错误信息
pub const THREAD_NOT_FOUND_MESSAGE: &str = "Error posting: could not find posted thread.";

static CAPTCHA_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""captcha": ?true"#).expect("captcha 正则"));

// 站点错误页通常跨行，这里允许 `.` 匹配换行；贪婪的 `.*` 取标题之后最后一个 h2
static ERROR_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<h1[^>]*>Error</h1>.*<h2[^>]*>(.*?)</h2>").expect("错误页正则")
});

static THREAD_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/\w+/\w+/([0-9]+)").expect("帖子路径正则"));

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("标签正则"));

/// 对一次发帖响应进行分类
pub fn classify(response_body: &str, context: &ResponseContext) -> ReplyOutcome {
    if CAPTCHA_MARKER.is_match(response_body) {
        return ReplyOutcome::NeedsAuthentication {
            raw_detail: response_body.to_string(),
        };
    }

    if let Some(message) = extract_error_detail(response_body) {
        return ReplyOutcome::Error { message };
    }

    match parse_post_location(context) {
        Some((thread_no, post_no)) => ReplyOutcome::Posted { thread_no, post_no },
        None => ReplyOutcome::Error {
            message: THREAD_NOT_FOUND_MESSAGE.to_string(),
        },
    }
}

/// 从错误页中取出 `<h2>` 详情并转为纯文本
pub fn extract_error_detail(body: &str) -> Option<String> {
    ERROR_BLOCK
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| html_to_text(m.as_str()))
}

/// 从最终地址解析 (主题帖编号, 回复编号)
///
/// 路径不匹配、数字溢出、片段不是纯数字时都返回 `None`。
pub fn parse_post_location(context: &ResponseContext) -> Option<(u64, u64)> {
    let caps = THREAD_PATH.captures(&context.encoded_path)?;
    let thread_no: u64 = caps.get(1)?.as_str().parse().ok()?;

    let post_no = match context.encoded_fragment.as_deref() {
        Some(fragment) => fragment.parse().ok()?,
        None => thread_no,
    };

    Some((thread_no, post_no))
}

/// 去掉标签、解码实体、折叠空白
pub fn html_to_text(fragment: &str) -> String {
    let without_tags = HTML_TAG.replace_all(fragment, " ");
    html_escape::decode_html_entities(&without_tags)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(path: &str, fragment: Option<&str>) -> ResponseContext {
        ResponseContext::new(path, fragment)
    }

    #[test]
    fn test_captcha_marker_wins_over_everything() {
        let body = r#"<h1>Error</h1><h2>nope</h2>{"captcha": true}"#;
        let outcome = classify(body, &ctx("/b/res/1", None));
        assert_eq!(
            outcome,
            ReplyOutcome::NeedsAuthentication {
                raw_detail: body.to_string()
            }
        );
    }

    #[test]
    fn test_captcha_marker_without_space() {
        let body = r#"{"error":"x","captcha":true}"#;
        assert!(classify(body, &ctx("/", None)).needs_authentication());
    }

    #[test]
    fn test_captcha_marker_is_case_sensitive() {
        let body = r#"{"Captcha": TRUE}"#;
        assert!(!classify(body, &ctx("/b/res/5", None)).needs_authentication());
    }

    #[test]
    fn test_captcha_false_is_not_marker() {
        let body = r#"{"captcha": false}"#;
        assert_eq!(
            classify(body, &ctx("/b/res/5", None)),
            ReplyOutcome::Posted {
                thread_no: 5,
                post_no: 5
            }
        );
    }

    #[test]
    fn test_error_block_is_unescaped() {
        let body = "<html><body><h1 class=\"t\">Error</h1>\n<p>..</p>\n<h2>Flood &amp; spam &lt;detected&gt; &#39;x&#39;</h2></body></html>";
        assert_eq!(
            classify(body, &ctx("/b/res/12345", None)),
            ReplyOutcome::Error {
                message: "Flood & spam <detected> 'x'".to_string()
            }
        );
    }

    #[test]
    fn test_error_detail_strips_inner_tags() {
        let body = "<h1>Error</h1><h2>File <b>too</b>&nbsp;large</h2>";
        assert_eq!(extract_error_detail(body).as_deref(), Some("File too large"));
    }

    #[test]
    fn test_error_detail_decodes_named_entities() {
        let body = "<h1>Error</h1><h2>Caf&eacute; &rsquo;x&rsquo; &laquo;y&raquo; &sup2;</h2>";
        assert_eq!(
            classify(body, &ctx("/b/res/1", None)),
            ReplyOutcome::Error {
                message: "Café ’x’ «y» ²".to_string()
            }
        );
    }

    #[test]
    fn test_last_h2_after_error_heading_wins() {
        let body = "<h1>Error</h1><h2>Generic</h2>\n<p>..</p>\n<h2>Flood detected</h2>";
        assert_eq!(
            classify(body, &ctx("/b/res/1", None)),
            ReplyOutcome::Error {
                message: "Flood detected".to_string()
            }
        );
    }

    #[test]
    fn test_h2_without_error_heading_is_ignored() {
        let body = "<h1>Thread</h1><h2>Subject</h2>";
        assert!(classify(body, &ctx("/b/res/7", None)).is_posted());
    }

    #[test]
    fn test_posted_without_fragment() {
        assert_eq!(
            classify("ok", &ctx("/b/res/12345", None)),
            ReplyOutcome::Posted {
                thread_no: 12345,
                post_no: 12345
            }
        );
    }

    #[test]
    fn test_posted_with_fragment() {
        assert_eq!(
            classify("ok", &ctx("/b/res/12345", Some("67890"))),
            ReplyOutcome::Posted {
                thread_no: 12345,
                post_no: 67890
            }
        );
    }

    #[test]
    fn test_path_with_suffix_still_matches() {
        assert_eq!(
            parse_post_location(&ctx("/b/res/12345.html", None)),
            Some((12345, 12345))
        );
    }

    #[test]
    fn test_unmatched_path_is_error() {
        for path in ["/", "/b/", "/b/12345", "/b/res/abc"] {
            assert_eq!(
                classify("", &ctx(path, None)),
                ReplyOutcome::Error {
                    message: THREAD_NOT_FOUND_MESSAGE.to_string()
                },
                "path: {}",
                path
            );
        }
    }

    #[test]
    fn test_non_numeric_fragment_is_error() {
        assert_eq!(
            classify("", &ctx("/b/res/12345", Some("p67890"))),
            ReplyOutcome::Error {
                message: THREAD_NOT_FOUND_MESSAGE.to_string()
            }
        );
        assert!(!classify("", &ctx("/b/res/12345", Some(""))).is_posted());
    }

    #[test]
    fn test_overflowing_thread_number_is_error() {
        let outcome = classify("", &ctx("/b/res/99999999999999999999999", None));
        assert_eq!(
            outcome,
            ReplyOutcome::Error {
                message: THREAD_NOT_FOUND_MESSAGE.to_string()
            }
        );
    }

    #[test]
    fn test_unknown_entity_left_untouched() {
        assert_eq!(html_to_text("a &bogus; b &#x41;"), "a &bogus; b A");
    }
}
