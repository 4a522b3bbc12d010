//! reCAPTCHA 无 JS 回退页面
//!
//! 用 reqwest 拉取回退页面（带上 User-Agent 与站点 Referer），放进浏览器页面交给用户完成，
//! 然后定时读取页面上的 `.fbc-verification-token textarea`。

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::header::{REFERER, USER_AGENT};
use reqwest::Url;
use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::captcha::entry::{CaptchaEntry, TokenEvent};
use crate::captcha::Authenticator;
use crate::config::Config;
use crate::error::{ConfigError, Result};
use crate::infrastructure::JsExecutor;
use crate::models::SiteAuthentication;
use crate::services::captcha_holder::Clock;

const FALLBACK_URL: &str = "https://www.google.com/recaptcha/api/fallback";

// 元素不存在时 found 为 false，表示用户还没完成
const READ_TOKEN_JS: &str = r#"
(() => {
    const el = document.querySelector('.fbc-verification-token textarea');
    return { found: !!el, value: el ? el.value : "" };
})()
"#;

static HEAD_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<head[^>]*>").expect("head 正则"));

/// 回退页面地址
pub fn challenge_url(site_key: &str) -> String {
    format!("{}?k={}", FALLBACK_URL, site_key)
}

/// 页面跳转策略：目标地址是否与站点同源，同源的留在验证码页面内打开
///
/// 无法解析或没有 host 的地址留在页面内；与站点 host 相同的地址留在页面内；其余交给外部打开。
pub fn is_same_origin(url: &str, base_url: &str) -> bool {
    let host = match Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_string)) {
        Some(host) => host,
        None => return true,
    };
    let base_host = Url::parse(base_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string));
    base_host.as_deref() == Some(host.as_str())
}

/// 在 `<head>` 后插入 `<base>`，让回退页面里的相对地址指向 google
pub fn with_base_href(html: &str, base: &str) -> String {
    let tag = format!(r#"<base href="{}">"#, base);
    match HEAD_OPEN.find(html) {
        Some(m) => format!("{}{}{}", &html[..m.end()], tag, &html[m.end()..]),
        None => format!("{}{}", tag, html),
    }
}

#[derive(Debug, Deserialize)]
struct TokenField {
    found: bool,
    value: String,
}

/// 浏览器页面中的无 JS 回退验证码
pub struct CaptchaNojsChallenge {
    executor: JsExecutor,
    http: reqwest::Client,
    site_key: String,
    base_url: String,
    user_agent: String,
    poll_interval: Duration,
}

impl CaptchaNojsChallenge {
    pub fn new(executor: JsExecutor, config: &Config) -> Result<Self> {
        let (site_key, base_url) = match config.authentication() {
            SiteAuthentication::Recaptcha { site_key, base_url } => (site_key, base_url),
            SiteAuthentication::None => return Err(ConfigError::MissingSiteKey.into()),
        };

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            executor,
            http,
            site_key,
            base_url,
            user_agent: config.user_agent.clone(),
            poll_interval: config.captcha_poll_interval(),
        })
    }

    /// 拉取回退页面并放进浏览器（即重新出题）
    pub async fn load(&self) -> Result<()> {
        let url = challenge_url(&self.site_key);
        debug!("拉取验证码页面: {}", url);

        let html = self
            .http
            .get(&url)
            .header(USER_AGENT, &self.user_agent)
            .header(REFERER, &self.base_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        self.executor.set_user_agent(&self.user_agent).await?;
        self.executor.load_html(&with_base_href(&html, &url)).await?;
        info!("🔐 验证码已加载，请在浏览器中完成验证");
        Ok(())
    }

    /// 读取一次页面上的 token，元素不存在时返回 `None`
    pub async fn poll_once(&self) -> Result<Option<String>> {
        let field: TokenField = self.executor.eval_as(READ_TOKEN_JS).await?;
        Ok(field.found.then_some(field.value))
    }

    /// 加载验证码并轮询，直到入口收到有效 token
    pub async fn run<C: Clock>(&self, entry: &CaptchaEntry<C>) -> Result<()> {
        self.load().await?;

        loop {
            sleep(self.poll_interval).await;

            if let Some(current) = self.executor.current_url().await? {
                let leaves_page =
                    !current.starts_with(FALLBACK_URL) && !is_same_origin(&current, &self.base_url);
                if leaves_page {
                    warn!("验证码页面跳转到外部链接，请在外部浏览器打开: {}", current);
                    self.load().await?;
                    continue;
                }
            }

            let Some(token) = self.poll_once().await? else {
                continue;
            };

            match entry.on_token_received(&token) {
                TokenEvent::Stored => return Ok(()),
                TokenEvent::ResetRequested => self.load().await?,
            }
        }
    }
}

impl Authenticator for CaptchaNojsChallenge {
    async fn authenticate<C: Clock>(&self, entry: &CaptchaEntry<C>) -> Result<()> {
        self.run(entry).await
    }
}
