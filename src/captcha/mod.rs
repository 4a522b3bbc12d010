//! 验证码流程
//!
//! - `entry` - 验证码入口：把外部异步到达的 token 写入 [`CaptchaHolder`]，并通知等待方
//! - `nojs` - reCAPTCHA 无 JS 回退页面，在浏览器页面中由用户完成
//!
//! [`CaptchaHolder`]: crate::services::CaptchaHolder

pub mod entry;
pub mod nojs;

use std::future::Future;

use crate::error::Result;
use crate::services::captcha_holder::Clock;

pub use entry::{CaptchaEntry, CaptchaWaiter, TokenEvent};
pub use nojs::{challenge_url, is_same_origin, CaptchaNojsChallenge};

/// 验证码提供方
///
/// 实现方负责展示验证码，并在拿到 token 后调用 [`CaptchaEntry::on_token_received`]。
/// 返回时入口应当已经完成；调用方自行决定等待多久。
pub trait Authenticator: Send + Sync {
    fn authenticate<C: Clock>(
        &self,
        entry: &CaptchaEntry<C>,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// 站点不需要验证码时使用的占位实现
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuthenticator;

impl Authenticator for NoAuthenticator {
    async fn authenticate<C: Clock>(&self, _entry: &CaptchaEntry<C>) -> Result<()> {
        Ok(())
    }
}
