//! 发帖流程 - 流程层
//!
//! 流程顺序：
//! 1. 提交（如果仓库里有有效 token 就一并带上）→ 分类
//! 2. 需要验证码时交给 Authenticator，等待入口完成
//! 3. 消费 token 重新提交，最多 `max_auth_attempts` 轮

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::captcha::{Authenticator, CaptchaEntry, NoAuthenticator};
use crate::clients::ReplyTransport;
use crate::config::Config;
use crate::error::{CaptchaError, Result};
use crate::models::{ReplyOutcome, ReplyRequest, ResponseContext};
use crate::services::captcha_holder::{CaptchaHolder, Clock, SystemClock};
use crate::services::post_form::CaptchaParam;
use crate::services::reply_classifier::classify;
use crate::utils::logging::truncate_text;

/// 发帖流程
///
/// - 编排"提交 → 分类 → 验证 → 重试"
/// - 不持有浏览器资源，验证码由 Authenticator 负责
/// - token 一次性使用：每次提交前 `consume`
pub struct ReplyFlow<T, A = NoAuthenticator, C: Clock = SystemClock> {
    transport: T,
    authenticator: Option<A>,
    holder: Arc<CaptchaHolder<C>>,
    captcha_field_name: String,
    captcha_ttl: Duration,
    wait_timeout: Duration,
    max_auth_attempts: usize,
}

impl<T: ReplyTransport> ReplyFlow<T> {
    /// 创建不带验证码能力的流程
    pub fn new(transport: T, config: &Config) -> Self {
        Self {
            transport,
            authenticator: None,
            holder: Arc::new(CaptchaHolder::new()),
            captcha_field_name: config.captcha_field_name.clone(),
            captcha_ttl: config.captcha_ttl(),
            wait_timeout: config.captcha_wait_timeout(),
            max_auth_attempts: config.max_auth_attempts,
        }
    }
}

impl<T, A, C> ReplyFlow<T, A, C>
where
    T: ReplyTransport,
    A: Authenticator,
    C: Clock,
{
    /// 配置验证码提供方
    pub fn with_authenticator<A2: Authenticator>(self, authenticator: A2) -> ReplyFlow<T, A2, C> {
        ReplyFlow {
            transport: self.transport,
            authenticator: Some(authenticator),
            holder: self.holder,
            captcha_field_name: self.captcha_field_name,
            captcha_ttl: self.captcha_ttl,
            wait_timeout: self.wait_timeout,
            max_auth_attempts: self.max_auth_attempts,
        }
    }

    /// 使用外部共享的 token 仓库
    pub fn with_holder<C2: Clock>(self, holder: Arc<CaptchaHolder<C2>>) -> ReplyFlow<T, A, C2> {
        ReplyFlow {
            transport: self.transport,
            authenticator: self.authenticator,
            holder,
            captcha_field_name: self.captcha_field_name,
            captcha_ttl: self.captcha_ttl,
            wait_timeout: self.wait_timeout,
            max_auth_attempts: self.max_auth_attempts,
        }
    }

    pub fn holder(&self) -> &Arc<CaptchaHolder<C>> {
        &self.holder
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// 执行一次完整的发帖
    ///
    /// 网络、浏览器、验证码等待失败返回 `Err`；站点的判定一律以 [`ReplyOutcome`] 返回。
    pub async fn run(&self, reply: &ReplyRequest) -> Result<ReplyOutcome> {
        let mut outcome = self.submit_once(reply).await?;
        let mut rounds = 0;

        while outcome.needs_authentication() {
            let Some(authenticator) = &self.authenticator else {
                warn!("{} 站点要求验证码，但没有配置验证方式", reply);
                break;
            };
            if rounds >= self.max_auth_attempts {
                warn!("{} 已完成 {} 轮验证码仍被要求验证，放弃", reply, rounds);
                break;
            }
            rounds += 1;

            info!("{} 🔐 需要验证码 (第 {} 轮)", reply, rounds);
            self.obtain_token(authenticator).await?;
            outcome = self.submit_once(reply).await?;
        }

        self.log_outcome(reply, &outcome);
        Ok(outcome)
    }

    /// 提交一次并分类
    async fn submit_once(&self, reply: &ReplyRequest) -> Result<ReplyOutcome> {
        let captcha = self
            .holder
            .consume()
            .map(|token| CaptchaParam::new(self.captcha_field_name.clone(), token));

        info!(
            "{} 📤 正在提交{}...",
            reply,
            if captcha.is_some() { "（附带验证码）" } else { "" }
        );

        let raw = self.transport.submit(reply, captcha.as_ref()).await?;
        Ok(classify(&raw.body, &ResponseContext::from_url(&raw.final_url)))
    }

    /// 启动验证码并等待入口完成
    async fn obtain_token(&self, authenticator: &A) -> Result<()> {
        let (entry, waiter) = CaptchaEntry::new(self.holder.clone(), self.captcha_ttl);
        let wait = waiter.wait(self.wait_timeout);
        let auth = authenticator.authenticate(&entry);

        tokio::select! {
            biased;
            res = wait => res,
            res = auth => {
                res?;
                // 提供方可能在同一次轮询中完成入口并返回
                if entry.is_completed() {
                    Ok(())
                } else {
                    Err(CaptchaError::Abandoned.into())
                }
            }
        }
    }

    fn log_outcome(&self, reply: &ReplyRequest, outcome: &ReplyOutcome) {
        match outcome {
            ReplyOutcome::Posted { thread_no, post_no } => {
                info!("{} ✓ 发帖成功: 主题帖 {} 回复 {}", reply, thread_no, post_no)
            }
            ReplyOutcome::NeedsAuthentication { raw_detail } => warn!(
                "{} ⚠️ 仍需验证码: {}",
                reply,
                truncate_text(raw_detail, 200)
            ),
            ReplyOutcome::Error { message } => warn!("{} ⚠️ 发帖失败: {}", reply, message),
        }
    }
}
