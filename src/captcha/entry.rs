//! 验证码入口
//!
//! 单生产者（浏览器页面中的验证码）、单消费者（等待验证的发帖流程）。
//! 完成信号是一次性的，取消即调用方不再等待。

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::error::{CaptchaError, Result};
use crate::services::captcha_holder::{CaptchaHolder, Clock, SystemClock};

/// 入口处理一次 token 回调后的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenEvent {
    /// token 已写入仓库
    Stored,
    /// 收到空 token，验证码需要重新加载
    ResetRequested,
}

pub struct CaptchaEntry<C: Clock = SystemClock> {
    holder: Arc<CaptchaHolder<C>>,
    ttl: Duration,
    completion: Mutex<Option<oneshot::Sender<()>>>,
}

impl<C: Clock> CaptchaEntry<C> {
    /// 创建入口以及对应的等待端
    pub fn new(holder: Arc<CaptchaHolder<C>>, ttl: Duration) -> (Self, CaptchaWaiter) {
        let (tx, rx) = oneshot::channel();
        let entry = Self {
            holder,
            ttl,
            completion: Mutex::new(Some(tx)),
        };
        (entry, CaptchaWaiter { rx })
    }

    /// 页面回调：收到验证码 token
    ///
    /// 空 token 不会写入仓库，返回 [`TokenEvent::ResetRequested`] 让页面重新出题。
    pub fn on_token_received(&self, raw: &str) -> TokenEvent {
        if let Err(e) = validate_token(raw) {
            debug!("{}，重新加载验证码", e);
            return TokenEvent::ResetRequested;
        }

        self.holder.put(raw, self.ttl);

        let sender = self
            .completion
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(tx) = sender {
            info!("✓ 验证码已完成");
            // 等待方可能已经放弃，忽略发送失败
            let _ = tx.send(());
        }

        TokenEvent::Stored
    }

    /// 是否已经发出过完成信号
    pub fn is_completed(&self) -> bool {
        self.completion
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_none()
    }
}

fn validate_token(raw: &str) -> std::result::Result<(), CaptchaError> {
    if raw.is_empty() {
        return Err(CaptchaError::EmptyToken);
    }
    Ok(())
}

/// 等待验证码完成的一端
pub struct CaptchaWaiter {
    rx: oneshot::Receiver<()>,
}

impl CaptchaWaiter {
    /// 等待入口完成，超时或入口被丢弃时返回错误
    pub async fn wait(self, timeout: Duration) -> Result<()> {
        match tokio::time::timeout(timeout, self.rx).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(CaptchaError::Abandoned.into()),
            Err(_) => Err(CaptchaError::Timeout { waited: timeout }.into()),
        }
    }
}
