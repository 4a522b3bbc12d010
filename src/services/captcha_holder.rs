//! 验证码 token 仓库 - 业务能力层
//!
//! 单槽位、带有效期的 token 存储。写入方是验证码入口，读取方是发帖流程。
//! 所有操作都在同一把锁内完成，`consume` 的"检查 + 清除"不可分割。

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

/// 时间来源
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// 系统时钟
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 手动推进的时钟，用于测试有效期
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now = add_duration(*now, by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// 一个验证码 token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptchaToken {
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub ttl: Duration,
}

impl CaptchaToken {
    pub fn expires_at(&self) -> DateTime<Utc> {
        add_duration(self.created_at, self.ttl)
    }

    /// `now < created_at + ttl` 时有效
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at()
    }
}

fn add_duration(at: DateTime<Utc>, by: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(by)
        .ok()
        .and_then(|delta| at.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// 验证码 token 仓库
///
/// 最多持有一个 token，后写覆盖前写。过期的 token 在下一次读取时被清除。
pub struct CaptchaHolder<C: Clock = SystemClock> {
    slot: Mutex<Option<CaptchaToken>>,
    clock: C,
}

impl CaptchaHolder<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for CaptchaHolder<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> CaptchaHolder<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            slot: Mutex::new(None),
            clock,
        }
    }

    // 持锁期间不会 panic，中毒时直接取回内部数据
    fn lock(&self) -> MutexGuard<'_, Option<CaptchaToken>> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 写入新 token，无条件替换旧 token
    ///
    /// 空 token 由验证码入口拦截，不会到达这里。
    pub fn put(&self, token: impl Into<String>, ttl: Duration) {
        let token = CaptchaToken {
            token: token.into(),
            created_at: self.clock.now(),
            ttl,
        };
        debug!("写入验证码 token，过期时间 {}", token.expires_at());
        *self.lock() = Some(token);
    }

    /// 返回仍在有效期内的 token，不消费
    pub fn peek_valid(&self) -> Option<String> {
        let mut slot = self.lock();
        self.take_if_expired(&mut slot);
        slot.as_ref().map(|t| t.token.clone())
    }

    /// 取出并清除仍在有效期内的 token
    pub fn consume(&self) -> Option<String> {
        let mut slot = self.lock();
        self.take_if_expired(&mut slot);
        let token = slot.take()?;
        debug!("已消费验证码 token");
        Some(token.token)
    }

    /// 当前 token 的剩余有效时间
    pub fn remaining(&self) -> Option<Duration> {
        let now = self.clock.now();
        let mut slot = self.lock();
        self.take_if_expired(&mut slot);
        slot.as_ref()
            .and_then(|t| (t.expires_at() - now).to_std().ok())
    }

    fn take_if_expired(&self, slot: &mut Option<CaptchaToken>) {
        let now = self.clock.now();
        if slot.as_ref().is_some_and(|t| !t.is_valid_at(now)) {
            debug!("验证码 token 已过期，清除");
            *slot = None;
        }
    }
}
