//! # Chan Reply
//!
//! 图版（imageboard）发帖核心：提交回帖、判定响应、处理验证码后重试
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `browser/` - 连接用户可见的浏览器
//! - `clients/` - 发帖 HTTP 传输
//!
//! ### ② 业务能力层（Services）
//! - `reply_classifier` - 响应分类（成功 / 需要验证码 / 错误），纯函数
//! - `captcha_holder` - 单槽位、带有效期的验证码 token 仓库
//! - `post_form` - 发帖表单组装
//!
//! ### ③ 验证码（Captcha）
//! - `CaptchaEntry` - token 到达入口，一次性完成信号
//! - `CaptchaNojsChallenge` - 浏览器中的 reCAPTCHA 回退页面
//!
//! ### ④ 流程层（Workflow）
//! - `ReplyFlow` - 提交 → 分类 → 验证 → 重试
//!
//! ## 模块结构

pub mod browser;
pub mod captcha;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::connect_to_browser_and_page;
pub use captcha::{Authenticator, CaptchaEntry, CaptchaNojsChallenge, NoAuthenticator};
pub use clients::{ChanClient, RawResponse, ReplyTransport};
pub use config::Config;
pub use error::{AppError, Result};
pub use infrastructure::JsExecutor;
pub use models::{ReplyOutcome, ReplyRequest, ResponseContext, SiteAuthentication};
pub use services::{classify, CaptchaHolder};
pub use workflow::ReplyFlow;
