pub mod chan_client;

use std::future::Future;

use reqwest::Url;

use crate::error::Result;
use crate::models::ReplyRequest;
use crate::services::post_form::CaptchaParam;

pub use chan_client::ChanClient;

/// 发帖接口的原始响应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub body: String,
    /// 跟随重定向之后的最终地址
    pub final_url: Url,
}

/// 发帖传输层
pub trait ReplyTransport: Send + Sync {
    fn submit(
        &self,
        reply: &ReplyRequest,
        captcha: Option<&CaptchaParam>,
    ) -> impl Future<Output = Result<RawResponse>> + Send;
}
