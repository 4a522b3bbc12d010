/// 站点发帖时要求的验证方式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteAuthentication {
    /// 不需要验证码
    None,
    /// reCAPTCHA v2 无 JS 回退页面
    Recaptcha {
        site_key: String,
        /// 站点根地址，用作 Referer 与同源判断
        base_url: String,
    },
}

impl SiteAuthentication {
    pub fn requires_captcha(&self) -> bool {
        !matches!(self, SiteAuthentication::None)
    }
}
