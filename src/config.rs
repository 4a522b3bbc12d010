use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;

use crate::error::{AppError, ConfigError, Result};
use crate::models::SiteAuthentication;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 13) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/120.0 Mobile Safari/537.36";

/// 环境变量未设置或无法解析时取默认值
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 站点根地址，同时用于拼接发帖地址和同源判断
    pub site_base_url: String,
    /// 发帖接口相对路径
    pub post_path: String,
    /// reCAPTCHA site key，为空表示站点不需要验证码
    pub site_key: Option<String>,
    /// 附加验证码 token 时使用的表单字段名
    pub captcha_field_name: String,
    /// 验证码 token 有效期（秒）
    pub captcha_ttl_secs: u64,
    /// 等待用户完成验证码的最长时间（秒）
    pub captcha_wait_timeout_secs: u64,
    /// 轮询验证码页面的间隔（毫秒）
    pub captcha_poll_interval_ms: u64,
    /// 单次发帖最多经历的验证码轮数
    pub max_auth_attempts: usize,
    /// 单个 HTTP 请求超时（秒）
    pub request_timeout_secs: u64,
    pub user_agent: String,
    /// 浏览器调试端口
    pub browser_debug_port: u16,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site_base_url: "http://localhost:8080/".to_string(),
            post_path: "post.pl".to_string(),
            site_key: None,
            captcha_field_name: "g-recaptcha-response".to_string(),
            captcha_ttl_secs: 120,
            captcha_wait_timeout_secs: 300,
            captcha_poll_interval_ms: 1000,
            max_auth_attempts: 2,
            request_timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            browser_debug_port: 2001,
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            site_base_url: env_or("SITE_BASE_URL", default.site_base_url),
            post_path: env_or("POST_PATH", default.post_path),
            site_key: std::env::var("SITE_KEY")
                .ok()
                .filter(|v| !v.is_empty())
                .or(default.site_key),
            captcha_field_name: env_or("CAPTCHA_FIELD_NAME", default.captcha_field_name),
            captcha_ttl_secs: env_or("CAPTCHA_TTL_SECS", default.captcha_ttl_secs),
            captcha_wait_timeout_secs: env_or(
                "CAPTCHA_WAIT_TIMEOUT_SECS",
                default.captcha_wait_timeout_secs,
            ),
            captcha_poll_interval_ms: env_or(
                "CAPTCHA_POLL_INTERVAL_MS",
                default.captcha_poll_interval_ms,
            ),
            max_auth_attempts: env_or("MAX_AUTH_ATTEMPTS", default.max_auth_attempts),
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", default.request_timeout_secs),
            user_agent: env_or("USER_AGENT", default.user_agent),
            browser_debug_port: env_or("BROWSER_DEBUG_PORT", default.browser_debug_port),
            verbose_logging: env_or("VERBOSE_LOGGING", default.verbose_logging),
        }
    }

    /// 设置了 `CONFIG_FILE` 时从该文件加载，否则读取环境变量
    pub fn load() -> Result<Self> {
        match std::env::var_os("CONFIG_FILE") {
            Some(path) => Self::from_toml_file(Path::new(&path)),
            None => Ok(Self::from_env()),
        }
    }

    /// 从 TOML 文件加载配置，缺省字段取默认值
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
        toml::from_str(&content)
            .map_err(|e| AppError::toml_parse_failed(path.display().to_string(), e))
    }

    /// 解析站点根地址
    pub fn base_url(&self) -> Result<Url> {
        Url::parse(&self.site_base_url).map_err(|e| {
            ConfigError::InvalidBaseUrl {
                value: self.site_base_url.clone(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// 发帖接口完整地址
    pub fn post_url(&self) -> Result<Url> {
        let base = self.base_url()?;
        base.join(&self.post_path).map_err(|e| {
            ConfigError::InvalidBaseUrl {
                value: format!("{}{}", self.site_base_url, self.post_path),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// 站点的发帖验证方式
    pub fn authentication(&self) -> SiteAuthentication {
        match &self.site_key {
            Some(site_key) => SiteAuthentication::Recaptcha {
                site_key: site_key.clone(),
                base_url: self.site_base_url.clone(),
            },
            None => SiteAuthentication::None,
        }
    }

    pub fn captcha_ttl(&self) -> Duration {
        Duration::from_secs(self.captcha_ttl_secs)
    }

    pub fn captcha_wait_timeout(&self) -> Duration {
        Duration::from_secs(self.captcha_wait_timeout_secs)
    }

    pub fn captcha_poll_interval(&self) -> Duration {
        Duration::from_millis(self.captcha_poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FileError;

    #[test]
    fn test_default_ttl_is_two_minutes() {
        let config = Config::default();
        assert_eq!(config.captcha_ttl(), Duration::from_secs(120));
        assert_eq!(config.authentication(), SiteAuthentication::None);
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            site_base_url = "https://example.org/"
            site_key = "abc"
            "#,
        )
        .unwrap();

        assert_eq!(config.post_path, "post.pl");
        assert_eq!(
            config.authentication(),
            SiteAuthentication::Recaptcha {
                site_key: "abc".to_string(),
                base_url: "https://example.org/".to_string(),
            }
        );
        assert_eq!(
            config.post_url().unwrap().as_str(),
            "https://example.org/post.pl"
        );
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        let config = Config {
            site_base_url: "not a url".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            config.base_url(),
            Err(AppError::Config(ConfigError::InvalidBaseUrl { .. }))
        ));
    }

    #[test]
    fn test_from_toml_file_loads_and_keeps_defaults() {
        let path =
            std::env::temp_dir().join(format!("chan_reply_config_{}.toml", std::process::id()));
        std::fs::write(
            &path,
            "site_base_url = \"https://boards.example.org/\"\ncaptcha_ttl_secs = 60\n",
        )
        .unwrap();

        let config = Config::from_toml_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.site_base_url, "https://boards.example.org/");
        assert_eq!(config.captcha_ttl(), Duration::from_secs(60));
        assert_eq!(config.captcha_field_name, "g-recaptcha-response");
    }

    #[test]
    fn test_from_toml_file_missing_is_file_error() {
        let path = std::env::temp_dir().join("chan_reply_config_does_not_exist.toml");
        let err = Config::from_toml_file(&path).unwrap_err();
        assert!(matches!(err, AppError::File(FileError::ReadFailed { .. })));
        assert!(err.to_string().contains("chan_reply_config_does_not_exist.toml"));
    }

    #[test]
    fn test_from_toml_file_bad_syntax_keeps_path() {
        let path =
            std::env::temp_dir().join(format!("chan_reply_bad_{}.toml", std::process::id()));
        std::fs::write(&path, "captcha_ttl_secs = \"two minutes\"\n").unwrap();

        let err = Config::from_toml_file(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();

        match err {
            AppError::File(FileError::TomlParseFailed { path: p, .. }) => {
                assert!(p.ends_with(".toml"))
            }
            other => panic!("意外的错误: {:?}", other),
        }
    }
}
