//! 站点发帖客户端
//!
//! 把 ReplyRequest 组装成 multipart 表单提交到站点，返回响应体与最终地址
use reqwest::Url;
use tracing::debug;

use crate::clients::{RawResponse, ReplyTransport};
use crate::config::Config;
use crate::error::Result;
use crate::models::ReplyRequest;
use crate::services::post_form::{build_multipart, CaptchaParam};
use crate::utils::logging::truncate_text;

pub struct ChanClient {
    http: reqwest::Client,
    post_url: Url,
}

impl ChanClient {
    /// 创建新的发帖客户端
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            http,
            post_url: config.post_url()?,
        })
    }

    pub fn post_url(&self) -> &Url {
        &self.post_url
    }
}

impl ReplyTransport for ChanClient {
    async fn submit(
        &self,
        reply: &ReplyRequest,
        captcha: Option<&CaptchaParam>,
    ) -> Result<RawResponse> {
        debug!(
            "{} 提交到 {} (验证码: {})",
            reply,
            self.post_url,
            captcha.is_some()
        );

        let response = self
            .http
            .post(self.post_url.clone())
            .multipart(build_multipart(reply, captcha))
            .send()
            .await?;

        let status = response.status();
        let final_url = response.url().clone();
        let body = response.text().await?;

        debug!(
            "{} 响应 {} 最终地址 {} 内容: {}",
            reply,
            status,
            final_url,
            truncate_text(&body, 200)
        );

        Ok(RawResponse { body, final_url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReplyFile;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// 接收一次请求，返回完整的请求报文
    async fn capture_one_request(listener: TcpListener) -> String {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|l| {
                        let (k, v) = l.split_once(':')?;
                        k.eq_ignore_ascii_case("content-length")
                            .then(|| v.trim().parse::<usize>().ok())
                            .flatten()
                    });
                let complete = match content_length {
                    Some(len) => buf.len() >= header_end + 4 + len,
                    // 分块传输以 0 长度块结束
                    None => text.ends_with("\r\n0\r\n\r\n"),
                };
                if complete {
                    break;
                }
            }
        }

        socket
            .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok")
            .await
            .unwrap();
        String::from_utf8_lossy(&buf).into_owned()
    }

    #[tokio::test]
    async fn test_submit_sends_captcha_and_file() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(capture_one_request(listener));

        let config = Config {
            site_base_url: format!("http://{}/", addr),
            ..Config::default()
        };
        let client = ChanClient::new(&config).unwrap();
        let reply = ReplyRequest {
            file: Some(ReplyFile {
                name: "cat.png".to_string(),
                bytes: b"PNGDATA".to_vec(),
            }),
            ..ReplyRequest::reply_to("b", 42, "hello")
        };
        let captcha = CaptchaParam::new("g-recaptcha-response", "tok");

        let raw = client.submit(&reply, Some(&captcha)).await.unwrap();
        let request = server.await.unwrap();

        assert_eq!(raw.body, "ok");
        assert_eq!(raw.final_url.path(), "/post.pl");
        assert!(request.starts_with("POST /post.pl"), "{}", request);
        assert!(request.contains("name=\"g-recaptcha-response\"\r\n\r\ntok\r\n"));
        assert!(request.contains("name=\"thread\"\r\n\r\n42\r\n"));
        assert!(request.contains("filename=\"cat.png\""));
        assert!(request.contains("PNGDATA"));
    }

    #[test]
    fn test_post_url_from_config() {
        let config = Config {
            site_base_url: "https://boards.example.org/".to_string(),
            post_path: "board.php".to_string(),
            ..Config::default()
        };
        let client = ChanClient::new(&config).unwrap();
        assert_eq!(
            client.post_url().as_str(),
            "https://boards.example.org/board.php"
        );
    }

    #[tokio::test]
    #[ignore] // 需要真实站点：SITE_BASE_URL=... cargo test -- --ignored
    async fn test_submit_to_live_site() {
        let _ = tracing_subscriber::fmt::try_init();

        let client = ChanClient::new(&Config::from_env()).unwrap();
        let reply = ReplyRequest::reply_to("test", 1, "ping");
        let raw = client.submit(&reply, None).await.expect("提交失败");
        assert!(!raw.body.is_empty());
    }
}
