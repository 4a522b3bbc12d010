use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chan_reply::models::load_reply_from_toml;
use chan_reply::utils::logging;
use chan_reply::{
    connect_to_browser_and_page, CaptchaNojsChallenge, ChanClient, Config, JsExecutor, ReplyFlow,
    ReplyOutcome,
};
use tracing::error;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // 加载配置
    let config = Config::load()?;

    // 初始化日志
    logging::init(config.verbose_logging);
    logging::log_startup(&config);

    let draft_path: PathBuf = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .context("用法: chan-reply <reply.toml>")?;

    let reply = load_reply_from_toml(&draft_path).await?;
    let client = ChanClient::new(&config)?;
    let flow = ReplyFlow::new(client, &config);

    let outcome = if config.authentication().requires_captcha() {
        let (_browser, page) = connect_to_browser_and_page(config.browser_debug_port).await?;
        let executor = JsExecutor::new(page);
        executor.forward_console_to_log().await?;
        let challenge = CaptchaNojsChallenge::new(executor, &config)?;
        flow.with_authenticator(challenge).run(&reply).await
    } else {
        flow.run(&reply).await
    };

    match outcome {
        Ok(ReplyOutcome::Posted { thread_no, post_no }) => {
            println!("posted thread={} post={}", thread_no, post_no);
            Ok(ExitCode::SUCCESS)
        }
        Ok(ReplyOutcome::NeedsAuthentication { .. }) => {
            println!("captcha required");
            Ok(ExitCode::FAILURE)
        }
        Ok(ReplyOutcome::Error { message }) => {
            println!("error: {}", message);
            Ok(ExitCode::FAILURE)
        }
        Err(e) => {
            error!("发帖中断: {}", e);
            Err(e.into())
        }
    }
}
