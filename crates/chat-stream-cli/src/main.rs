//! `chat-stream`: send one message and stream the reply to stdout.

mod cli;
mod config;
mod observability;
mod render;

use anyhow::Context as _;
use chat_stream::{AbortHandle, ChatClient, ChatError, SessionOptions, generate_caller_id};
use clap::Parser as _;
use tracing::{debug, info};

use crate::cli::Cli;
use crate::render::SuffixPrinter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::init();
    observability::init_observability();
    let cli = Cli::parse();

    let history = config::load_history(cli.history.as_deref())?;
    let client = ChatClient::new(config::client_config(&cli)).context("invalid client config")?;
    let caller_id = cli.caller_id.clone().unwrap_or_else(generate_caller_id);
    let request = client
        .request()
        .conversation(&history, &cli.message)
        .web_search(cli.web_search)
        .caller_id(caller_id)
        .build()?;
    debug!(history = history.len(), stream = !cli.no_stream, "request ready");

    if cli.no_stream {
        let text = tokio::select! {
            text = client.complete(&request) => text?,
            _ = tokio::signal::ctrl_c() => anyhow::bail!("interrupted"),
        };
        SuffixPrinter::new(std::io::stdout().lock()).finish(&text)?;
        return Ok(());
    }

    let abort = AbortHandle::new();
    let on_interrupt = abort.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.abort();
        }
    });

    let mut printer = SuffixPrinter::new(std::io::stdout());
    let options = SessionOptions::default().abort_signal(abort.signal());
    let result = client
        .stream_with(&request, options, |text| printer.update(text))
        .await;
    match result {
        Ok(reply) => {
            info!(
                frames = reply.frames,
                dropped = reply.dropped_frames,
                termination = ?reply.termination,
                "reply complete"
            );
            printer.finish(&reply.text)?;
            Ok(())
        }
        Err(ChatError::Cancelled) => {
            printer.finish("")?;
            anyhow::bail!("interrupted")
        }
        Err(err) => Err(err.into()),
    }
}
