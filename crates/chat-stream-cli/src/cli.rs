use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "chat-stream")]
#[command(version, about = "Stream a chat reply from an OpenAI-compatible endpoint")]
pub struct Cli {
    /// Base URL of the API, including the version prefix
    #[arg(long, env = "CHAT_STREAM_BASE_URL")]
    pub base_url: String,

    /// Model id (defaults to `local-model`)
    #[arg(long, env = "CHAT_STREAM_MODEL")]
    pub model: Option<String>,

    /// Bearer token sent with the request
    #[arg(long, env = "CHAT_STREAM_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Overall request timeout in seconds
    #[arg(long, env = "CHAT_STREAM_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// JSON file with earlier messages (`[{"sender": "user", "text": "..."}]`)
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// Ask the server to augment the reply with a web search
    #[arg(long)]
    pub web_search: bool,

    /// Caller id forwarded as `device_id` (random when omitted)
    #[arg(long)]
    pub caller_id: Option<String>,

    /// Wait for the whole reply instead of streaming it
    #[arg(long)]
    pub no_stream: bool,

    /// Message to send
    pub message: String,
}
