pub use crate::{
    AbortHandle, ChatClient, ChatError, ClientConfig, ConversationGate, HistoryEntry, Message,
    Role, SessionOptions, StreamReply, StreamRequest, generate_caller_id,
};
