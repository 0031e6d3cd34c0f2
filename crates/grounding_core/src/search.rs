//! Search results and chat transcript held by the core.

use crate::chunk::Grounding;

pub const DEFAULT_SEARCH_RESULTS: usize = 10;
/// Messages sent along with a question as conversation history.
pub const CHAT_HISTORY_WINDOW: usize = 6;
pub const CHAT_GREETING: &str =
    "Hi! I can answer questions about your uploaded documents. Ask me anything!";
pub const CHAT_FAILURE_REPLY: &str =
    "I'm sorry, I encountered an error processing your question. Please try again.";

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub doc_id: String,
    pub chunk_key: String,
    pub page: u32,
    pub chunk_type: String,
    pub text: String,
    /// Similarity in `[0, 1]`.
    pub score: f64,
    pub grounding: Option<Grounding>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchState {
    pub query: String,
    pub searching: bool,
    pub visible: bool,
    pub hits: Vec<SearchHit>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// A chunk cited by a chat answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSource {
    pub doc_id: String,
    pub chunk_key: String,
    pub filename: Option<String>,
    pub page: u32,
    pub chunk_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub sources: Vec<ChatSource>,
    pub is_error: bool,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            sources: Vec::new(),
            is_error: false,
        }
    }

    pub fn assistant(content: impl Into<String>, sources: Vec<ChatSource>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            sources,
            is_error: false,
        }
    }
}

/// One history entry sent to the chat endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

/// Answer returned by the chat endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatAnswer {
    pub answer: String,
    pub sources: Vec<ChatSource>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatState {
    pub messages: Vec<ChatMessage>,
    pub waiting: bool,
}

impl Default for ChatState {
    fn default() -> Self {
        Self {
            messages: vec![ChatMessage::assistant(CHAT_GREETING, Vec::new())],
            waiting: false,
        }
    }
}

impl ChatState {
    /// The last [`CHAT_HISTORY_WINDOW`] messages, oldest first.
    pub fn history(&self) -> Vec<ChatTurn> {
        let start = self.messages.len().saturating_sub(CHAT_HISTORY_WINDOW);
        self.messages[start..]
            .iter()
            .map(|message| ChatTurn {
                role: message.role,
                content: message.content.clone(),
            })
            .collect()
    }
}
