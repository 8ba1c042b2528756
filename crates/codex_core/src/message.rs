/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Text of the synthetic assistant message a fresh conversation starts with.
pub const WELCOME_TEXT: &str = "Hi! I'm your AI assistant. How can I help you today?";

/// How many trailing messages are sent to the backend as conversation context.
pub const CONTEXT_WINDOW: usize = 5;

/// One entry in the conversation history.
///
/// `position` is the authoritative ordering key, not the index in whatever
/// vec the message currently sits in. It is assigned by the history store at
/// append time from the stored list length, so a view that lagged behind a
/// concurrent append still sorts correctly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: String,
    pub position: u64,
    pub role: Role,
    pub content: String,
    pub sources: Vec<String>,
}

impl ChatMessage {
    pub fn user(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            position: 0,
            role: Role::User,
            content: content.into(),
            sources: Vec::new(),
        }
    }

    pub fn assistant(
        id: impl Into<String>,
        content: impl Into<String>,
        sources: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            position: 0,
            role: Role::Assistant,
            content: content.into(),
            sources,
        }
    }

    /// The singleton message an empty or reset conversation contains.
    pub fn welcome(id: impl Into<String>) -> Self {
        Self::assistant(id, WELCOME_TEXT, Vec::new())
    }
}

/// Sort a conversation for rendering or context building.
pub fn sort_by_position(messages: &mut [ChatMessage]) {
    messages.sort_by_key(|message| message.position);
}

/// The trailing context sent along with a new question, as (role, content)
/// pairs. The caller passes the history as it stood before the question was
/// appended, matching what the backend expects.
pub fn context_window(messages: &[ChatMessage]) -> Vec<(Role, String)> {
    let mut ordered = messages.to_vec();
    sort_by_position(&mut ordered);
    let skip = ordered.len().saturating_sub(CONTEXT_WINDOW);
    ordered
        .into_iter()
        .skip(skip)
        .map(|message| (message.role, message.content))
        .collect()
}
