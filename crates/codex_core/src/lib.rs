//! Codex core: pure state machine for the document-management client.
mod effect;
mod message;
mod msg;
mod reconciler;
mod state;
mod status;
mod update;
mod view_model;

pub use effect::Effect;
pub use message::{context_window, sort_by_position, ChatMessage, Role, CONTEXT_WINDOW, WELCOME_TEXT};
pub use msg::Msg;
pub use reconciler::EdgeDetector;
pub use state::{AppState, Filters};
pub use status::{
    Answer, DocumentInsight, PollState, ProcessSnapshot, ProcessState, TaskId, TopicShare,
};
pub use update::update;
pub use view_model::{AppViewModel, DocumentsView, MessageView};
