//! Codex engine: authenticated API client, poll loops and effect execution.
mod api;
mod engine;
mod history;
mod persist;
mod poll;

pub use api::{
    Api, ApiError, ApiErrorKind, ApiSettings, AnswerResponse, DocumentDetail, DocumentRecord,
    DocumentsPage, ReqwestApi, SessionToken, TopicRecord,
};
pub use engine::{ClientEngine, EngineEvent};
pub use history::{HistoryStore, HISTORY_FILENAME};
pub use persist::{ensure_state_dir, AtomicFileWriter, PersistError};
pub use poll::{run_poll_loop, PollCheck};
