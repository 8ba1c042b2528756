use crate::status::{Answer, DocumentInsight, ProcessSnapshot, TaskId};
use crate::ChatMessage;

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Conversation history (re)loaded from the store; adopt as the view.
    HistoryChanged(Vec<ChatMessage>),
    /// User submitted a question from the input box.
    QuestionSubmitted(String),
    /// User asked to reset the conversation to the welcome message.
    ClearRequested,
    /// Backend accepted the question and returned a task handle.
    AskAccepted { task_id: TaskId },
    /// The ask request itself failed before any task was created.
    AskFailed { reason: String, auth: bool },
    /// Answer poll reached its success state.
    AnswerReady { task_id: TaskId, answer: Answer },
    /// Answer poll reached its error state.
    AnswerFailed {
        task_id: TaskId,
        reason: String,
        auth: bool,
    },
    /// User abandoned the in-flight question.
    AskCancelled,
    /// User clicked Start Process on the dashboard.
    ProcessStartRequested,
    /// Backend accepted the processing trigger.
    ProcessAccepted,
    /// The processing trigger failed.
    ProcessStartFailed { reason: String, auth: bool },
    /// One tick of the long-lived processing status watch.
    ProcessStatusObserved(ProcessSnapshot),
    /// The processing status watch itself failed and stopped.
    ProcessWatchFailed { reason: String, auth: bool },
    /// Document list fetch finished.
    DocumentsFetched {
        shown: usize,
        total: u64,
        not_processed: u64,
    },
    /// Document list fetch failed.
    DocumentsFetchFailed { reason: String, auth: bool },
    /// User asked to inspect one document's topic distribution.
    DocumentDetailRequested(String),
    /// Per-document detail fetch finished.
    DocumentDetailFetched(DocumentInsight),
    DocumentDetailFailed { reason: String, auth: bool },
    /// User edited the corpus search query.
    SearchChanged(String),
    /// User moved to another corpus page.
    PageChanged(u32),
    /// User picked a file to upload.
    UploadRequested { filename: String, bytes: Vec<u8> },
    /// Upload round-trip finished.
    UploadSucceeded,
    UploadFailed { reason: String, auth: bool },
    /// User submitted a new-account form.
    RegisterSubmitted { username: String, password: String },
    /// Registration round-trip finished; the user still has to log in.
    RegisterSucceeded,
    RegisterFailed { reason: String },
    /// User submitted login credentials.
    LoginSubmitted { username: String, password: String },
    /// Login round-trip finished.
    LoginSucceeded { token: String },
    LoginFailed { reason: String },
    /// User clicked Logout.
    LogoutRequested,
    /// Session was torn down (logout or expired token).
    SessionEnded,
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
