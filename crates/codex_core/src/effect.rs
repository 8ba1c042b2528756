use crate::message::Role;
use crate::status::TaskId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Durably append a user message; the store assigns its position.
    AppendUserMessage { content: String },
    /// Durably append an assistant message from a completed answer poll.
    AppendAssistantMessage {
        content: String,
        sources: Vec<String>,
    },
    /// Reset the stored conversation to the welcome singleton.
    ClearHistory,
    /// Send the question with its trailing conversation context.
    SubmitQuestion {
        question: String,
        context: Vec<(Role, String)>,
    },
    /// Arm the answer poller for this task, tearing down any previous watch.
    WatchAnswer { task_id: TaskId },
    /// Disarm the answer poller without delivering a completion.
    CancelAnswerWatch,
    /// Send a picked file to the backend.
    UploadDocument { filename: String, bytes: Vec<u8> },
    /// Trigger the backend document-processing job.
    StartProcessing,
    /// Arm the repeating processing-status watch.
    WatchProcess,
    /// Refetch the document list with the current filters.
    RefetchDocuments { query: String, page: u32 },
    /// Fetch one document's topic distribution.
    FetchDocumentDetail { document_id: String },
    /// Refetch the topic list.
    RefetchTopics,
    /// Create a new account; the user logs in afterwards.
    Register { username: String, password: String },
    /// Exchange credentials for a bearer token.
    Login { username: String, password: String },
    /// Persist a fresh session token.
    StoreSession { token: String },
    /// Clear the session and force navigation back to login.
    EndSession,
}
