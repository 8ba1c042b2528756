use crate::message::Role;
use crate::state::Filters;
use crate::status::{DocumentInsight, ProcessState};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocumentsView {
    pub shown: usize,
    pub total: u64,
    pub not_processed: u64,
}

/// One rendered chat bubble. Already in position order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    pub role: Role,
    pub content: String,
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppViewModel {
    pub session_active: bool,
    pub messages: Vec<MessageView>,
    /// True while an answer poll is armed; the UI shows a typing indicator
    /// and disables submit/clear.
    pub answer_pending: bool,
    /// Inline error affordance shown in place of the pending answer.
    pub answer_error: Option<String>,
    pub process_status: ProcessState,
    pub last_run_time: Option<String>,
    pub documents: DocumentsView,
    /// Set while a single document's topic distribution is being inspected.
    pub document_detail: Option<DocumentInsight>,
    pub filters: Filters,
    pub last_error: Option<String>,
}
