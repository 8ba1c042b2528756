use crate::message::{sort_by_position, ChatMessage};
use crate::reconciler::EdgeDetector;
use crate::status::{Answer, DocumentInsight, PollState, ProcessSnapshot, ProcessState, TaskId};
use crate::view_model::{AppViewModel, DocumentsView, MessageView};

/// Active corpus filters. Reset when a processing run completes so the
/// refreshed list is shown unfiltered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filters {
    pub query: String,
    pub page: u32,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            query: String::new(),
            page: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    history: Vec<ChatMessage>,
    answer_poll: PollState<Answer>,
    active_task: Option<TaskId>,
    process: ProcessSnapshot,
    process_edge: EdgeDetector<ProcessState>,
    documents_shown: usize,
    documents_total: u64,
    documents_not_processed: u64,
    document_detail: Option<DocumentInsight>,
    filters: Filters,
    session_active: bool,
    last_error: Option<String>,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            history: Vec::new(),
            answer_poll: PollState::Idle,
            active_task: None,
            process: ProcessSnapshot::default(),
            process_edge: EdgeDetector::new(ProcessState::Running, ProcessState::Completed),
            documents_shown: 0,
            documents_total: 0,
            documents_not_processed: 0,
            document_detail: None,
            filters: Filters::default(),
            session_active: false,
            last_error: None,
            dirty: false,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        let mut ordered = self.history.clone();
        sort_by_position(&mut ordered);
        AppViewModel {
            session_active: self.session_active,
            messages: ordered
                .into_iter()
                .map(|message| MessageView {
                    role: message.role,
                    content: message.content,
                    sources: message.sources,
                })
                .collect(),
            answer_pending: self.answer_poll.is_pending(),
            answer_error: match &self.answer_poll {
                PollState::Failed(reason) => Some(reason.clone()),
                _ => None,
            },
            process_status: self.process.status,
            last_run_time: self.process.last_run_time.clone(),
            documents: DocumentsView {
                shown: self.documents_shown,
                total: self.documents_total,
                not_processed: self.documents_not_processed,
            },
            document_detail: self.document_detail.clone(),
            filters: self.filters.clone(),
            last_error: self.last_error.clone(),
        }
    }

    /// Returns whether anything changed since the last call, and resets the
    /// flag. The render loop skips redraws when this is false.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn answer_poll(&self) -> &PollState<Answer> {
        &self.answer_poll
    }

    pub fn active_task(&self) -> Option<&TaskId> {
        self.active_task.as_ref()
    }

    pub fn process(&self) -> &ProcessSnapshot {
        &self.process
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn document_detail(&self) -> Option<&DocumentInsight> {
        self.document_detail.as_ref()
    }

    pub fn session_active(&self) -> bool {
        self.session_active
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_history(&mut self, history: Vec<ChatMessage>) {
        self.history = history;
        self.mark_dirty();
    }

    pub(crate) fn set_answer_poll(&mut self, poll: PollState<Answer>) {
        self.answer_poll = poll;
        self.mark_dirty();
    }

    pub(crate) fn set_active_task(&mut self, task: Option<TaskId>) {
        self.active_task = task;
    }

    pub(crate) fn set_process(&mut self, snapshot: ProcessSnapshot) {
        self.process = snapshot;
        self.mark_dirty();
    }

    pub(crate) fn observe_process_status(&mut self, status: ProcessState) -> bool {
        self.process_edge.observe(status)
    }

    pub(crate) fn set_document_detail(&mut self, detail: Option<DocumentInsight>) {
        self.document_detail = detail;
        self.mark_dirty();
    }

    pub(crate) fn set_documents(&mut self, shown: usize, total: u64, not_processed: u64) {
        self.documents_shown = shown;
        self.documents_total = total;
        self.documents_not_processed = not_processed;
        self.mark_dirty();
    }

    pub(crate) fn filters_mut(&mut self) -> &mut Filters {
        self.mark_dirty();
        &mut self.filters
    }

    pub(crate) fn reset_filters(&mut self) {
        self.filters = Filters::default();
        self.mark_dirty();
    }

    pub(crate) fn set_session_active(&mut self, active: bool) {
        self.session_active = active;
        self.mark_dirty();
    }

    pub(crate) fn set_last_error(&mut self, error: Option<String>) {
        self.last_error = error;
        self.mark_dirty();
    }
}
