use std::fmt;

/// Opaque handle for a backend task. Never parsed or validated client-side.
pub type TaskId = String;

/// Live status of one polled background task.
///
/// Both poller instances (chatbot answer, document processing trigger) share
/// this one vocabulary; the payload type is whatever the successful poll
/// yields. `Succeeded`, `Failed` and `Cancelled` are terminal: polling stops
/// and no further transitions occur.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PollState<T> {
    #[default]
    Idle,
    Pending,
    Succeeded(T),
    Failed(String),
    Cancelled,
}

impl<T> PollState<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, PollState::Pending)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PollState::Succeeded(_) | PollState::Failed(_) | PollState::Cancelled
        )
    }
}

/// Backend document-processing job status as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessState {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl ProcessState {
    /// Parses the wire string. Unknown strings are a poll failure, not a
    /// silent fallback, so this returns `None` rather than a default.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "idle" => Some(ProcessState::Idle),
            "running" => Some(ProcessState::Running),
            "completed" => Some(ProcessState::Completed),
            "failed" => Some(ProcessState::Failed),
            "cancelled" => Some(ProcessState::Cancelled),
            _ => None,
        }
    }

    /// Once the job reports one of these, the status watch stops ticking.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ProcessState::Completed | ProcessState::Failed | ProcessState::Cancelled
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProcessState::Idle => "idle",
            ProcessState::Running => "running",
            ProcessState::Completed => "completed",
            ProcessState::Failed => "failed",
            ProcessState::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observation of the processing job. Only `status` is compared across
/// ticks; `last_run_time` is display-only RFC3339 text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessSnapshot {
    pub status: ProcessState,
    pub last_run_time: Option<String>,
}

/// Payload of a completed chatbot answer poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<String>,
}

/// One topic's share of a document, for the per-document inspection view.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicShare {
    pub name: String,
    pub description: Option<String>,
    /// Fraction of the document attributed to this topic, 0.0 to 1.0.
    pub weight: f64,
}

/// A single document with its topic distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentInsight {
    pub filename: String,
    pub upload_date: String,
    pub processed: bool,
    pub topics: Vec<TopicShare>,
}
