use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use client_logging::{client_debug, client_info, client_warn};
use tokio_util::sync::CancellationToken;

use codex_core::{Answer, ProcessSnapshot, ProcessState, Role, TaskId};

use crate::api::{Api, ApiError, ApiErrorKind, DocumentDetail, DocumentsPage, TopicRecord};
use crate::poll::{run_poll_loop, PollCheck};

enum EngineCommand {
    Register {
        username: String,
        password: String,
    },
    Login {
        username: String,
        password: String,
    },
    SubmitQuestion {
        question: String,
        context: Vec<(Role, String)>,
    },
    WatchAnswer {
        task_id: TaskId,
    },
    CancelAnswerWatch,
    StartProcessing,
    WatchProcess,
    StopProcessWatch,
    FetchDocuments {
        query: String,
        page: u32,
        limit: u32,
    },
    FetchDocumentDetail {
        document_id: String,
    },
    FetchTopics,
    UploadDocument {
        filename: String,
        bytes: Vec<u8>,
    },
}

#[derive(Debug, Clone)]
pub enum EngineEvent {
    RegisterFinished { result: Result<(), ApiError> },
    LoginFinished { result: Result<String, ApiError> },
    AskFinished { result: Result<TaskId, ApiError> },
    /// The answer poll for `task_id` reached its success state. Emitted at
    /// most once per watch.
    AnswerReady { task_id: TaskId, answer: Answer },
    AnswerFailed { task_id: TaskId, error: ApiError },
    ProcessStartFinished { result: Result<(), ApiError> },
    /// One observation of the long-lived processing watch.
    ProcessStatusObserved(ProcessSnapshot),
    ProcessWatchFailed { error: ApiError },
    /// The processing watch saw a terminal status and stopped ticking.
    ProcessWatchEnded { status: ProcessState },
    DocumentsFetched { result: Result<DocumentsPage, ApiError> },
    DocumentDetailFetched { result: Result<DocumentDetail, ApiError> },
    TopicsFetched { result: Result<Vec<TopicRecord>, ApiError> },
    UploadFinished { result: Result<(), ApiError> },
}

/// One cancellation slot per logical poller. Arming replaces and cancels the
/// previous token, so two watches for the same concern never overlap.
#[derive(Default)]
struct WatchSlots {
    answer: Option<CancellationToken>,
    process: Option<CancellationToken>,
}

impl WatchSlots {
    fn arm(slot: &mut Option<CancellationToken>) -> CancellationToken {
        let token = CancellationToken::new();
        if let Some(previous) = slot.replace(token.clone()) {
            previous.cancel();
        }
        token
    }

    fn disarm(slot: &mut Option<CancellationToken>) {
        if let Some(previous) = slot.take() {
            previous.cancel();
        }
    }
}

#[derive(Clone)]
pub struct ClientEngine {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: Arc<Mutex<mpsc::Receiver<EngineEvent>>>,
}

impl ClientEngine {
    pub fn new(api: Arc<dyn Api>, poll_interval: Duration) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let slots = Arc::new(Mutex::new(WatchSlots::default()));

        thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    client_warn!("Engine runtime failed to start: {}", err);
                    return;
                }
            };
            while let Ok(command) = cmd_rx.recv() {
                let api = api.clone();
                let event_tx = event_tx.clone();
                let slots = slots.clone();
                match command {
                    EngineCommand::WatchAnswer { task_id } => {
                        let token = WatchSlots::arm(&mut slots.lock().expect("slots lock").answer);
                        runtime.spawn(watch_answer(api, poll_interval, token, task_id, event_tx));
                    }
                    EngineCommand::CancelAnswerWatch => {
                        WatchSlots::disarm(&mut slots.lock().expect("slots lock").answer);
                    }
                    EngineCommand::WatchProcess => {
                        let token = WatchSlots::arm(&mut slots.lock().expect("slots lock").process);
                        runtime.spawn(watch_process(api, poll_interval, token, event_tx));
                    }
                    EngineCommand::StopProcessWatch => {
                        WatchSlots::disarm(&mut slots.lock().expect("slots lock").process);
                    }
                    command => {
                        runtime.spawn(handle_command(api, command, event_tx));
                    }
                }
            }
        });

        Self {
            cmd_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
        }
    }

    pub fn register(&self, username: impl Into<String>, password: impl Into<String>) {
        self.send(EngineCommand::Register {
            username: username.into(),
            password: password.into(),
        });
    }

    pub fn login(&self, username: impl Into<String>, password: impl Into<String>) {
        self.send(EngineCommand::Login {
            username: username.into(),
            password: password.into(),
        });
    }

    pub fn submit_question(&self, question: impl Into<String>, context: Vec<(Role, String)>) {
        self.send(EngineCommand::SubmitQuestion {
            question: question.into(),
            context,
        });
    }

    pub fn watch_answer(&self, task_id: TaskId) {
        self.send(EngineCommand::WatchAnswer { task_id });
    }

    pub fn cancel_answer_watch(&self) {
        self.send(EngineCommand::CancelAnswerWatch);
    }

    pub fn start_processing(&self) {
        self.send(EngineCommand::StartProcessing);
    }

    pub fn watch_process(&self) {
        self.send(EngineCommand::WatchProcess);
    }

    pub fn stop_process_watch(&self) {
        self.send(EngineCommand::StopProcessWatch);
    }

    pub fn fetch_documents(&self, query: impl Into<String>, page: u32, limit: u32) {
        self.send(EngineCommand::FetchDocuments {
            query: query.into(),
            page,
            limit,
        });
    }

    pub fn fetch_document_detail(&self, document_id: impl Into<String>) {
        self.send(EngineCommand::FetchDocumentDetail {
            document_id: document_id.into(),
        });
    }

    pub fn fetch_topics(&self) {
        self.send(EngineCommand::FetchTopics);
    }

    pub fn upload_document(&self, filename: impl Into<String>, bytes: Vec<u8>) {
        self.send(EngineCommand::UploadDocument {
            filename: filename.into(),
            bytes,
        });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.lock().expect("event lock").try_recv().ok()
    }

    fn send(&self, command: EngineCommand) {
        let _ = self.cmd_tx.send(command);
    }
}

async fn handle_command(
    api: Arc<dyn Api>,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let event = match command {
        EngineCommand::Register { username, password } => EngineEvent::RegisterFinished {
            result: api.register(&username, &password).await,
        },
        EngineCommand::Login { username, password } => EngineEvent::LoginFinished {
            result: api.login(&username, &password).await,
        },
        EngineCommand::SubmitQuestion { question, context } => EngineEvent::AskFinished {
            result: api.ask(&question, &context).await,
        },
        EngineCommand::StartProcessing => EngineEvent::ProcessStartFinished {
            result: api.start_processing().await,
        },
        EngineCommand::FetchDocuments { query, page, limit } => EngineEvent::DocumentsFetched {
            result: api.documents(&query, page, limit).await,
        },
        EngineCommand::FetchDocumentDetail { document_id } => EngineEvent::DocumentDetailFetched {
            result: api.document_detail(&document_id).await,
        },
        EngineCommand::FetchTopics => EngineEvent::TopicsFetched {
            result: api.topics().await,
        },
        EngineCommand::UploadDocument { filename, bytes } => EngineEvent::UploadFinished {
            result: api.upload_document(&filename, bytes).await,
        },
        // Watch commands are handled on the dispatch thread.
        EngineCommand::WatchAnswer { .. }
        | EngineCommand::CancelAnswerWatch
        | EngineCommand::WatchProcess
        | EngineCommand::StopProcessWatch => return,
    };
    let _ = event_tx.send(event);
}

/// Polls `/chatbot/answer/{task_id}` until done, failed or cancelled.
async fn watch_answer(
    api: Arc<dyn Api>,
    period: Duration,
    cancel: CancellationToken,
    task_id: TaskId,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    client_info!("Answer watch armed for task {}", task_id);
    let outcome = run_poll_loop(period, cancel, |tick| {
        let api = api.clone();
        let task_id = task_id.clone();
        async move {
            client_debug!("Answer poll tick {} for task {}", tick, task_id);
            match api.answer(&task_id).await {
                Ok(response) => match response.status.as_str() {
                    "done" => match response.answer {
                        Some(answer) => PollCheck::Done(Answer {
                            answer,
                            sources: response.sources.unwrap_or_default(),
                        }),
                        None => PollCheck::Failed(ApiError {
                            kind: ApiErrorKind::InvalidResponse,
                            message: "done response without an answer".to_string(),
                        }),
                    },
                    "pending" => PollCheck::InProgress,
                    other => PollCheck::Failed(ApiError {
                        kind: ApiErrorKind::InvalidResponse,
                        message: format!("unexpected answer status {other:?}"),
                    }),
                },
                Err(err) => PollCheck::Failed(err),
            }
        }
    })
    .await;

    match outcome {
        Some(Ok(answer)) => {
            let _ = event_tx.send(EngineEvent::AnswerReady { task_id, answer });
        }
        Some(Err(error)) => {
            client_warn!("Answer watch for task {} failed: {}", task_id, error);
            let _ = event_tx.send(EngineEvent::AnswerFailed { task_id, error });
        }
        // Cancelled: the completion callback must not fire.
        None => client_info!("Answer watch for task {} cancelled", task_id),
    }
}

/// Polls the processing status endpoint, emitting every observation, until a
/// terminal status is seen or the watch is torn down.
async fn watch_process(
    api: Arc<dyn Api>,
    period: Duration,
    cancel: CancellationToken,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let observer_tx = event_tx.clone();
    let outcome = run_poll_loop(period, cancel, move |tick| {
        let api = api.clone();
        let observer_tx = observer_tx.clone();
        async move {
            client_debug!("Process status poll tick {}", tick);
            match api.process_status().await {
                Ok(snapshot) => {
                    let status = snapshot.status;
                    let _ = observer_tx.send(EngineEvent::ProcessStatusObserved(snapshot));
                    if status.is_terminal() {
                        PollCheck::Done(status)
                    } else {
                        PollCheck::InProgress
                    }
                }
                Err(err) => PollCheck::Failed(err),
            }
        }
    })
    .await;

    match outcome {
        Some(Ok(status)) => {
            let _ = event_tx.send(EngineEvent::ProcessWatchEnded { status });
        }
        Some(Err(error)) => {
            client_warn!("Process watch failed: {}", error);
            let _ = event_tx.send(EngineEvent::ProcessWatchFailed { error });
        }
        None => client_info!("Process watch cancelled"),
    }
}
