use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use client_logging::{client_info, client_warn};
use codex_core::{DocumentInsight, Effect, Msg, TopicShare};
use codex_engine::{ClientEngine, EngineEvent, HistoryStore, SessionToken};

use super::persistence;

/// Bridges the pure core to the engine: executes `Effect`s and turns engine
/// events back into `Msg`s.
pub(crate) struct EffectRunner {
    engine: ClientEngine,
    history: HistoryStore,
    token: SessionToken,
    state_dir: PathBuf,
    items_per_page: u32,
    msg_tx: mpsc::Sender<Msg>,
}

impl EffectRunner {
    pub fn new(
        engine: ClientEngine,
        history: HistoryStore,
        token: SessionToken,
        state_dir: PathBuf,
        items_per_page: u32,
        msg_tx: mpsc::Sender<Msg>,
    ) -> Self {
        let runner = Self {
            engine,
            history,
            token,
            state_dir,
            items_per_page,
            msg_tx,
        };
        runner.spawn_event_loop();
        runner
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::AppendUserMessage { content } => {
                    let list = self.history.append_user(content);
                    let _ = self.msg_tx.send(Msg::HistoryChanged(list));
                }
                Effect::AppendAssistantMessage { content, sources } => {
                    let list = self.history.append_assistant(content, sources);
                    let _ = self.msg_tx.send(Msg::HistoryChanged(list));
                }
                Effect::ClearHistory => {
                    let list = self.history.clear();
                    let _ = self.msg_tx.send(Msg::HistoryChanged(list));
                }
                Effect::SubmitQuestion { question, context } => {
                    client_info!("Submitting question ({} context pairs)", context.len());
                    self.engine.submit_question(question, context);
                }
                Effect::WatchAnswer { task_id } => self.engine.watch_answer(task_id),
                Effect::CancelAnswerWatch => self.engine.cancel_answer_watch(),
                Effect::UploadDocument { filename, bytes } => {
                    self.engine.upload_document(filename, bytes);
                }
                Effect::StartProcessing => self.engine.start_processing(),
                Effect::WatchProcess => self.engine.watch_process(),
                Effect::RefetchDocuments { query, page } => {
                    self.engine.fetch_documents(query, page, self.items_per_page);
                }
                Effect::FetchDocumentDetail { document_id } => {
                    self.engine.fetch_document_detail(document_id);
                }
                Effect::RefetchTopics => self.engine.fetch_topics(),
                Effect::Register { username, password } => {
                    self.engine.register(username, password);
                }
                Effect::Login { username, password } => self.engine.login(username, password),
                Effect::StoreSession { token } => {
                    self.token.set(token.clone());
                    persistence::save_session(&self.state_dir, &token);
                }
                Effect::EndSession => {
                    self.token.clear();
                    persistence::clear_session(&self.state_dir);
                    self.engine.stop_process_watch();
                    let _ = self.msg_tx.send(Msg::SessionEnded);
                }
            }
        }
    }

    fn spawn_event_loop(&self) {
        let engine = self.engine.clone();
        let msg_tx = self.msg_tx.clone();
        thread::spawn(move || loop {
            if let Some(event) = engine.try_recv() {
                if msg_tx.send(map_event(event)).is_err() {
                    return;
                }
            } else {
                thread::sleep(Duration::from_millis(20));
            }
        });
    }
}

fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::RegisterFinished { result } => match result {
            Ok(()) => Msg::RegisterSucceeded,
            Err(err) => Msg::RegisterFailed {
                reason: err.to_string(),
            },
        },
        EngineEvent::LoginFinished { result } => match result {
            Ok(token) => Msg::LoginSucceeded { token },
            Err(err) => Msg::LoginFailed {
                reason: err.to_string(),
            },
        },
        EngineEvent::AskFinished { result } => match result {
            Ok(task_id) => Msg::AskAccepted { task_id },
            Err(err) => Msg::AskFailed {
                reason: err.to_string(),
                auth: err.is_auth(),
            },
        },
        EngineEvent::AnswerReady { task_id, answer } => Msg::AnswerReady { task_id, answer },
        EngineEvent::AnswerFailed { task_id, error } => Msg::AnswerFailed {
            task_id,
            reason: error.to_string(),
            auth: error.is_auth(),
        },
        EngineEvent::ProcessStartFinished { result } => match result {
            Ok(()) => Msg::ProcessAccepted,
            Err(err) => Msg::ProcessStartFailed {
                reason: err.to_string(),
                auth: err.is_auth(),
            },
        },
        EngineEvent::ProcessStatusObserved(snapshot) => Msg::ProcessStatusObserved(snapshot),
        EngineEvent::ProcessWatchFailed { error } => Msg::ProcessWatchFailed {
            reason: error.to_string(),
            auth: error.is_auth(),
        },
        EngineEvent::ProcessWatchEnded { status } => {
            client_info!("Process watch ended with status {}", status);
            Msg::NoOp
        }
        EngineEvent::DocumentsFetched { result } => match result {
            Ok(page) => Msg::DocumentsFetched {
                shown: page.items.len(),
                total: page.total,
                not_processed: page.n_not_processed,
            },
            Err(err) => Msg::DocumentsFetchFailed {
                reason: err.to_string(),
                auth: err.is_auth(),
            },
        },
        EngineEvent::DocumentDetailFetched { result } => match result {
            Ok(detail) => Msg::DocumentDetailFetched(DocumentInsight {
                filename: detail.filename,
                upload_date: detail.upload_date,
                processed: detail.processed,
                topics: detail
                    .topics
                    .into_iter()
                    .map(|topic| TopicShare {
                        name: topic.name,
                        description: topic.description,
                        weight: topic.weight,
                    })
                    .collect(),
            }),
            Err(err) => Msg::DocumentDetailFailed {
                reason: err.to_string(),
                auth: err.is_auth(),
            },
        },
        EngineEvent::TopicsFetched { result } => {
            match result {
                Ok(topics) => client_info!("Fetched {} topics", topics.len()),
                Err(err) => client_warn!("Topic fetch failed: {}", err),
            }
            Msg::NoOp
        }
        EngineEvent::UploadFinished { result } => match result {
            Ok(()) => Msg::UploadSucceeded,
            Err(err) => Msg::UploadFailed {
                reason: err.to_string(),
                auth: err.is_auth(),
            },
        },
    }
}
