use crate::message::context_window;
use crate::status::{PollState, ProcessState};
use crate::{AppState, Effect, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::HistoryChanged(history) => {
            state.set_history(history);
            Vec::new()
        }
        Msg::QuestionSubmitted(raw) => {
            let question = raw.trim().to_string();
            // Submit is disabled while a question is in flight.
            if question.is_empty() || state.answer_poll().is_pending() {
                return (state, Vec::new());
            }
            // Context is the history as it stood before this question.
            let context = context_window(state.history());
            state.set_answer_poll(PollState::Pending);
            state.set_last_error(None);
            vec![
                Effect::AppendUserMessage {
                    content: question.clone(),
                },
                Effect::SubmitQuestion { question, context },
            ]
        }
        Msg::ClearRequested => {
            if state.answer_poll().is_pending() {
                return (state, Vec::new());
            }
            vec![Effect::ClearHistory]
        }
        Msg::AskAccepted { task_id } => {
            state.set_answer_poll(PollState::Pending);
            state.set_active_task(Some(task_id.clone()));
            vec![Effect::WatchAnswer { task_id }]
        }
        Msg::AskFailed { reason, auth } => {
            state.set_active_task(None);
            state.set_answer_poll(PollState::Failed(reason));
            end_session_if_auth(auth)
        }
        Msg::AnswerReady { task_id, answer } => {
            // A completion for a stale task id, or a duplicate for one that
            // already finished, is dropped: the answer merges at most once.
            if state.active_task() != Some(&task_id) || !state.answer_poll().is_pending() {
                return (state, Vec::new());
            }
            state.set_active_task(None);
            state.set_answer_poll(PollState::Succeeded(answer.clone()));
            vec![Effect::AppendAssistantMessage {
                content: answer.answer,
                sources: answer.sources,
            }]
        }
        Msg::AnswerFailed {
            task_id,
            reason,
            auth,
        } => {
            if state.active_task() != Some(&task_id) {
                return (state, Vec::new());
            }
            state.set_active_task(None);
            state.set_answer_poll(PollState::Failed(reason));
            end_session_if_auth(auth)
        }
        Msg::AskCancelled => {
            if !state.answer_poll().is_pending() {
                return (state, Vec::new());
            }
            state.set_active_task(None);
            state.set_answer_poll(PollState::Cancelled);
            vec![Effect::CancelAnswerWatch]
        }
        Msg::ProcessStartRequested => {
            if state.process().status == ProcessState::Running {
                return (state, Vec::new());
            }
            vec![Effect::StartProcessing]
        }
        Msg::ProcessAccepted => vec![Effect::WatchProcess],
        Msg::ProcessStartFailed { reason, auth } => {
            state.set_last_error(Some(reason));
            end_session_if_auth(auth)
        }
        Msg::ProcessStatusObserved(snapshot) => {
            let crossed = state.observe_process_status(snapshot.status);
            state.set_process(snapshot);
            if crossed {
                // A run just finished: drop stale filters and refresh the
                // corpus views exactly once for this edge.
                state.reset_filters();
                let filters = state.filters().clone();
                vec![
                    Effect::RefetchDocuments {
                        query: filters.query,
                        page: filters.page,
                    },
                    Effect::RefetchTopics,
                ]
            } else {
                Vec::new()
            }
        }
        Msg::ProcessWatchFailed { reason, auth } => {
            state.set_last_error(Some(reason));
            end_session_if_auth(auth)
        }
        Msg::DocumentsFetched {
            shown,
            total,
            not_processed,
        } => {
            state.set_documents(shown, total, not_processed);
            Vec::new()
        }
        Msg::DocumentsFetchFailed { reason, auth } => {
            state.set_last_error(Some(reason));
            end_session_if_auth(auth)
        }
        Msg::DocumentDetailRequested(document_id) => {
            let document_id = document_id.trim().to_string();
            if document_id.is_empty() {
                return (state, Vec::new());
            }
            vec![Effect::FetchDocumentDetail { document_id }]
        }
        Msg::DocumentDetailFetched(insight) => {
            state.set_document_detail(Some(insight));
            Vec::new()
        }
        Msg::DocumentDetailFailed { reason, auth } => {
            state.set_document_detail(None);
            state.set_last_error(Some(reason));
            end_session_if_auth(auth)
        }
        Msg::SearchChanged(query) => {
            {
                let filters = state.filters_mut();
                filters.query = query;
                filters.page = 1;
            }
            let filters = state.filters().clone();
            vec![Effect::RefetchDocuments {
                query: filters.query,
                page: filters.page,
            }]
        }
        Msg::PageChanged(page) => {
            state.filters_mut().page = page.max(1);
            let filters = state.filters().clone();
            vec![Effect::RefetchDocuments {
                query: filters.query,
                page: filters.page,
            }]
        }
        Msg::UploadRequested { filename, bytes } => {
            if filename.trim().is_empty() || bytes.is_empty() {
                return (state, Vec::new());
            }
            vec![Effect::UploadDocument { filename, bytes }]
        }
        Msg::UploadSucceeded => {
            let filters = state.filters().clone();
            vec![Effect::RefetchDocuments {
                query: filters.query,
                page: filters.page,
            }]
        }
        Msg::UploadFailed { reason, auth } => {
            state.set_last_error(Some(reason));
            end_session_if_auth(auth)
        }
        Msg::RegisterSubmitted { username, password } => {
            if username.trim().is_empty() || password.is_empty() {
                state.set_last_error(Some("username and password are required".to_string()));
                return (state, Vec::new());
            }
            vec![Effect::Register { username, password }]
        }
        Msg::RegisterSucceeded => {
            state.set_last_error(None);
            Vec::new()
        }
        Msg::RegisterFailed { reason } => {
            state.set_last_error(Some(reason));
            Vec::new()
        }
        Msg::LoginSubmitted { username, password } => {
            if username.trim().is_empty() || password.is_empty() {
                state.set_last_error(Some("username and password are required".to_string()));
                return (state, Vec::new());
            }
            vec![Effect::Login { username, password }]
        }
        Msg::LoginSucceeded { token } => {
            state.set_session_active(true);
            state.set_last_error(None);
            let filters = state.filters().clone();
            vec![
                Effect::StoreSession { token },
                Effect::RefetchDocuments {
                    query: filters.query,
                    page: filters.page,
                },
                Effect::WatchProcess,
            ]
        }
        Msg::LoginFailed { reason } => {
            state.set_last_error(Some(reason));
            Vec::new()
        }
        Msg::LogoutRequested => vec![Effect::EndSession],
        Msg::SessionEnded => {
            state.set_session_active(false);
            if state.answer_poll().is_pending() {
                state.set_active_task(None);
                state.set_answer_poll(PollState::Cancelled);
                vec![Effect::CancelAnswerWatch]
            } else {
                Vec::new()
            }
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn end_session_if_auth(auth: bool) -> Vec<Effect> {
    if auth {
        vec![Effect::EndSession]
    } else {
        Vec::new()
    }
}
