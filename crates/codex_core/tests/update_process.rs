use codex_core::{update, AppState, Effect, Msg, ProcessSnapshot, ProcessState};

fn init_logging() {
    client_logging::initialize_for_tests();
}

fn observed(state: AppState, status: ProcessState) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::ProcessStatusObserved(ProcessSnapshot {
            status,
            last_run_time: Some("2026-08-24T10:00:00Z".to_string()),
        }),
    )
}

#[test]
fn start_request_is_blocked_while_running() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::ProcessStartRequested);
    assert_eq!(effects, vec![Effect::StartProcessing]);

    let (state, _) = observed(state, ProcessState::Running);
    let (_, effects) = update(state, Msg::ProcessStartRequested);
    assert!(effects.is_empty());
}

#[test]
fn accepted_trigger_arms_the_status_watch() {
    init_logging();
    let (_, effects) = update(AppState::new(), Msg::ProcessAccepted);
    assert_eq!(effects, vec![Effect::WatchProcess]);
}

#[test]
fn running_to_completed_edge_fires_refetch_exactly_once() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::SearchChanged("report".to_string()));
    let (state, _) = update(state, Msg::PageChanged(3));

    let (state, effects) = observed(state, ProcessState::Running);
    assert!(effects.is_empty());
    let (state, effects) = observed(state, ProcessState::Running);
    assert!(effects.is_empty());

    let (state, effects) = observed(state, ProcessState::Completed);
    // Filters were reset before the refetch was issued.
    assert_eq!(state.filters().query, "");
    assert_eq!(state.filters().page, 1);
    assert_eq!(
        effects,
        vec![
            Effect::RefetchDocuments {
                query: String::new(),
                page: 1,
            },
            Effect::RefetchTopics,
        ]
    );

    // Observing completed again does not fire again.
    let (_, effects) = observed(state, ProcessState::Completed);
    assert!(effects.is_empty());
}

#[test]
fn failed_and_cancelled_runs_do_not_fire_refetch() {
    init_logging();
    let (state, _) = observed(AppState::new(), ProcessState::Running);
    let (state, effects) = observed(state, ProcessState::Failed);
    assert!(effects.is_empty());
    assert_eq!(state.process().status, ProcessState::Failed);

    let (state, _) = observed(AppState::new(), ProcessState::Running);
    let (_, effects) = observed(state, ProcessState::Cancelled);
    assert!(effects.is_empty());
}

#[test]
fn watch_failure_surfaces_and_auth_ends_the_session() {
    init_logging();
    let (mut state, effects) = update(
        AppState::new(),
        Msg::ProcessWatchFailed {
            reason: "network error".to_string(),
            auth: false,
        },
    );
    assert!(effects.is_empty());
    assert_eq!(
        state.view().last_error,
        Some("network error".to_string())
    );
    assert!(state.consume_dirty());

    let (_, effects) = update(
        state,
        Msg::ProcessWatchFailed {
            reason: "token expired or invalid".to_string(),
            auth: true,
        },
    );
    assert_eq!(effects, vec![Effect::EndSession]);
}

#[test]
fn login_stores_session_and_arms_the_watch() {
    init_logging();
    let (state, effects) = update(
        AppState::new(),
        Msg::LoginSucceeded {
            token: "t0k3n".to_string(),
        },
    );
    assert!(state.session_active());
    assert_eq!(
        effects,
        vec![
            Effect::StoreSession {
                token: "t0k3n".to_string()
            },
            Effect::RefetchDocuments {
                query: String::new(),
                page: 1,
            },
            Effect::WatchProcess,
        ]
    );

    let (state, effects) = update(state, Msg::LogoutRequested);
    assert_eq!(effects, vec![Effect::EndSession]);
    let (state, _) = update(state, Msg::SessionEnded);
    assert!(!state.session_active());
}

#[test]
fn session_end_cancels_a_pending_answer_watch() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::QuestionSubmitted("q".to_string()));
    let (state, _) = update(
        state,
        Msg::AskAccepted {
            task_id: "task-1".to_string(),
        },
    );
    let (_, effects) = update(state, Msg::SessionEnded);
    assert_eq!(effects, vec![Effect::CancelAnswerWatch]);
}
