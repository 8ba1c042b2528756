use codex_core::{
    update, Answer, AppState, ChatMessage, Effect, Msg, PollState, Role, CONTEXT_WINDOW,
};

fn init_logging() {
    client_logging::initialize_for_tests();
}

fn message(position: u64, role: Role, content: &str) -> ChatMessage {
    ChatMessage {
        id: format!("m{position}"),
        position,
        role,
        content: content.to_string(),
        sources: Vec::new(),
    }
}

fn accepted(state: AppState, task_id: &str) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::AskAccepted {
            task_id: task_id.to_string(),
        },
    )
}

#[test]
fn submitting_a_question_appends_and_asks_with_trailing_context() {
    init_logging();
    let history: Vec<ChatMessage> = (0..7)
        .map(|i| message(i, Role::Assistant, &format!("msg {i}")))
        .collect();
    let (state, _) = update(AppState::new(), Msg::HistoryChanged(history));

    let (state, effects) = update(state, Msg::QuestionSubmitted("  What is X?  ".to_string()));

    assert!(state.answer_poll().is_pending());
    assert_eq!(effects.len(), 2);
    assert_eq!(
        effects[0],
        Effect::AppendUserMessage {
            content: "What is X?".to_string()
        }
    );
    match &effects[1] {
        Effect::SubmitQuestion { question, context } => {
            assert_eq!(question, "What is X?");
            // Context is the history before the new question, capped at the window.
            assert_eq!(context.len(), CONTEXT_WINDOW);
            assert_eq!(context[0].1, "msg 2");
            assert_eq!(context[4].1, "msg 6");
        }
        other => panic!("expected SubmitQuestion, got {other:?}"),
    }
}

#[test]
fn submit_is_refused_while_pending_or_empty() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::QuestionSubmitted("   ".to_string()));
    assert!(effects.is_empty());

    let (state, _) = update(state, Msg::QuestionSubmitted("first".to_string()));
    let (state, effects) = update(state, Msg::QuestionSubmitted("second".to_string()));
    assert!(effects.is_empty());
    assert!(state.answer_poll().is_pending());
}

#[test]
fn accepted_task_arms_the_answer_watch() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::QuestionSubmitted("q".to_string()));
    let (state, effects) = accepted(state, "task-1");

    assert_eq!(state.active_task(), Some(&"task-1".to_string()));
    assert_eq!(
        effects,
        vec![Effect::WatchAnswer {
            task_id: "task-1".to_string()
        }]
    );
}

#[test]
fn answer_merges_exactly_once() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::QuestionSubmitted("q".to_string()));
    let (state, _) = accepted(state, "task-1");

    let answer = Answer {
        answer: "X is...".to_string(),
        sources: vec!["doc1".to_string()],
    };
    let ready = Msg::AnswerReady {
        task_id: "task-1".to_string(),
        answer: answer.clone(),
    };

    let (state, effects) = update(state, ready.clone());
    assert_eq!(
        effects,
        vec![Effect::AppendAssistantMessage {
            content: "X is...".to_string(),
            sources: vec!["doc1".to_string()],
        }]
    );
    assert_eq!(state.answer_poll(), &PollState::Succeeded(answer));
    assert_eq!(state.active_task(), None);

    // A duplicate completion is dropped.
    let (state, effects) = update(state, ready);
    assert!(effects.is_empty());
    assert_eq!(state.active_task(), None);
}

#[test]
fn completion_for_a_stale_task_id_is_dropped() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::QuestionSubmitted("q".to_string()));
    let (state, _) = accepted(state, "task-2");

    let (state, effects) = update(
        state,
        Msg::AnswerReady {
            task_id: "task-1".to_string(),
            answer: Answer {
                answer: "late".to_string(),
                sources: Vec::new(),
            },
        },
    );
    assert!(effects.is_empty());
    assert!(state.answer_poll().is_pending());
    assert_eq!(state.active_task(), Some(&"task-2".to_string()));
}

#[test]
fn failed_answer_is_terminal_and_auth_failures_end_the_session() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::QuestionSubmitted("q".to_string()));
    let (state, _) = accepted(state, "task-1");

    let (state, effects) = update(
        state,
        Msg::AnswerFailed {
            task_id: "task-1".to_string(),
            reason: "boom".to_string(),
            auth: false,
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.answer_poll(), &PollState::Failed("boom".to_string()));

    let (state, _) = update(state, Msg::QuestionSubmitted("again".to_string()));
    let (state, _) = accepted(state, "task-2");
    let (_, effects) = update(
        state,
        Msg::AnswerFailed {
            task_id: "task-2".to_string(),
            reason: "token expired or invalid".to_string(),
            auth: true,
        },
    );
    assert_eq!(effects, vec![Effect::EndSession]);
}

#[test]
fn cancelling_mid_poll_tears_down_the_watch() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::QuestionSubmitted("q".to_string()));
    let (state, _) = accepted(state, "task-1");

    let (state, effects) = update(state, Msg::AskCancelled);
    assert_eq!(effects, vec![Effect::CancelAnswerWatch]);
    assert_eq!(state.answer_poll(), &PollState::Cancelled);
    assert_eq!(state.active_task(), None);

    // A completion arriving after teardown must not merge.
    let (_, effects) = update(
        state,
        Msg::AnswerReady {
            task_id: "task-1".to_string(),
            answer: Answer {
                answer: "late".to_string(),
                sources: Vec::new(),
            },
        },
    );
    assert!(effects.is_empty());
}

#[test]
fn clear_is_refused_while_pending() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::ClearRequested);
    assert_eq!(effects, vec![Effect::ClearHistory]);

    let (state, _) = update(state, Msg::QuestionSubmitted("q".to_string()));
    let (_, effects) = update(state, Msg::ClearRequested);
    assert!(effects.is_empty());
}

#[test]
fn view_orders_messages_by_position_not_index() {
    init_logging();
    let history = vec![
        message(2, Role::Assistant, "third"),
        message(0, Role::Assistant, "first"),
        message(1, Role::User, "second"),
    ];
    let (mut state, _) = update(AppState::new(), Msg::HistoryChanged(history));
    assert!(state.consume_dirty());

    let contents: Vec<_> = state
        .view()
        .messages
        .iter()
        .map(|m| m.content.clone())
        .collect();
    assert_eq!(contents, vec!["first", "second", "third"]);
}
