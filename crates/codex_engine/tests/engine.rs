use std::sync::Arc;
use std::time::Duration;

use codex_core::{ProcessState, Role, WELCOME_TEXT};
use codex_engine::{
    Api, ApiSettings, ClientEngine, EngineEvent, HistoryStore, ReqwestApi, SessionToken,
};
use serde_json::json;
use tempfile::tempdir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PERIOD: Duration = Duration::from_millis(25);

fn engine_for(server: &MockServer) -> ClientEngine {
    client_logging::initialize_for_tests();
    let settings = ApiSettings {
        base_url: Url::parse(&server.uri()).expect("server uri"),
        connect_timeout: Duration::from_secs(2),
        request_timeout: Duration::from_secs(2),
        poll_interval: PERIOD,
    };
    let api = ReqwestApi::new(settings, SessionToken::new(Some("t0k3n".to_string())))
        .expect("client");
    ClientEngine::new(Arc::new(api) as Arc<dyn Api>, PERIOD)
}

async fn next_event(engine: &ClientEngine) -> EngineEvent {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        if let Some(event) = engine.try_recv() {
            return event;
        }
        if tokio::time::Instant::now() > deadline {
            panic!("timed out waiting for an engine event");
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn a_question_round_trip_appends_one_assistant_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chatbot/ask"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "task_id": "abc" })))
        .expect(1)
        .mount(&server)
        .await;
    // Two pending polls, then the answer. Mounted first so it matches first.
    Mock::given(method("GET"))
        .and(path("/chatbot/answer/abc"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({ "status": "pending" })))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/chatbot/answer/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "done",
            "answer": "X is...",
            "sources": ["doc1"],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let engine = engine_for(&server);
    let dir = tempdir().expect("tempdir");
    let store = HistoryStore::new(dir.path());
    store.append_user("What is X?");

    let context = vec![(Role::Assistant, WELCOME_TEXT.to_string())];
    engine.submit_question("What is X?", context);

    let task_id = match next_event(&engine).await {
        EngineEvent::AskFinished { result } => result.expect("ask accepted"),
        other => panic!("expected AskFinished, got {other:?}"),
    };
    assert_eq!(task_id, "abc");

    engine.watch_answer(task_id.clone());
    let answer = match next_event(&engine).await {
        EngineEvent::AnswerReady {
            task_id: ready_id,
            answer,
        } => {
            assert_eq!(ready_id, task_id);
            answer
        }
        other => panic!("expected AnswerReady, got {other:?}"),
    };
    assert_eq!(answer.answer, "X is...");
    assert_eq!(answer.sources, vec!["doc1".to_string()]);

    let list = store.append_assistant(answer.answer.clone(), answer.sources.clone());
    assert_eq!(list.len(), 3);
    let merged = &list[2];
    assert_eq!(merged.role, Role::Assistant);
    assert_eq!(merged.position, 2);
    assert_eq!(merged.content, "X is...");

    // The watch stopped at the terminal status: no polls after the "done".
    tokio::time::sleep(PERIOD * 4).await;
    let answer_polls = server
        .received_requests()
        .await
        .expect("requests")
        .iter()
        .filter(|request| request.url.path() == "/chatbot/answer/abc")
        .count();
    assert_eq!(answer_polls, 3);
}

#[tokio::test]
async fn a_cancelled_watch_never_delivers_a_completion() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/chatbot/answer/late"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "done",
            "answer": "too late",
            "sources": [],
        })))
        .mount(&server)
        .await;

    let engine = engine_for(&server);
    engine.watch_answer("late".to_string());
    engine.cancel_answer_watch();

    tokio::time::sleep(PERIOD * 6).await;
    assert!(engine.try_recv().is_none());
}

#[tokio::test]
async fn rearming_the_answer_watch_tears_down_the_previous_task() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/chatbot/answer/old"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({ "status": "pending" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/chatbot/answer/new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "done",
            "answer": "fresh",
            "sources": [],
        })))
        .mount(&server)
        .await;

    let engine = engine_for(&server);
    engine.watch_answer("old".to_string());
    engine.watch_answer("new".to_string());

    match next_event(&engine).await {
        EngineEvent::AnswerReady { task_id, answer } => {
            assert_eq!(task_id, "new");
            assert_eq!(answer.answer, "fresh");
        }
        other => panic!("expected AnswerReady, got {other:?}"),
    }

    // The superseded watch must not report anything afterwards.
    tokio::time::sleep(PERIOD * 4).await;
    assert!(engine.try_recv().is_none());
}

#[tokio::test]
async fn the_process_watch_reports_each_observation_and_stops_when_terminal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/documents/process/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "running",
            "last_run_time": null,
        })))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/documents/process/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "completed",
            "last_run_time": "2026-08-24T10:00:00Z",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let engine = engine_for(&server);
    engine.watch_process();

    let mut statuses = Vec::new();
    loop {
        match next_event(&engine).await {
            EngineEvent::ProcessStatusObserved(snapshot) => statuses.push(snapshot.status),
            EngineEvent::ProcessWatchEnded { status } => {
                assert_eq!(status, ProcessState::Completed);
                break;
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
    assert_eq!(
        statuses,
        vec![
            ProcessState::Running,
            ProcessState::Running,
            ProcessState::Completed,
        ]
    );

    // Terminal status stops the ticking.
    tokio::time::sleep(PERIOD * 4).await;
    let status_polls = server
        .received_requests()
        .await
        .expect("requests")
        .iter()
        .filter(|request| request.url.path() == "/documents/process/status")
        .count();
    assert_eq!(status_polls, 3);
}
