use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use anyhow::Context;
use client_logging::client_warn;
use codex_core::{update, AppState, Msg};
use codex_engine::{ApiSettings, ClientEngine, HistoryStore, ReqwestApi, SessionToken};
use url::Url;

use super::effects::EffectRunner;
use super::{logging, persistence, render};

pub fn run_app() -> anyhow::Result<()> {
    logging::initialize(logging::LogDestination::File);

    let config = persistence::load_config();
    let base_url = Url::parse(&config.base_url)
        .with_context(|| format!("invalid base_url {:?}", config.base_url))?;
    let settings = ApiSettings {
        base_url,
        poll_interval: config.poll_interval(),
        ..ApiSettings::default()
    };

    let stored_token = persistence::load_session(&config.state_dir);
    let restored = stored_token.clone();
    let token = SessionToken::new(stored_token);
    let api = Arc::new(ReqwestApi::new(settings.clone(), token.clone())?);
    let engine = ClientEngine::new(api, settings.poll_interval);
    let history = HistoryStore::new(config.state_dir.clone());
    let initial_history = history.load();

    let (msg_tx, msg_rx) = mpsc::channel::<Msg>();
    let runner = EffectRunner::new(
        engine,
        history,
        token,
        config.state_dir.clone(),
        config.items_per_page,
        msg_tx.clone(),
    );

    let _ = msg_tx.send(Msg::HistoryChanged(initial_history));
    if let Some(token) = restored {
        // Re-adopt the stored session: refetches the corpus and arms the
        // process-status watch.
        let _ = msg_tx.send(Msg::LoginSucceeded { token });
    }

    let quit = Arc::new(AtomicBool::new(false));
    spawn_input_loop(msg_tx.clone(), quit.clone());

    // Background tick so the loop notices the quit flag promptly.
    {
        let msg_tx = msg_tx.clone();
        thread::spawn(move || {
            let interval = Duration::from_millis(250);
            while msg_tx.send(Msg::Tick).is_ok() {
                thread::sleep(interval);
            }
        });
    }

    let mut state = AppState::new();
    while let Ok(msg) = msg_rx.recv() {
        if quit.load(Ordering::Relaxed) {
            break;
        }
        let (next, effects) = update(std::mem::take(&mut state), msg);
        state = next;
        runner.enqueue(effects);
        if state.consume_dirty() {
            render::render(&state.view());
        }
    }

    Ok(())
}

enum Command {
    Quit,
    Msg(Msg),
}

fn spawn_input_loop(msg_tx: mpsc::Sender<Msg>, quit: Arc<AtomicBool>) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut line = String::new();
        loop {
            line.clear();
            match stdin.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {}
                Err(err) => {
                    client_warn!("stdin read failed: {}", err);
                    break;
                }
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match parse_command(trimmed) {
                Some(Command::Quit) => break,
                Some(Command::Msg(msg)) => {
                    let _ = msg_tx.send(msg);
                }
                None => {}
            }
        }
        quit.store(true, Ordering::Relaxed);
        let _ = msg_tx.send(Msg::NoOp);
    });
}

fn parse_command(line: &str) -> Option<Command> {
    // Anything that is not a slash command is a question for the chatbot.
    if !line.starts_with('/') {
        return Some(Command::Msg(Msg::QuestionSubmitted(line.to_string())));
    }
    let (head, rest) = match line.find(' ') {
        Some(idx) => (&line[..idx], line[idx + 1..].trim()),
        None => (line, ""),
    };
    match head {
        "/quit" => Some(Command::Quit),
        "/login" => {
            let mut words = rest.split_whitespace();
            let username = words.next()?.to_string();
            let password = words.next()?.to_string();
            Some(Command::Msg(Msg::LoginSubmitted { username, password }))
        }
        "/register" => {
            let mut words = rest.split_whitespace();
            let username = words.next()?.to_string();
            let password = words.next()?.to_string();
            Some(Command::Msg(Msg::RegisterSubmitted { username, password }))
        }
        "/logout" => Some(Command::Msg(Msg::LogoutRequested)),
        "/doc" => Some(Command::Msg(Msg::DocumentDetailRequested(
            rest.to_string(),
        ))),
        "/process" => Some(Command::Msg(Msg::ProcessStartRequested)),
        "/search" => Some(Command::Msg(Msg::SearchChanged(rest.to_string()))),
        "/page" => rest
            .parse()
            .ok()
            .map(|page| Command::Msg(Msg::PageChanged(page))),
        "/upload" => match std::fs::read(rest) {
            Ok(bytes) => {
                let filename = std::path::Path::new(rest)
                    .file_name()?
                    .to_string_lossy()
                    .to_string();
                Some(Command::Msg(Msg::UploadRequested { filename, bytes }))
            }
            Err(err) => {
                client_warn!("Could not read {:?}: {}", rest, err);
                None
            }
        },
        "/clear" => Some(Command::Msg(Msg::ClearRequested)),
        "/cancel" => Some(Command::Msg(Msg::AskCancelled)),
        other => {
            client_warn!("Unknown command {:?}", other);
            None
        }
    }
}
