use chrono::{DateTime, Local};
use codex_core::{AppViewModel, Role};

const SHOWN_MESSAGES: usize = 6;

/// Prints the current view to stdout. Called only when the state reported
/// itself dirty, so quiet ticks stay quiet.
pub(crate) fn render(view: &AppViewModel) {
    println!();
    let mut status = format!("[{}]", view.process_status);
    if let Some(ts) = &view.last_run_time {
        status.push_str(&format!(" last run {}", format_local(ts)));
    }
    status.push_str(&format!(
        " | docs {}/{} ({} not processed)",
        view.documents.shown, view.documents.total, view.documents.not_processed
    ));
    if !view.filters.query.is_empty() {
        status.push_str(&format!(
            " | q={:?} p{}",
            view.filters.query, view.filters.page
        ));
    }
    if !view.session_active {
        status.push_str(" | not logged in");
    }
    println!("{status}");
    if let Some(error) = &view.last_error {
        println!("! {error}");
    }

    if let Some(detail) = &view.document_detail {
        println!(
            "doc {:?} ({})",
            detail.filename,
            if detail.processed {
                "processed"
            } else {
                "pending"
            }
        );
        for topic in &detail.topics {
            println!("  {} {:.1}%", topic.name, topic.weight * 100.0);
        }
    }

    let skip = view.messages.len().saturating_sub(SHOWN_MESSAGES);
    for message in view.messages.iter().skip(skip) {
        let prefix = match message.role {
            Role::User => "you",
            Role::Assistant => "bot",
        };
        println!("{prefix}> {}", message.content);
        if !message.sources.is_empty() {
            println!("     sources: {}", message.sources.join(", "));
        }
    }
    if view.answer_pending {
        println!("bot> ...");
    }
    if let Some(error) = &view.answer_error {
        println!("bot> (error: {error})");
    }
}

fn format_local(ts: &str) -> String {
    match DateTime::parse_from_rfc3339(ts) {
        Ok(parsed) => parsed
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        Err(_) => ts.to_string(),
    }
}
