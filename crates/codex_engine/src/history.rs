use std::fs;
use std::path::PathBuf;

use client_logging::{client_error, client_warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use codex_core::{sort_by_position, ChatMessage, Role};

use crate::persist::AtomicFileWriter;

/// Filename of the single serialized conversation blob in the state dir.
pub const HISTORY_FILENAME: &str = "chatbot_history.json";

/// Serde mirror of `ChatMessage`; core types stay serde-free.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredMessage {
    id: String,
    position: u64,
    role: String,
    content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    sources: Vec<String>,
}

fn to_stored(message: &ChatMessage) -> StoredMessage {
    StoredMessage {
        id: message.id.clone(),
        position: message.position,
        role: message.role.as_str().to_string(),
        content: message.content.clone(),
        sources: message.sources.clone(),
    }
}

fn from_stored(record: StoredMessage) -> Option<ChatMessage> {
    let role = match record.role.as_str() {
        "user" => Role::User,
        "assistant" => Role::Assistant,
        _ => return None,
    };
    Some(ChatMessage {
        id: record.id,
        position: record.position,
        role,
        content: record.content,
        sources: record.sources,
    })
}

/// Durable, cross-restart conversation state: one JSON blob in the state
/// directory, with position-stable append semantics.
///
/// There is no locking; two appends racing on the read-modify-write can
/// clobber one message. Positions stay consistent for readers because they
/// are always assigned from the stored list, never from a caller's view.
pub struct HistoryStore {
    dir: PathBuf,
}

impl HistoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Reads the stored conversation. Absent, unreadable or malformed data
    /// falls open to the singleton welcome message; this never errors.
    pub fn load(&self) -> Vec<ChatMessage> {
        match self.read_stored() {
            Some(mut messages) => {
                sort_by_position(&mut messages);
                messages
            }
            None => vec![welcome_message()],
        }
    }

    /// Appends durably and returns the new list for the caller to adopt as
    /// its in-memory state.
    ///
    /// The position is assigned from the stored list length, not the
    /// caller's view, which may lag behind an append from another writer.
    pub fn append(&self, mut message: ChatMessage) -> Vec<ChatMessage> {
        let mut messages = self.load();
        message.position = messages.len() as u64;
        messages.push(message);
        self.write(&messages);
        messages
    }

    pub fn append_user(&self, content: impl Into<String>) -> Vec<ChatMessage> {
        self.append(ChatMessage::user(new_id(), content))
    }

    pub fn append_assistant(
        &self,
        content: impl Into<String>,
        sources: Vec<String>,
    ) -> Vec<ChatMessage> {
        self.append(ChatMessage::assistant(new_id(), content, sources))
    }

    /// Resets storage to the welcome singleton and returns it.
    pub fn clear(&self) -> Vec<ChatMessage> {
        let messages = vec![welcome_message()];
        self.write(&messages);
        messages
    }

    fn path(&self) -> PathBuf {
        self.dir.join(HISTORY_FILENAME)
    }

    fn read_stored(&self) -> Option<Vec<ChatMessage>> {
        let path = self.path();
        let content = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
            Err(err) => {
                client_warn!("Failed to read conversation from {:?}: {}", path, err);
                return None;
            }
        };

        let stored: Vec<StoredMessage> = match serde_json::from_str(&content) {
            Ok(stored) => stored,
            Err(err) => {
                client_warn!("Failed to parse conversation from {:?}: {}", path, err);
                return None;
            }
        };

        let mut messages = Vec::with_capacity(stored.len());
        for record in stored {
            match from_stored(record) {
                Some(message) => messages.push(message),
                None => {
                    client_warn!("Unknown role in stored conversation at {:?}", path);
                    return None;
                }
            }
        }
        if messages.is_empty() {
            return None;
        }
        Some(messages)
    }

    fn write(&self, messages: &[ChatMessage]) {
        let stored: Vec<StoredMessage> = messages.iter().map(to_stored).collect();
        let content = match serde_json::to_string_pretty(&stored) {
            Ok(text) => text,
            Err(err) => {
                client_error!("Failed to serialize conversation: {}", err);
                return;
            }
        };

        let writer = AtomicFileWriter::new(self.dir.clone());
        if let Err(err) = writer.write(HISTORY_FILENAME, &content) {
            client_error!("Failed to write conversation to {:?}: {}", self.dir, err);
        }
    }
}

fn welcome_message() -> ChatMessage {
    ChatMessage::welcome(new_id())
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}
