//! Chat sessions bound to a single video.

use crate::error::{AssistError, Result};
use crate::llm::ChatMessage;
use crate::rag::Source;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// One question and its answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub timestamp: DateTime<Utc>,
    pub user_message: String,
    pub assistant_response: String,
    pub sources: Vec<Source>,
    pub use_external_sources: bool,
}

#[derive(Debug, Clone)]
struct ChatSession {
    video_id: String,
    turns: Vec<ChatTurn>,
}

/// Session ID to conversation, process-local.
#[derive(Debug, Default)]
pub struct ChatSessions {
    sessions: RwLock<HashMap<String, ChatSession>>,
}

impl ChatSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Video a session is bound to, if the session exists.
    pub fn bound_video(&self, session_id: &str) -> Option<String> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(session_id)
            .map(|s| s.video_id.clone())
    }

    /// Bind `session_id` to `video_id` on first use.
    ///
    /// A session already bound to a different video is rejected.
    pub fn ensure(&self, session_id: &str, video_id: &str) -> Result<()> {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        match sessions.get(session_id) {
            Some(session) if session.video_id != video_id => Err(AssistError::InvalidInput(format!(
                "Session {} is bound to video {}",
                session_id, session.video_id
            ))),
            Some(_) => Ok(()),
            None => {
                sessions.insert(
                    session_id.to_string(),
                    ChatSession {
                        video_id: video_id.to_string(),
                        turns: Vec::new(),
                    },
                );
                Ok(())
            }
        }
    }

    /// Append a turn. Ignored when the session was cleared in the meantime.
    pub fn append(&self, session_id: &str, turn: ChatTurn) {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(session) = sessions.get_mut(session_id) {
            session.turns.push(turn);
        }
    }

    /// All turns of a session, oldest first. Unknown sessions have none.
    pub fn history(&self, session_id: &str) -> Vec<ChatTurn> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(session_id)
            .map(|s| s.turns.clone())
            .unwrap_or_default()
    }

    /// The last `turns` turns as alternating user/assistant messages.
    pub fn recent(&self, session_id: &str, turns: usize) -> Vec<ChatMessage> {
        let history = self.history(session_id);
        let skip = history.len().saturating_sub(turns);
        history
            .into_iter()
            .skip(skip)
            .flat_map(|t| {
                [
                    ChatMessage::user(t.user_message),
                    ChatMessage::assistant(t.assistant_response),
                ]
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every session. Returns how many there were.
    pub fn clear(&self) -> usize {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let count = sessions.len();
        sessions.clear();
        count
    }

    /// Drop the sessions bound to one video.
    pub fn remove_for_video(&self, video_id: &str) -> usize {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        sessions.retain(|_, s| s.video_id != video_id);
        before - sessions.len()
    }
}

/// Video ID encoded in a UI session ID of the form `{video_id}_{unix_seconds}`.
///
/// Video IDs may themselves contain underscores, so the suffix after the last
/// underscore is dropped only when it is numeric.
pub fn video_id_from_session(session_id: &str) -> Option<&str> {
    let (prefix, suffix) = session_id.rsplit_once('_')?;
    if prefix.is_empty() || suffix.is_empty() || !suffix.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;

    fn turn(q: &str, a: &str) -> ChatTurn {
        ChatTurn {
            timestamp: Utc::now(),
            user_message: q.to_string(),
            assistant_response: a.to_string(),
            sources: vec![],
            use_external_sources: false,
        }
    }

    #[test]
    fn test_session_binding() {
        let sessions = ChatSessions::new();
        sessions.ensure("s1", "video1").unwrap();
        sessions.ensure("s1", "video1").unwrap();
        assert_eq!(sessions.bound_video("s1").as_deref(), Some("video1"));

        let err = sessions.ensure("s1", "video2").unwrap_err();
        assert!(matches!(err, AssistError::InvalidInput(_)));
        assert_eq!(sessions.len(), 1);
    }

    #[test]
    fn test_history_and_recent() {
        let sessions = ChatSessions::new();
        assert!(sessions.history("missing").is_empty());

        sessions.ensure("s1", "video1").unwrap();
        for i in 0..4 {
            sessions.append("s1", turn(&format!("q{}", i), &format!("a{}", i)));
        }
        assert_eq!(sessions.history("s1").len(), 4);

        let recent = sessions.recent("s1", 2);
        assert_eq!(recent.len(), 4);
        assert_eq!(recent[0], ChatMessage::user("q2"));
        assert_eq!(recent[3].role, Role::Assistant);
        assert_eq!(recent[3].content, "a3");
    }

    #[test]
    fn test_remove_for_video_and_clear() {
        let sessions = ChatSessions::new();
        sessions.ensure("s1", "v1").unwrap();
        sessions.ensure("s2", "v1").unwrap();
        sessions.ensure("s3", "v2").unwrap();

        assert_eq!(sessions.remove_for_video("v1"), 2);
        assert!(sessions.bound_video("s1").is_none());

        // Appending to a dropped session is a no-op.
        sessions.append("s1", turn("q", "a"));
        assert!(sessions.history("s1").is_empty());

        assert_eq!(sessions.clear(), 1);
        assert!(sessions.is_empty());
    }

    #[test]
    fn test_video_id_from_session() {
        assert_eq!(video_id_from_session("dQw4w9WgXcQ_1712345678"), Some("dQw4w9WgXcQ"));
        assert_eq!(video_id_from_session("ab_cd_efgh_i_1712345678"), Some("ab_cd_efgh_i"));
        assert_eq!(video_id_from_session("no-underscore"), None);
        assert_eq!(video_id_from_session("abc_notanumber"), None);
    }
}
