//! Process-wide transition event bus.
//!
//! Listeners are registered for the lifetime of the process and invoked
//! synchronously, in registration order, whenever an issue changes state.
//! Listeners must be cheap or offload their work; emission holds the
//! shared read lock, so a listener must never re-enter the bus.

use std::sync::{OnceLock, RwLock};

use serde::{Deserialize, Serialize};

use crate::models::IssueKind;

/// Emitted whenever an issue changes state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionEvent {
    pub project: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epic_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: IssueKind,
    pub from: String,
    pub to: String,
    pub time: String,
}

type Listener = Box<dyn Fn(&TransitionEvent) + Send + Sync>;

fn listeners() -> &'static RwLock<Vec<Listener>> {
    static LISTENERS: OnceLock<RwLock<Vec<Listener>>> = OnceLock::new();
    LISTENERS.get_or_init(|| RwLock::new(Vec::new()))
}

/// Register a listener for workflow transitions. Listeners cannot be
/// removed; they live for the rest of the process.
pub fn register_listener<F>(listener: F)
where
    F: Fn(&TransitionEvent) + Send + Sync + 'static,
{
    if let Ok(mut guard) = listeners().write() {
        guard.push(Box::new(listener));
    }
}

/// Broadcast a transition event to all registered listeners, in
/// registration order.
pub fn emit(event: &TransitionEvent) {
    if let Ok(guard) = listeners().read() {
        for listener in guard.iter() {
            listener(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn event(to: &str) -> TransitionEvent {
        TransitionEvent {
            project: "demo".to_string(),
            epic_id: Some("D-1".to_string()),
            story_id: Some("D-2".to_string()),
            task_id: Some("D-3".to_string()),
            kind: IssueKind::Task,
            from: "todo".to_string(),
            to: to.to_string(),
            time: crate::ids::now(),
        }
    }

    #[test]
    fn test_emit_reaches_listener() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        register_listener(move |e| {
            if e.project == "demo" {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
        emit(&event("in-progress"));
        emit(&event("ready-for-testing"));
        assert!(seen.load(Ordering::SeqCst) >= 2);
    }

    #[test]
    fn test_event_serialization_omits_empty_ids() {
        let e = TransitionEvent {
            project: "demo".to_string(),
            epic_id: None,
            story_id: None,
            task_id: None,
            kind: IssueKind::Epic,
            from: "backlog".to_string(),
            to: "todo".to_string(),
            time: "2026-01-01T00:00:00Z".to_string(),
        };
        let json = serde_json::to_string(&e).unwrap();
        assert!(!json.contains("epic_id"));
        assert!(json.contains(r#""type":"epic""#));
    }
}
