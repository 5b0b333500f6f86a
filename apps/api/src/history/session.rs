//! Workspace session: the analysis state machine and the active history selection.
//!
//! idle → analyzing → {displaying | failed} → idle (reset). Only one analysis may be in
//! flight; a ticket dropped before completion (client went away) returns the phase to idle.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum AnalysisPhase {
    Idle,
    Analyzing,
    Displaying {
        #[serde(rename = "historyId")]
        history_id: String,
    },
    Failed {
        message: String,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceSnapshot {
    #[serde(flatten)]
    pub phase: AnalysisPhase,
    pub active_history_id: Option<String>,
}

#[derive(Debug)]
struct Workspace {
    phase: AnalysisPhase,
    active_history_id: Option<String>,
}

/// Shared handle to the single workspace of this service.
#[derive(Clone)]
pub struct WorkspaceHandle {
    inner: Arc<Mutex<Workspace>>,
}

impl Default for WorkspaceHandle {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Workspace {
                phase: AnalysisPhase::Idle,
                active_history_id: None,
            })),
        }
    }
}

impl WorkspaceHandle {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Workspace> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enters `Analyzing`. Returns `None` while another analysis is running.
    pub fn try_begin(&self) -> Option<AnalysisTicket> {
        let mut ws = self.lock();
        if ws.phase == AnalysisPhase::Analyzing {
            return None;
        }
        ws.phase = AnalysisPhase::Analyzing;
        Some(AnalysisTicket {
            workspace: self.clone(),
            settled: false,
        })
    }

    /// New research: back to idle, selection cleared.
    pub fn reset(&self) {
        let mut ws = self.lock();
        if ws.phase != AnalysisPhase::Analyzing {
            ws.phase = AnalysisPhase::Idle;
        }
        ws.active_history_id = None;
    }

    pub fn select(&self, history_id: &str) {
        self.lock().active_history_id = Some(history_id.to_string());
    }

    /// Called after a history item is deleted. Clears the selection if it pointed at it.
    pub fn forget(&self, history_id: &str) {
        let mut ws = self.lock();
        if ws.active_history_id.as_deref() == Some(history_id) {
            ws.active_history_id = None;
        }
        if matches!(&ws.phase, AnalysisPhase::Displaying { history_id: shown } if shown == history_id) {
            ws.phase = AnalysisPhase::Idle;
        }
    }

    pub fn snapshot(&self) -> WorkspaceSnapshot {
        let ws = self.lock();
        WorkspaceSnapshot {
            phase: ws.phase.clone(),
            active_history_id: ws.active_history_id.clone(),
        }
    }
}

/// Proof that the caller owns the in-flight analysis.
pub struct AnalysisTicket {
    workspace: WorkspaceHandle,
    settled: bool,
}

impl AnalysisTicket {
    /// Analysis succeeded and was recorded as `history_id`, which becomes the selection.
    pub fn complete(mut self, history_id: &str) {
        let mut ws = self.workspace.lock();
        ws.phase = AnalysisPhase::Displaying {
            history_id: history_id.to_string(),
        };
        ws.active_history_id = Some(history_id.to_string());
        self.settled = true;
    }

    pub fn fail(mut self, message: impl Into<String>) {
        self.workspace.lock().phase = AnalysisPhase::Failed {
            message: message.into(),
        };
        self.settled = true;
    }
}

impl Drop for AnalysisTicket {
    fn drop(&mut self) {
        if !self.settled {
            self.workspace.lock().phase = AnalysisPhase::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_submit_is_rejected_while_analyzing() {
        let ws = WorkspaceHandle::new();
        let ticket = ws.try_begin().unwrap();
        assert!(ws.try_begin().is_none());
        assert_eq!(ws.snapshot().phase, AnalysisPhase::Analyzing);
        ticket.complete("h1");
        assert!(ws.try_begin().is_some());
    }

    #[test]
    fn test_complete_selects_result() {
        let ws = WorkspaceHandle::new();
        ws.try_begin().unwrap().complete("h1");
        let snap = ws.snapshot();
        assert_eq!(
            snap.phase,
            AnalysisPhase::Displaying {
                history_id: "h1".to_string()
            }
        );
        assert_eq!(snap.active_history_id.as_deref(), Some("h1"));
    }

    #[test]
    fn test_fail_then_reset_returns_to_idle() {
        let ws = WorkspaceHandle::new();
        ws.try_begin().unwrap().fail("boom");
        assert!(matches!(ws.snapshot().phase, AnalysisPhase::Failed { .. }));
        ws.reset();
        assert_eq!(ws.snapshot().phase, AnalysisPhase::Idle);
    }

    #[test]
    fn test_dropped_ticket_releases_guard() {
        let ws = WorkspaceHandle::new();
        drop(ws.try_begin().unwrap());
        assert_eq!(ws.snapshot().phase, AnalysisPhase::Idle);
        assert!(ws.try_begin().is_some());
    }

    #[test]
    fn test_forget_clears_only_matching_selection() {
        let ws = WorkspaceHandle::new();
        ws.select("a");
        ws.forget("b");
        assert_eq!(ws.snapshot().active_history_id.as_deref(), Some("a"));
        ws.forget("a");
        assert_eq!(ws.snapshot().active_history_id, None);
    }

    #[test]
    fn test_forget_displayed_item_returns_to_idle() {
        let ws = WorkspaceHandle::new();
        ws.try_begin().unwrap().complete("h1");
        ws.forget("h1");
        let snap = ws.snapshot();
        assert_eq!(snap.phase, AnalysisPhase::Idle);
        assert_eq!(snap.active_history_id, None);
    }

    #[test]
    fn test_snapshot_serialization() {
        let ws = WorkspaceHandle::new();
        ws.try_begin().unwrap().complete("h1");
        let value = serde_json::to_value(ws.snapshot()).unwrap();
        assert_eq!(value["phase"], "displaying");
        assert_eq!(value["historyId"], "h1");
        assert_eq!(value["activeHistoryId"], "h1");
    }
}
