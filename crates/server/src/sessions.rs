use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use sweeplog_blob::AttachmentStore;
use sweeplog_records::RecordStore;
use sweeplog_workflow::{ReportWorkflow, SubmissionState};

/// Session used when a request carries no `x-session-id` header.
pub const DEFAULT_SESSION: &str = "default";

/// One [`ReportWorkflow`] per client session with a submission in flight.
///
/// Entries are created by [`workflow`](Self::workflow) and dropped by
/// [`evict_idle`](Self::evict_idle), so only sessions that are submitting
/// occupy the map. Reads never create an entry.
pub struct SessionRegistry {
    attachments: Arc<dyn AttachmentStore>,
    records: Arc<dyn RecordStore>,
    sessions: DashMap<String, Arc<ReportWorkflow>>,
}

impl SessionRegistry {
    pub fn new(attachments: Arc<dyn AttachmentStore>, records: Arc<dyn RecordStore>) -> Self {
        Self {
            attachments,
            records,
            sessions: DashMap::new(),
        }
    }

    /// Return the session's workflow, creating an idle one if needed.
    pub fn workflow(&self, session_id: &str) -> Arc<ReportWorkflow> {
        let entry = self.sessions.entry(session_id.to_owned()).or_insert_with(|| {
            debug!(session_id, "creating report workflow");
            Arc::new(ReportWorkflow::new(
                Arc::clone(&self.attachments),
                Arc::clone(&self.records),
            ))
        });
        Arc::clone(entry.value())
    }

    /// Current state of the session; `Idle` if it has no workflow.
    pub fn state(&self, session_id: &str) -> SubmissionState {
        self.sessions
            .get(session_id)
            .map_or(SubmissionState::Idle, |w| w.state())
    }

    /// Drop the session's workflow if it is idle and nobody else holds it.
    ///
    /// A workflow still referenced by another request stays, so two
    /// requests on one session always share the same in-flight guard.
    pub fn evict_idle(&self, session_id: &str) -> bool {
        let removed = self
            .sessions
            .remove_if(session_id, |_, workflow| {
                Arc::strong_count(workflow) == 1 && workflow.state() == SubmissionState::Idle
            })
            .is_some();
        if removed {
            debug!(session_id, "evicted idle report workflow");
        }
        removed
    }

    /// Number of sessions currently holding a workflow.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use sweeplog_blob_memory::MemoryAttachmentStore;
    use sweeplog_records_memory::MemoryRecordStore;
    use sweeplog_workflow::Submission;

    use super::*;

    fn registry() -> SessionRegistry {
        SessionRegistry::new(
            Arc::new(MemoryAttachmentStore::new()),
            Arc::new(MemoryRecordStore::new()),
        )
    }

    #[test]
    fn same_session_shares_workflow() {
        let registry = registry();
        let a = registry.workflow("alice");
        let b = registry.workflow("alice");
        let c = registry.workflow("bob");
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn state_lookup_does_not_create_sessions() {
        let registry = registry();
        for i in 0..100 {
            assert_eq!(registry.state(&format!("s{i}")), SubmissionState::Idle);
        }
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn idle_unreferenced_workflow_is_evicted() {
        let registry = registry();
        let workflow = registry.workflow("alice");
        workflow.submit(Submission::new()).await.unwrap();

        // Done is not idle.
        drop(workflow);
        assert!(!registry.evict_idle("alice"));
        assert_eq!(registry.state("alice"), SubmissionState::Done);

        registry.workflow("alice").reset().unwrap();
        assert!(registry.evict_idle("alice"));
        assert!(registry.is_empty());
        assert!(!registry.evict_idle("alice"));
    }

    #[test]
    fn referenced_workflow_is_kept() {
        let registry = registry();
        let held = registry.workflow("alice");
        assert!(!registry.evict_idle("alice"));
        assert!(Arc::ptr_eq(&held, &registry.workflow("alice")));
    }
}
