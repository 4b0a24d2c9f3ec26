use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use uuid::Uuid;

/// A proposed file write waiting for an operator decision. The content never
/// reaches the conversation log until the decision is made.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteApprovalRequest {
    pub id: String,
    pub path: String,
    pub content: String,
    pub created_at: String,
}

#[derive(Debug)]
struct PendingApproval {
    request: WriteApprovalRequest,
    responder: oneshot::Sender<bool>,
}

/// Asynchronous approve/reject exchange between the orchestrator and a human
/// operator. Clones share the same pending set.
#[derive(Clone, Default)]
pub struct ApprovalGate {
    pending: Arc<Mutex<HashMap<String, PendingApproval>>>,
}

impl ApprovalGate {
    pub fn request(
        &self,
        path: &str,
        content: &str,
    ) -> (WriteApprovalRequest, oneshot::Receiver<bool>) {
        let request = WriteApprovalRequest {
            id: Uuid::new_v4().to_string(),
            path: path.to_string(),
            content: content.to_string(),
            created_at: Utc::now().to_rfc3339(),
        };

        let (tx, rx) = oneshot::channel();
        let mut guard = self.pending.lock().expect("approval gate mutex poisoned");
        guard.insert(
            request.id.clone(),
            PendingApproval {
                request: request.clone(),
                responder: tx,
            },
        );
        (request, rx)
    }

    pub fn list_pending(&self) -> Vec<WriteApprovalRequest> {
        let guard = self.pending.lock().expect("approval gate mutex poisoned");
        let mut values: Vec<WriteApprovalRequest> =
            guard.values().map(|entry| entry.request.clone()).collect();
        values.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        values
    }

    pub fn resolve(&self, approval_id: &str, approve: bool) -> Result<WriteApprovalRequest, String> {
        let entry = {
            let mut guard = self.pending.lock().expect("approval gate mutex poisoned");
            let Some(entry) = guard.remove(approval_id) else {
                return Err(format!("approval request not found: {approval_id}"));
            };
            entry
        };

        let _ = entry.responder.send(approve);
        Ok(entry.request)
    }

    /// Discard every pending write, answering reject to each waiter.
    pub fn reject_all(&self) {
        let ids: Vec<String> = {
            let guard = self.pending.lock().expect("approval gate mutex poisoned");
            guard.keys().cloned().collect()
        };
        for id in ids {
            let _ = self.resolve(&id, false);
        }
    }
}
