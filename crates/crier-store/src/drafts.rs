use std::sync::Arc;

use dashmap::DashMap;

use crier_core::draft::Draft;
use crier_core::ids::OperatorId;

/// At most one in-progress broadcast definition per operator session.
/// Not durable: a process restart loses any in-flight draft.
#[derive(Clone, Default)]
pub struct DraftStore {
    drafts: Arc<DashMap<OperatorId, Draft>>,
}

impl DraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a draft, replacing any existing one wholesale.
    pub fn set(&self, operator: &OperatorId, draft: Draft) {
        self.drafts.insert(operator.clone(), draft);
    }

    pub fn get(&self, operator: &OperatorId) -> Option<Draft> {
        self.drafts.get(operator).map(|entry| entry.value().clone())
    }

    /// Discard the operator's draft. Returns true if one existed.
    pub fn clear(&self, operator: &OperatorId) -> bool {
        self.drafts.remove(operator).is_some()
    }
}
