//! In-memory StudyRepoPort. Used by tests and as a fallback when the database cannot be opened.

use crate::domain::{DomainError, StudyKind, StudySet};
use crate::ports::StudyRepoPort;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryRepo {
    sets: RwLock<Vec<StudySet>>,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl StudyRepoPort for MemoryRepo {
    async fn save_set(&self, set: &StudySet) -> Result<(), DomainError> {
        let mut sets = self.sets.write().await;
        match sets.iter_mut().find(|s| s.id == set.id) {
            Some(existing) => *existing = set.clone(),
            None => sets.push(set.clone()),
        }
        Ok(())
    }

    async fn get_set(&self, id: &str) -> Result<Option<StudySet>, DomainError> {
        Ok(self.sets.read().await.iter().find(|s| s.id == id).cloned())
    }

    async fn list_sets(
        &self,
        kind: Option<StudyKind>,
        limit: u32,
    ) -> Result<Vec<StudySet>, DomainError> {
        let sets = self.sets.read().await;
        // Insertion order breaks ties between sets created in the same second.
        let mut matching: Vec<(usize, &StudySet)> = sets
            .iter()
            .enumerate()
            .filter(|(_, s)| kind.is_none_or(|k| s.kind == k))
            .collect();
        matching.sort_by(|a, b| {
            b.1.created_at
                .cmp(&a.1.created_at)
                .then_with(|| b.0.cmp(&a.0))
        });
        Ok(matching
            .into_iter()
            .take(limit as usize)
            .map(|(_, s)| s.clone())
            .collect())
    }
}
