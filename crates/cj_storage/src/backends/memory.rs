use async_trait::async_trait;
use cj_core::{Error, InsertOutcome, Observation, ObservationKey, ObservationStore, Result};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

#[derive(Default)]
pub struct MemoryStore {
    keys: HashSet<ObservationKey>,
    observations: Vec<Observation>,
}

impl MemoryStore {
    pub fn insert(&mut self, observation: &Observation) -> InsertOutcome {
        if !self.keys.insert(observation.key()) {
            return InsertOutcome::Duplicate;
        }
        self.observations.push(observation.clone());
        InsertOutcome::Inserted
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }
}

/// Keeps observations in a shared, unpersisted store.
///
/// Clones share the same rows, so a clone held by a test can inspect what
/// a run wrote after the run has taken ownership of the storage.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
    schema_ready: bool,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn observations(&self) -> Vec<Observation> {
        self.store.read().await.observations().to_vec()
    }

    pub async fn count(&self) -> usize {
        self.store.read().await.observations().len()
    }
}

#[async_trait]
impl ObservationStore for InMemoryStorage {
    async fn ensure_schema(&mut self) -> Result<()> {
        self.schema_ready = true;
        Ok(())
    }

    async fn insert(&mut self, observation: &Observation) -> Result<InsertOutcome> {
        if !self.schema_ready {
            return Err(Error::Storage("no such table: data".to_string()));
        }
        let outcome = self.store.write().await.insert(observation);
        if outcome == InsertOutcome::Duplicate {
            warn!(
                "Data for {} {} ({}) has already been added",
                observation.date_string(),
                observation.time_string(),
                observation.region
            );
        }
        Ok(outcome)
    }

    async fn close(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn observation(hour: u32) -> Observation {
        Observation::new(
            NaiveDate::from_ymd_opt(2020, 4, 14).unwrap(),
            NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
            "JU",
            "test",
        )
    }

    #[tokio::test]
    async fn test_memory_storage_enforces_key() {
        let mut storage = InMemoryStorage::new();
        storage.ensure_schema().await.unwrap();
        storage.ensure_schema().await.unwrap();

        assert_eq!(storage.insert(&observation(18)).await.unwrap(), InsertOutcome::Inserted);
        assert_eq!(storage.insert(&observation(18)).await.unwrap(), InsertOutcome::Duplicate);
        assert_eq!(storage.insert(&observation(8)).await.unwrap(), InsertOutcome::Inserted);
        assert_eq!(storage.count().await, 2);
    }

    #[tokio::test]
    async fn test_insert_requires_schema() {
        let mut storage = InMemoryStorage::new();
        assert!(matches!(storage.insert(&observation(18)).await, Err(Error::Storage(_))));
    }

    #[tokio::test]
    async fn test_clones_share_rows() {
        let mut storage = InMemoryStorage::new();
        let observer = storage.clone();
        storage.ensure_schema().await.unwrap();
        storage.insert(&observation(18)).await.unwrap();
        Box::new(storage).close().await.unwrap();
        assert_eq!(observer.observations().await, vec![observation(18)]);
    }
}
