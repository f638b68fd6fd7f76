use async_trait::async_trait;
use crate::types::{InsertOutcome, Observation};
use crate::Result;

#[async_trait]
pub trait ObservationStore: Send {
    /// Create the observation table if it does not exist yet
    async fn ensure_schema(&mut self) -> Result<()>;

    /// Add an observation; an existing (date, time, region) row yields `Duplicate`
    async fn insert(&mut self, observation: &Observation) -> Result<InsertOutcome>;

    /// Release the underlying handle
    async fn close(self: Box<Self>) -> Result<()>;
}
