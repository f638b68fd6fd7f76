pub mod error;
pub mod notify;
pub mod storage;
pub mod types;

pub use error::{Error, Result};
pub use notify::{DispatchConfig, GitHubDispatch, Notifier};
pub use storage::ObservationStore;
pub use types::{InsertOutcome, Observation, ObservationKey};
