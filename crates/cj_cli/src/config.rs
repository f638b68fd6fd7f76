use cj_core::DispatchConfig;
use cj_storage::StorageKind;
use std::path::PathBuf;
use tracing::warn;

pub const DATABASE_VAR: &str = "COVID_JU_DATABASE";
pub const STORAGE_VAR: &str = "COVID_JU_STORAGE";
pub const GH_USER_VAR: &str = "MORPH_GH_USER";
pub const GH_TOKEN_VAR: &str = "MORPH_GH_TOKEN";
pub const GH_REPO_VAR: &str = "MORPH_GH_REPO";

const DEFAULT_DATABASE: &str = "data.sqlite";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub storage: StorageKind,
    pub database: PathBuf,
    pub dispatch: Option<DispatchConfig>,
}

impl Settings {
    pub fn from_env() -> cj_core::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> cj_core::Result<Self> {
        let value = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let storage = match value(STORAGE_VAR) {
            Some(kind) => kind.parse()?,
            None => StorageKind::default(),
        };
        let database = value(DATABASE_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE));

        let dispatch = match (value(GH_USER_VAR), value(GH_TOKEN_VAR), value(GH_REPO_VAR)) {
            (Some(user), Some(token), Some(repo)) => Some(DispatchConfig { user, token, repo }),
            (None, None, None) => None,
            _ => {
                warn!(
                    "Notification disabled: {}, {} and {} must all be set",
                    GH_USER_VAR, GH_TOKEN_VAR, GH_REPO_VAR
                );
                None
            }
        };

        Ok(Self { storage, database, dispatch })
    }
}
