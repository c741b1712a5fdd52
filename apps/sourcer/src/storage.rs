//! Persistence collaborator. The service reads each section once at startup
//! and writes it back on every mutation; the backing store is a single JSON
//! document rather than a database.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::job::JobRequirement;
use crate::models::outreach::OutreachRecord;

/// Snapshot of the job requirement store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub requirements: Vec<JobRequirement>,
    pub active_id: Option<Uuid>,
}

/// Snapshot of the rate budget. `saved_at` lets a restore discard stale
/// snapshots (anything older than 24h carries no usable quota history).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetSnapshot {
    pub requests: Vec<DateTime<Utc>>,
    pub last_request_at: Option<DateTime<Utc>>,
    pub saved_at: DateTime<Utc>,
}

/// Everything the service persists, as one document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PersistedDocument {
    #[serde(default)]
    jobs: Option<JobSnapshot>,
    #[serde(default)]
    outreach: Vec<OutreachRecord>,
    #[serde(default)]
    budget: Option<BudgetSnapshot>,
}

/// Typed get/set persistence used by the job store, the outreach guard,
/// and the rate limiter.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn load_jobs(&self) -> Result<Option<JobSnapshot>, AppError>;
    async fn save_jobs(&self, snapshot: &JobSnapshot) -> Result<(), AppError>;

    async fn load_outreach(&self) -> Result<Vec<OutreachRecord>, AppError>;
    async fn save_outreach(&self, records: &[OutreachRecord]) -> Result<(), AppError>;

    async fn load_budget(&self) -> Result<Option<BudgetSnapshot>, AppError>;
    async fn save_budget(&self, snapshot: &BudgetSnapshot) -> Result<(), AppError>;
}

/// In-memory storage. Default for tests; also used when no storage path is
/// configured.
#[derive(Default)]
pub struct MemoryStorage {
    doc: Mutex<PersistedDocument>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn load_jobs(&self) -> Result<Option<JobSnapshot>, AppError> {
        Ok(self.doc.lock().unwrap().jobs.clone())
    }

    async fn save_jobs(&self, snapshot: &JobSnapshot) -> Result<(), AppError> {
        self.doc.lock().unwrap().jobs = Some(snapshot.clone());
        Ok(())
    }

    async fn load_outreach(&self) -> Result<Vec<OutreachRecord>, AppError> {
        Ok(self.doc.lock().unwrap().outreach.clone())
    }

    async fn save_outreach(&self, records: &[OutreachRecord]) -> Result<(), AppError> {
        self.doc.lock().unwrap().outreach = records.to_vec();
        Ok(())
    }

    async fn load_budget(&self) -> Result<Option<BudgetSnapshot>, AppError> {
        Ok(self.doc.lock().unwrap().budget.clone())
    }

    async fn save_budget(&self, snapshot: &BudgetSnapshot) -> Result<(), AppError> {
        self.doc.lock().unwrap().budget = Some(snapshot.clone());
        Ok(())
    }
}

/// File-backed storage: the whole document is kept in memory and rewritten
/// atomically (temp file + rename) on each save.
pub struct JsonFileStorage {
    path: PathBuf,
    doc: Mutex<PersistedDocument>,
}

impl JsonFileStorage {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref().to_path_buf();
        let doc = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .map_err(|e| AppError::Storage(format!("read {}: {e}", path.display())))?;
            serde_json::from_str(&raw)
                .map_err(|e| AppError::Storage(format!("parse {}: {e}", path.display())))?
        } else {
            PersistedDocument::default()
        };
        info!("Storage opened at {}", path.display());
        Ok(Self {
            path,
            doc: Mutex::new(doc),
        })
    }

    fn flush(&self) -> Result<(), AppError> {
        let raw = {
            let doc = self.doc.lock().unwrap();
            serde_json::to_string_pretty(&*doc)
                .map_err(|e| AppError::Storage(format!("serialize: {e}")))?
        };
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, raw)
            .map_err(|e| AppError::Storage(format!("write {}: {e}", tmp.display())))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| AppError::Storage(format!("rename {}: {e}", self.path.display())))?;
        Ok(())
    }
}

#[async_trait]
impl Storage for JsonFileStorage {
    async fn load_jobs(&self) -> Result<Option<JobSnapshot>, AppError> {
        Ok(self.doc.lock().unwrap().jobs.clone())
    }

    async fn save_jobs(&self, snapshot: &JobSnapshot) -> Result<(), AppError> {
        self.doc.lock().unwrap().jobs = Some(snapshot.clone());
        self.flush()
    }

    async fn load_outreach(&self) -> Result<Vec<OutreachRecord>, AppError> {
        Ok(self.doc.lock().unwrap().outreach.clone())
    }

    async fn save_outreach(&self, records: &[OutreachRecord]) -> Result<(), AppError> {
        self.doc.lock().unwrap().outreach = records.to_vec();
        self.flush()
    }

    async fn load_budget(&self) -> Result<Option<BudgetSnapshot>, AppError> {
        Ok(self.doc.lock().unwrap().budget.clone())
    }

    async fn save_budget(&self, snapshot: &BudgetSnapshot) -> Result<(), AppError> {
        self.doc.lock().unwrap().budget = Some(snapshot.clone());
        self.flush()
    }
}
