//! Job requirement store: the single owner of the requirement list and the
//! active-requirement pointer. Loaded once at startup, persisted on every
//! mutation.

pub mod handlers;
pub mod parser;
pub mod prompts;

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::job::{JobRequirement, WeightedSkill};
use crate::storage::{JobSnapshot, Storage};

#[derive(Default)]
struct StoreState {
    requirements: Vec<JobRequirement>,
    active_id: Option<Uuid>,
}

pub struct JobStore {
    state: Mutex<StoreState>,
    storage: Arc<dyn Storage>,
}

/// The requirement seeded into an empty store so scoring works out of the
/// box.
pub fn default_requirement() -> JobRequirement {
    let mut job = JobRequirement::new("短视频拍摄剪辑运营");
    job.required_skills = vec![
        WeightedSkill::required("PR"),
        WeightedSkill::required("剪映"),
        WeightedSkill::required("视频拍摄"),
    ];
    job.bonus_skills = vec![
        WeightedSkill::bonus("抖音"),
        WeightedSkill::bonus("快手"),
        WeightedSkill::bonus("直播"),
        WeightedSkill::bonus("剪辑"),
        WeightedSkill::bonus("PS"),
        WeightedSkill::bonus("摄影"),
    ];
    job.exclude_keywords = vec!["兼职".to_string(), "实习".to_string(), "远程".to_string()];
    job
}

impl JobStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            storage,
        }
    }

    /// Loads persisted requirements, seeding the default one when the store
    /// is empty.
    pub async fn load(&self) -> Result<(), AppError> {
        let snapshot = self.storage.load_jobs().await?;
        match snapshot {
            Some(snapshot) if !snapshot.requirements.is_empty() => {
                let mut state = self.state.lock().unwrap();
                state.active_id = snapshot
                    .active_id
                    .filter(|id| snapshot.requirements.iter().any(|j| j.id == *id))
                    .or(snapshot.requirements.first().map(|j| j.id));
                state.requirements = snapshot.requirements;
                info!("Loaded {} job requirement(s)", state.requirements.len());
            }
            _ => {
                let job = default_requirement();
                info!("Seeding default job requirement '{}'", job.name);
                {
                    let mut state = self.state.lock().unwrap();
                    state.active_id = Some(job.id);
                    state.requirements = vec![job];
                }
                self.persist().await?;
            }
        }
        Ok(())
    }

    pub fn list(&self) -> Vec<JobRequirement> {
        self.state.lock().unwrap().requirements.clone()
    }

    pub fn active_id(&self) -> Option<Uuid> {
        self.state.lock().unwrap().active_id
    }

    pub fn get(&self, id: Uuid) -> Result<JobRequirement, AppError> {
        self.state
            .lock()
            .unwrap()
            .requirements
            .iter()
            .find(|j| j.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("job requirement {id}")))
    }

    pub fn get_active(&self) -> Result<JobRequirement, AppError> {
        let state = self.state.lock().unwrap();
        let id = state
            .active_id
            .ok_or_else(|| AppError::NotFound("active job requirement".to_string()))?;
        state
            .requirements
            .iter()
            .find(|j| j.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("job requirement {id}")))
    }

    pub async fn create(&self, job: JobRequirement) -> Result<JobRequirement, AppError> {
        if job.name.trim().is_empty() {
            return Err(AppError::Validation("job name must not be empty".into()));
        }
        {
            let mut state = self.state.lock().unwrap();
            if state.active_id.is_none() {
                state.active_id = Some(job.id);
            }
            state.requirements.push(job.clone());
        }
        self.persist().await?;
        Ok(job)
    }

    /// Whole-record replace: the stored requirement is never silently
    /// merged. Id and creation time are preserved, `updated_at` refreshed.
    pub async fn update(&self, id: Uuid, mut job: JobRequirement) -> Result<JobRequirement, AppError> {
        if job.name.trim().is_empty() {
            return Err(AppError::Validation("job name must not be empty".into()));
        }
        {
            let mut state = self.state.lock().unwrap();
            let existing = state
                .requirements
                .iter_mut()
                .find(|j| j.id == id)
                .ok_or_else(|| AppError::NotFound(format!("job requirement {id}")))?;
            job.id = id;
            job.created_at = existing.created_at;
            job.updated_at = Utc::now();
            *existing = job.clone();
        }
        self.persist().await?;
        Ok(job)
    }

    /// Removes a requirement. The last remaining one can never be deleted;
    /// deleting the active one promotes the first survivor.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        {
            let mut state = self.state.lock().unwrap();
            if !state.requirements.iter().any(|j| j.id == id) {
                return Err(AppError::NotFound(format!("job requirement {id}")));
            }
            if state.requirements.len() == 1 {
                return Err(AppError::Validation(
                    "cannot delete the last job requirement".into(),
                ));
            }
            state.requirements.retain(|j| j.id != id);
            if state.active_id == Some(id) {
                state.active_id = state.requirements.first().map(|j| j.id);
            }
        }
        self.persist().await
    }

    pub async fn set_active(&self, id: Uuid) -> Result<JobRequirement, AppError> {
        let job = {
            let mut state = self.state.lock().unwrap();
            let job = state
                .requirements
                .iter()
                .find(|j| j.id == id)
                .cloned()
                .ok_or_else(|| AppError::NotFound(format!("job requirement {id}")))?;
            state.active_id = Some(id);
            job
        };
        self.persist().await?;
        Ok(job)
    }

    async fn persist(&self) -> Result<(), AppError> {
        let snapshot = {
            let state = self.state.lock().unwrap();
            JobSnapshot {
                requirements: state.requirements.clone(),
                active_id: state.active_id,
            }
        };
        self.storage.save_jobs(&snapshot).await
    }
}
