use std::sync::Arc;

use sqlx::types::Uuid;
use tracing::{info, instrument};

use crate::db::{GroomingTaken, NewTrainer, Trainer, TrainerStore, UpdateTrainer};
use crate::error::{AppError, AppResult};

/// Trainer identity records and the name lookups sessions resolve through.
#[derive(Clone)]
pub struct TrainerDirectory {
    store: Arc<dyn TrainerStore>,
}

impl TrainerDirectory {
    pub fn new(store: Arc<dyn TrainerStore>) -> Self {
        Self { store }
    }

    /// Duplicate names are accepted; resolution by name then matches all of them.
    #[instrument(skip(self, new_trainer), fields(name = %new_trainer.name))]
    pub async fn create(&self, new_trainer: &NewTrainer) -> AppResult<Trainer> {
        let trainer = self.store.create_trainer(new_trainer).await?;
        info!(trainer_id = %trainer.id, "Trainer registered");
        Ok(trainer)
    }

    pub async fn list(&self) -> AppResult<Vec<Trainer>> {
        Ok(self.store.list_trainers().await?)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Trainer> {
        self.store
            .get_trainer_by_id(id)
            .await?
            .ok_or_else(trainer_not_found)
    }

    #[instrument(skip(self, update))]
    pub async fn update(&self, id: Uuid, update: &UpdateTrainer) -> AppResult<Trainer> {
        self.store
            .update_trainer(id, update)
            .await?
            .ok_or_else(trainer_not_found)
    }

    /// Sessions that still reference the trainer are left untouched.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> AppResult<Trainer> {
        let trainer = self
            .store
            .delete_trainer(id)
            .await?
            .ok_or_else(trainer_not_found)?;
        info!(trainer_id = %id, "Trainer deleted");
        Ok(trainer)
    }

    /// Every trainer whose name equals one of `names` exactly.
    pub async fn resolve_names(&self, names: &[String]) -> AppResult<Vec<Trainer>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.store.find_trainers_by_names(names).await?)
    }

    /// First trainer in the whole directory named exactly `name`.
    pub async fn first_named(&self, name: &str) -> AppResult<Option<Trainer>> {
        let trainers = self.store.find_trainers_by_names(&[name.to_string()]).await?;
        Ok(trainers.into_iter().next())
    }

    /// Trainers whose name contains `fragment`, ignoring case.
    pub async fn matching(&self, fragment: &str) -> AppResult<Vec<Trainer>> {
        Ok(self.store.find_trainers_by_name_fragment(fragment).await?)
    }

    pub async fn find_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Trainer>> {
        Ok(self.store.find_trainers_by_ids(ids).await?)
    }

    pub async fn record_grooming(&self, trainer_id: Uuid, entry: &GroomingTaken) -> AppResult<bool> {
        Ok(self.store.push_grooming_taken(trainer_id, entry).await?)
    }

    pub async fn forget_grooming(&self, trainer_ids: &[Uuid], grooming_id: Uuid) -> AppResult<u64> {
        Ok(self.store.pull_grooming_taken(trainer_ids, grooming_id).await?)
    }

    pub async fn ping(&self) -> AppResult<()> {
        Ok(self.store.ping().await?)
    }
}

fn trainer_not_found() -> AppError {
    AppError::NotFound("Trainer not found".to_string())
}
