//! In-process store used by tests and `STORAGE_BACKEND=memory`.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::types::Uuid;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::error::DbResult;
use super::models::{
    Grooming, GroomingTaken, NewGrooming, NewTrainer, Trainer, UpdateTrainer,
};
use super::store::{GroomingFilter, GroomingStore, TrainerStore};

#[derive(Debug, Default)]
struct Collections {
    trainers: Vec<Trainer>,
    groomings: Vec<Grooming>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Collections>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TrainerStore for MemoryStore {
    async fn create_trainer(&self, new_trainer: &NewTrainer) -> DbResult<Trainer> {
        let now = OffsetDateTime::now_utc();
        let trainer = Trainer {
            id: Uuid::new_v4(),
            name: new_trainer.name.clone(),
            subject: new_trainer.subject.clone(),
            grooming_taken: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.inner.write().await.trainers.push(trainer.clone());
        Ok(trainer)
    }

    async fn get_trainer_by_id(&self, id: Uuid) -> DbResult<Option<Trainer>> {
        let inner = self.inner.read().await;
        Ok(inner.trainers.iter().find(|t| t.id == id).cloned())
    }

    async fn list_trainers(&self) -> DbResult<Vec<Trainer>> {
        Ok(self.inner.read().await.trainers.clone())
    }

    async fn find_trainers_by_ids(&self, ids: &[Uuid]) -> DbResult<Vec<Trainer>> {
        let inner = self.inner.read().await;
        Ok(inner
            .trainers
            .iter()
            .filter(|t| ids.contains(&t.id))
            .cloned()
            .collect())
    }

    async fn find_trainers_by_names(&self, names: &[String]) -> DbResult<Vec<Trainer>> {
        let inner = self.inner.read().await;
        Ok(inner
            .trainers
            .iter()
            .filter(|t| names.contains(&t.name))
            .cloned()
            .collect())
    }

    async fn find_trainers_by_name_fragment(&self, fragment: &str) -> DbResult<Vec<Trainer>> {
        let needle = fragment.to_lowercase();
        let inner = self.inner.read().await;
        Ok(inner
            .trainers
            .iter()
            .filter(|t| t.name.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn update_trainer(&self, id: Uuid, update: &UpdateTrainer) -> DbResult<Option<Trainer>> {
        let mut inner = self.inner.write().await;
        let Some(trainer) = inner.trainers.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        if let Some(name) = &update.name {
            trainer.name = name.clone();
        }
        if let Some(subject) = &update.subject {
            trainer.subject = subject.clone();
        }
        trainer.updated_at = OffsetDateTime::now_utc();
        Ok(Some(trainer.clone()))
    }

    async fn delete_trainer(&self, id: Uuid) -> DbResult<Option<Trainer>> {
        let mut inner = self.inner.write().await;
        let position = inner.trainers.iter().position(|t| t.id == id);
        Ok(position.map(|index| inner.trainers.remove(index)))
    }

    async fn push_grooming_taken(&self, trainer_id: Uuid, entry: &GroomingTaken) -> DbResult<bool> {
        let mut inner = self.inner.write().await;
        match inner.trainers.iter_mut().find(|t| t.id == trainer_id) {
            Some(trainer) if !trainer.has_taken(entry.grooming_id) => {
                trainer.grooming_taken.push(entry.clone());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn pull_grooming_taken(&self, trainer_ids: &[Uuid], grooming_id: Uuid) -> DbResult<u64> {
        let mut inner = self.inner.write().await;
        let mut removed = 0;
        for trainer in inner
            .trainers
            .iter_mut()
            .filter(|t| trainer_ids.contains(&t.id))
        {
            let before = trainer.grooming_taken.len();
            trainer
                .grooming_taken
                .retain(|entry| entry.grooming_id != grooming_id);
            removed += (before - trainer.grooming_taken.len()) as u64;
        }
        Ok(removed)
    }

    async fn ping(&self) -> DbResult<()> {
        Ok(())
    }
}

#[async_trait]
impl GroomingStore for MemoryStore {
    async fn create_grooming(&self, new_grooming: &NewGrooming) -> DbResult<Grooming> {
        let now = OffsetDateTime::now_utc();
        let grooming = Grooming {
            id: Uuid::new_v4(),
            trainers: new_grooming.trainers.clone(),
            subject_trainer: new_grooming.subject_trainer,
            details: new_grooming.details.clone(),
            created_at: now,
            updated_at: now,
        };
        self.inner.write().await.groomings.push(grooming.clone());
        Ok(grooming)
    }

    async fn get_grooming_by_id(&self, id: Uuid) -> DbResult<Option<Grooming>> {
        let inner = self.inner.read().await;
        Ok(inner.groomings.iter().find(|g| g.id == id).cloned())
    }

    async fn find_groomings(&self, filter: &GroomingFilter) -> DbResult<Vec<Grooming>> {
        let inner = self.inner.read().await;
        Ok(inner
            .groomings
            .iter()
            .filter(|g| filter.matches(g))
            .cloned()
            .collect())
    }

    async fn replace_grooming(&self, id: Uuid, record: &NewGrooming) -> DbResult<Option<Grooming>> {
        let mut inner = self.inner.write().await;
        let Some(grooming) = inner.groomings.iter_mut().find(|g| g.id == id) else {
            return Ok(None);
        };
        grooming.trainers = record.trainers.clone();
        grooming.subject_trainer = record.subject_trainer;
        grooming.details = record.details.clone();
        grooming.updated_at = OffsetDateTime::now_utc();
        Ok(Some(grooming.clone()))
    }

    async fn delete_grooming(&self, id: Uuid) -> DbResult<Option<Grooming>> {
        let mut inner = self.inner.write().await;
        let position = inner.groomings.iter().position(|g| g.id == id);
        Ok(position.map(|index| inner.groomings.remove(index)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(grooming_id: Uuid) -> GroomingTaken {
        GroomingTaken {
            grooming_id,
            month: Some("October 2025".to_string()),
            company_name: Some("Acme".to_string()),
            subject: None,
            deal_name: Some("Deal1".to_string()),
        }
    }

    async fn trainer(store: &MemoryStore, name: &str) -> Trainer {
        store
            .create_trainer(&NewTrainer {
                name: name.to_string(),
                subject: "Java".to_string(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn push_is_idempotent_per_grooming() {
        let store = MemoryStore::new();
        let alice = trainer(&store, "Alice").await;
        let grooming_id = Uuid::new_v4();

        assert!(store.push_grooming_taken(alice.id, &entry(grooming_id)).await.unwrap());
        assert!(!store.push_grooming_taken(alice.id, &entry(grooming_id)).await.unwrap());

        let alice = store.get_trainer_by_id(alice.id).await.unwrap().unwrap();
        assert_eq!(alice.grooming_taken.len(), 1);
    }

    #[tokio::test]
    async fn push_to_missing_trainer_is_a_no_op() {
        let store = MemoryStore::new();
        let appended = store
            .push_grooming_taken(Uuid::new_v4(), &entry(Uuid::new_v4()))
            .await
            .unwrap();
        assert!(!appended);
    }

    #[tokio::test]
    async fn pull_only_touches_listed_trainers() {
        let store = MemoryStore::new();
        let alice = trainer(&store, "Alice").await;
        let bob = trainer(&store, "Bob").await;
        let grooming_id = Uuid::new_v4();
        store.push_grooming_taken(alice.id, &entry(grooming_id)).await.unwrap();
        store.push_grooming_taken(bob.id, &entry(grooming_id)).await.unwrap();

        let removed = store.pull_grooming_taken(&[alice.id], grooming_id).await.unwrap();
        assert_eq!(removed, 1);

        let bob = store.get_trainer_by_id(bob.id).await.unwrap().unwrap();
        assert!(bob.has_taken(grooming_id));
    }

    #[tokio::test]
    async fn name_lookups() {
        let store = MemoryStore::new();
        trainer(&store, "Alice").await;
        trainer(&store, "alicia").await;
        trainer(&store, "Bob").await;

        let exact = store
            .find_trainers_by_names(&["Alice".to_string()])
            .await
            .unwrap();
        assert_eq!(exact.len(), 1);

        let fragment = store.find_trainers_by_name_fragment("ALI").await.unwrap();
        let names: Vec<_> = fragment.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["Alice", "alicia"]);
    }
}
