use std::sync::Arc;

use sqlx::PgPool;

use crate::db::memory::MemoryStore;
use crate::db::repositories::{PgGroomingRepository, PgTrainerRepository};
use crate::db::{GroomingStore, TrainerStore};
use crate::modules::graph::ReportAggregator;
use crate::modules::groomings::GroomingService;
use crate::modules::trainers::TrainerDirectory;

#[derive(Clone)]
pub struct AppState {
    pub trainers: TrainerDirectory,
    pub groomings: GroomingService,
    pub reports: ReportAggregator,
}

impl AppState {
    pub fn new(trainer_store: Arc<dyn TrainerStore>, grooming_store: Arc<dyn GroomingStore>) -> Self {
        let trainers = TrainerDirectory::new(trainer_store);
        let groomings = GroomingService::new(grooming_store.clone(), trainers.clone());
        let reports = ReportAggregator::new(grooming_store);
        Self {
            trainers,
            groomings,
            reports,
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self::new(
            Arc::new(PgTrainerRepository::new(pool.clone())),
            Arc::new(PgGroomingRepository::new(pool)),
        )
    }

    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::new(store.clone(), store)
    }
}
