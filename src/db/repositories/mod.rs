mod grooming_repository;
mod trainer_repository;

pub use grooming_repository::PgGroomingRepository;
pub use trainer_repository::PgTrainerRepository;
