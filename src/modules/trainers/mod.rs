mod directory;
pub mod handlers;
pub mod routes;

pub use directory::TrainerDirectory;
