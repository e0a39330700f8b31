pub mod handlers;
pub mod routes;
mod service;

pub use service::GroomingService;
