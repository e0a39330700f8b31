pub mod graph;
pub mod groomings;
pub mod trainers;
