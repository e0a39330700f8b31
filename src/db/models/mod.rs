pub mod dates;
mod grooming;
mod trainer;

pub use grooming::*;
pub use trainer::*;
