//! Patient feature vector and its input validation.

pub mod types;
pub mod validation;

pub use types::*;
pub use validation::validate_features;
