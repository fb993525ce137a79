pub mod models;
pub mod services;
pub mod catalog;
pub mod validation;
pub mod errors;

pub use models::*;
pub use services::*;
pub use catalog::*;
pub use validation::*;
pub use errors::*;
