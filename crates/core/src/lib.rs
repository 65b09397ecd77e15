pub mod config;
pub mod error;
pub mod expiry;
pub mod filters;
pub mod slots;
pub mod types;
pub mod validation;

pub use config::AppConfig;
pub use error::{FieldError, ResellerError, ResellerResult, ValidationErrors};
