pub mod error;
pub mod types;

pub use error::ServiceError;
pub use types::{machine_name, now_rfc3339};
