pub mod error;
pub mod project;
pub mod record;
pub mod sql;
pub mod transform;

// Convenient re-exports to simplify imports elsewhere
pub use error::DomainError;
