//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → PoolConfig (validated, immutable)
//!     → captured by Pool::new for the pool's lifetime
//! ```
//!
//! # Design Decisions
//! - Config is immutable once a pool is built; the endpoint set never changes
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::PoolConfig;
pub use schema::PoolMode;
pub use schema::DialConfig;
pub use schema::HealthCheckConfig;
pub use schema::TransportConfig;
pub use validation::{validate_config, ValidationError};
