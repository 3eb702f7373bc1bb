//! Declarative configuration for the cabin arbitration engine.
//!
//! Zones, screen areas and application descriptors are described in a
//! TOML document, validated against the engine's structural limits,
//! and installed into a [`ResourceManager`](cabin_core::ResourceManager)
//! in one call.
//!
//! # Example
//!
//! ```rust
//! use cabin_config::SystemConfig;
//! use cabin_core::ResourceManager;
//!
//! let config = SystemConfig::from_toml(
//!     r#"
//!     [[zones]]
//!     name = "driver"
//!
//!     [[areas]]
//!     id = 0
//!     name = "full"
//!     output = 0
//!     output_name = "center"
//!     zone = "driver"
//!     width = 1920
//!     height = 1080
//!     "#,
//! )
//! .unwrap();
//!
//! let mut mgr = ResourceManager::new();
//! config.apply(&mut mgr).unwrap();
//! assert_eq!(mgr.zones().len(), 1);
//! ```

pub mod error;
pub mod system;
pub mod validation;

pub use error::ConfigError;
pub use system::{ApplicationConfig, AreaConfig, SystemConfig, WindowConfig, ZoneConfig};
pub use validation::ValidationError;
