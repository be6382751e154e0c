//! # Transmission Protocol Configuration
//!
//! Centralized constants and runtime configuration for the transmission
//! protocol crates.
//!
//! ## Features
//!
//! - **Wire Limits**: upper bounds on length prefixes accepted by the codec
//! - **Type-Id Ranges**: identifier blocks reserved for each message family
//! - **Recording Configuration**: recorder, replay and logging settings loaded
//!   from TOML with environment overrides
//!
//! ## Usage
//!
//! ```rust
//! use config::protocol::{limits, type_ids};
//!
//! let max_string = limits::MAX_STRING_BYTES;
//! let resource_family = type_ids::RESOURCE_RANGE;
//! assert!(resource_family.contains(&30));
//! # let _ = max_string;
//! ```

pub mod protocol;
pub mod recording_config;

// Re-export commonly used types
pub use recording_config::{
    load_config, LoggingSettings, RecorderSettings, RecordingConfig, ReplaySettings,
};
