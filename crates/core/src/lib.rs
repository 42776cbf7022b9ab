//! # EPS Core
//!
//! Core business logic for the EPS Bundle API.
//!
//! This crate contains pure data operations over on-disk bundle documents:
//! - Bundle loading with mtime-invalidated caching
//! - Known-patient enumeration from the data directory
//! - Patient directory summaries for the listing endpoint
//!
//! **No API concerns**: HTTP routing, status codes and response shapes belong
//! in the `eps-run` binary.

pub mod config;
pub mod directory;
pub mod error;
pub mod store;

pub use config::CoreConfig;
pub use directory::{list_patients, PatientSummary};
pub use error::{CoreError, CoreResult};
pub use store::BundleStore;
