//! FHIR wire/boundary support for the EPS Bundle API.
//!
//! This crate provides **wire models** and **extraction helpers** for the
//! HL7 European Patient Summary (EPS) Bundle format, where all resources for
//! one patient live in a single aggregate Bundle document:
//! - Bundle/entry deserialisation (resources stay as raw JSON values)
//! - typed sub-resource extraction with owner-reference filtering
//! - patient identity resolution within a Bundle
//! - searchset response wrapper for query endpoints
//!
//! Resources are deliberately NOT modelled as strict structs: the API serves
//! them verbatim, so this crate only reads the handful of fields it needs
//! (`resourceType`, `id`, `identifier`, `subject`/`patient`, `name`).

pub mod bundle;
pub mod patient;

pub use bundle::{Bundle, BundleEntry, SearchSet};
pub use patient::{display_name, preferred_identifier};

/// Filename/key prefix for EPS bundle documents (`eps-001.json` → key `eps-001`).
///
/// Also drives the patient-resolution fallback: a key carrying this prefix is
/// allowed to match the first Patient resource in a Bundle even when the
/// resource `id` disagrees with the filename.
pub const BUNDLE_KEY_PREFIX: &str = "eps-";
