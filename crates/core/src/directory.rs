//! Patient directory listing.
//!
//! Resolves every known bundle key to a display summary for the `/patients`
//! endpoint. A failure for one patient must not abort the listing: that
//! patient degrades to placeholder values and the rest are returned intact.

use serde::Serialize;
use utoipa::ToSchema;

use crate::error::CoreResult;
use crate::store::BundleStore;

/// Directory entry for one known patient.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct PatientSummary {
    /// Bundle key (e.g. `eps-001`).
    pub id: String,
    /// Joined given+family display name, or `"Unknown"`.
    pub name: String,
    /// Preferred identifier: Finnish national ID when present, else the
    /// first identifier, else the bundle key itself.
    pub identifier: String,
}

/// Resolve summaries for all known patients, in key order.
pub fn list_patients(store: &BundleStore) -> Vec<PatientSummary> {
    store
        .available_patients()
        .into_iter()
        .map(|patient_id| match summarise(store, &patient_id) {
            Ok(summary) => summary,
            Err(err) => {
                tracing::warn!("failed to resolve patient {patient_id}: {err}");
                placeholder(patient_id)
            }
        })
        .collect()
}

fn summarise(store: &BundleStore, patient_id: &str) -> CoreResult<PatientSummary> {
    let bundle = store.load(patient_id)?;

    let Some(patient) = bundle.find_patient(patient_id) else {
        return Ok(placeholder(patient_id.to_string()));
    };

    Ok(PatientSummary {
        id: patient_id.to_string(),
        name: fhir::display_name(patient),
        identifier: fhir::preferred_identifier(patient)
            .map(str::to_string)
            .unwrap_or_else(|| patient_id.to_string()),
    })
}

fn placeholder(patient_id: String) -> PatientSummary {
    PatientSummary {
        name: "Unknown".to_string(),
        identifier: patient_id.clone(),
        id: patient_id,
    }
}
