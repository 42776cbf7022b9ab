//! FHIR-style read endpoints over EPS bundles.
//!
//! Every endpoint resolves the patient's bundle through the shared
//! [`BundleStore`], then extracts from it; nothing here mutates state.
//!
//! [`BundleStore`]: eps_core::BundleStore

use axum::Json;
use axum::extract::{Path, Query, State};
use fhir::{BUNDLE_KEY_PREFIX, SearchSet};
use serde::Deserialize;
use serde_json::Value;

use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub(crate) struct SearchParams {
    /// Patient bundle key filter.
    patient: Option<String>,
}

#[utoipa::path(
    get,
    path = "/fhir/Patient/{patient_id}",
    params(("patient_id" = String, Path, description = "Patient bundle key (e.g. eps-001)")),
    responses(
        (status = 200, description = "The matched Patient resource", body = Object),
        (status = 404, description = "Unknown patient key or no Patient in the bundle")
    )
)]
/// Get a Patient resource by bundle key.
pub(crate) async fn get_patient(
    State(state): State<AppState>,
    Path(patient_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let bundle = state.store.load(&patient_id)?;
    let patient = bundle.find_patient(&patient_id).cloned().ok_or_else(|| {
        ApiError::NotFound(format!("Patient {patient_id} not found in Bundle"))
    })?;
    Ok(Json(patient))
}

/// Shared search flow for the clinical resource endpoints.
///
/// Requires the `patient` query parameter, resolves the patient's canonical
/// reference (falling back to the `urn:uuid:patient-<key>` convention when
/// the bundle yields none), and extracts matching resources.
fn search(
    state: &AppState,
    resource_type: &'static str,
    params: SearchParams,
) -> Result<Json<SearchSet>, ApiError> {
    let Some(patient_id) = params.patient else {
        return Err(ApiError::BadRequest(format!(
            "Patient parameter is required. Use ?patient={BUNDLE_KEY_PREFIX}001"
        )));
    };

    let bundle = state.store.load(&patient_id)?;
    let owner_ref = bundle
        .patient_reference(&patient_id)
        .map(str::to_string)
        .unwrap_or_else(|| format!("urn:uuid:patient-{patient_id}"));

    Ok(Json(SearchSet::new(
        bundle.extract(resource_type, Some(&owner_ref)),
    )))
}

#[utoipa::path(
    get,
    path = "/fhir/Condition",
    params(("patient" = Option<String>, Query, description = "Patient bundle key")),
    responses(
        (status = 200, description = "Searchset of Condition resources", body = SearchSet),
        (status = 400, description = "Missing patient parameter"),
        (status = 404, description = "Unknown patient key")
    )
)]
/// Get Condition resources (problems/diagnoses) for a patient.
pub(crate) async fn get_conditions(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchSet>, ApiError> {
    search(&state, "Condition", params)
}

#[utoipa::path(
    get,
    path = "/fhir/Immunization",
    params(("patient" = Option<String>, Query, description = "Patient bundle key")),
    responses(
        (status = 200, description = "Searchset of Immunization resources", body = SearchSet),
        (status = 400, description = "Missing patient parameter"),
        (status = 404, description = "Unknown patient key")
    )
)]
/// Get Immunization resources (vaccinations) for a patient.
pub(crate) async fn get_immunizations(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchSet>, ApiError> {
    search(&state, "Immunization", params)
}

#[utoipa::path(
    get,
    path = "/fhir/Procedure",
    params(("patient" = Option<String>, Query, description = "Patient bundle key")),
    responses(
        (status = 200, description = "Searchset of Procedure resources", body = SearchSet),
        (status = 400, description = "Missing patient parameter"),
        (status = 404, description = "Unknown patient key")
    )
)]
/// Get Procedure resources for a patient.
pub(crate) async fn get_procedures(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchSet>, ApiError> {
    search(&state, "Procedure", params)
}

#[utoipa::path(
    get,
    path = "/fhir/CarePlan",
    params(("patient" = Option<String>, Query, description = "Patient bundle key")),
    responses(
        (status = 200, description = "Searchset of CarePlan resources", body = SearchSet),
        (status = 400, description = "Missing patient parameter"),
        (status = 404, description = "Unknown patient key")
    )
)]
/// Get CarePlan resources for a patient.
pub(crate) async fn get_care_plans(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchSet>, ApiError> {
    search(&state, "CarePlan", params)
}

#[utoipa::path(
    get,
    path = "/fhir/Observation",
    params(("patient" = Option<String>, Query, description = "Patient bundle key")),
    responses(
        (status = 200, description = "Searchset of Observation resources", body = SearchSet),
        (status = 400, description = "Missing patient parameter"),
        (status = 404, description = "Unknown patient key")
    )
)]
/// Get Observation resources (vital signs, lab results) for a patient.
pub(crate) async fn get_observations(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchSet>, ApiError> {
    search(&state, "Observation", params)
}
