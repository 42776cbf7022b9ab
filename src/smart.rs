//! SMART App Launch simulation for the Finnish healthcare context.
//!
//! Returns the launch context a real EHR would hand to an app during a SMART
//! App Launch flow. The practitioner is derived from the launching
//! organisation through a fixed table; no real identity protocol is involved.

use axum::Json;
use axum::extract::Query;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// SMART launch context response.
#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct SmartContext {
    #[serde(rename = "patientId")]
    pub patient_id: String,

    pub organization: String,

    #[serde(rename = "practitionerId")]
    #[schema(value_type = String, example = "prac-001")]
    pub practitioner_id: &'static str,

    #[serde(rename = "launchType")]
    #[schema(value_type = String, example = "provider-ehr")]
    pub launch_type: &'static str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LaunchParams {
    /// Patient bundle key (e.g. `eps-001`).
    pub patient: String,
    /// Organisation identifier (e.g. `OYS`).
    pub org: String,
}

/// Fallback practitioner for organisations outside the table.
const DEFAULT_PRACTITIONER: &str = "prac-001";

/// Static organisation → practitioner table. The second name in each arm is
/// the legacy form of the same organisation.
fn practitioner_for_org(org: &str) -> &'static str {
    match org {
        "OYS" | "OuluHVA" => "prac-001",
        "HUS" | "HelsinkiHUS" => "prac-002",
        "TAYS" | "TampereTAYS" => "prac-003",
        _ => DEFAULT_PRACTITIONER,
    }
}

#[utoipa::path(
    get,
    path = "/smart/launch",
    params(
        ("patient" = String, Query, description = "Patient bundle key (e.g. eps-001)"),
        ("org" = String, Query, description = "Organisation identifier (e.g. OYS)")
    ),
    responses(
        (status = 200, description = "Simulated launch context", body = SmartContext),
        (status = 400, description = "Missing patient or org parameter")
    )
)]
/// Simulate a SMART App Launch and return its context.
pub(crate) async fn smart_launch(Query(params): Query<LaunchParams>) -> Json<SmartContext> {
    let practitioner_id = practitioner_for_org(&params.org);
    Json(SmartContext {
        patient_id: params.patient,
        organization: params.org,
        practitioner_id,
        launch_type: "provider-ehr",
    })
}
