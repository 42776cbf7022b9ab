//! Patient summary helpers.
//!
//! Reads display fields out of a raw Patient resource for the directory
//! listing: a joined human name and a preferred identifier.

use serde_json::Value;

/// OID marker for Finnish national person identifiers (henkilötunnus).
///
/// An identifier whose `system` contains this marker is preferred when
/// summarising a patient.
pub const FINNISH_SSN_OID: &str = "1.2.246.21";

/// Join the first name entry's given names and family name for display.
///
/// Returns `"Unknown"` when the Patient carries no usable name parts.
pub fn display_name(patient: &Value) -> String {
    let name = patient
        .get("name")
        .and_then(Value::as_array)
        .and_then(|names| names.first());

    let given: Vec<&str> = name
        .and_then(|n| n.get("given"))
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .collect();
    let family = name
        .and_then(|n| n.get("family"))
        .and_then(Value::as_str)
        .unwrap_or("");

    if given.is_empty() && family.is_empty() {
        return "Unknown".to_string();
    }

    format!("{} {}", given.join(" "), family).trim().to_string()
}

/// Pick the identifier to show for a patient.
///
/// Prefers an identifier whose `system` contains the Finnish national-ID OID
/// marker; falls back to the first identifier in the list. Returns `None`
/// when the Patient has no identifier with a string value.
pub fn preferred_identifier(patient: &Value) -> Option<&str> {
    let identifiers = patient.get("identifier").and_then(Value::as_array)?;

    let national = identifiers
        .iter()
        .find(|identifier| {
            identifier
                .get("system")
                .and_then(Value::as_str)
                .is_some_and(|system| system.contains(FINNISH_SSN_OID))
        })
        .and_then(|identifier| identifier.get("value").and_then(Value::as_str));

    national.or_else(|| {
        identifiers
            .first()
            .and_then(|identifier| identifier.get("value").and_then(Value::as_str))
    })
}
