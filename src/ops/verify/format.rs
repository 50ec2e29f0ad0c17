//! Output formatting for link reports (human/JSON).

use super::types::LinkReport;

/// Informational lines for a report, one message per line.
///
/// Missing modules are not listed here; they surface as the verification
/// error.
pub fn format_human(report: &LinkReport) -> Vec<String> {
    let names: Vec<&str> = report.expected.iter().map(|m| m.name.as_str()).collect();
    let mut lines = vec![format!(
        "Expecting {} module(s): {}",
        names.len(),
        if names.is_empty() {
            "none".to_string()
        } else {
            names.join(", ")
        }
    )];

    lines.push(format!(
        "{}/{} libraries linked as optional modules, producing {} registration entries",
        report.confirmed.len(),
        report.requested,
        report.registered_count
    ));

    lines
}

/// Soft cross-check of the registration table against the linked modules.
///
/// The marker can appear once per table entry, so more entries than modules
/// is fine; fewer is worth a warning but never fatal.
pub fn registration_warning(report: &LinkReport) -> Option<String> {
    (report.registered_count < report.confirmed.len()).then(|| {
        format!(
            "only {} registration entries for {} linked modules",
            report.registered_count,
            report.confirmed.len()
        )
    })
}

/// Machine-readable report event.
pub fn format_json(report: &LinkReport) -> serde_json::Value {
    serde_json::json!({
        "reason": "link-verified",
        "passed": report.passed(),
        "report": report,
    })
}
