//! Resource identifier helpers
//!
//! ARM identifiers look like
//! `/subscriptions/{sub}/resourceGroups/{group}/providers/{ns}/{type}/{name}`.

use super::error::FleetError;

const RESOURCE_GROUPS_MARKER: &str = "resourceGroups";
const SUBSCRIPTIONS_MARKER: &str = "subscriptions";

/// Segment following `marker` in a slash-delimited identifier.
/// The marker is matched without regard to case, ARM is not consistent about it.
fn segment_after<'a>(id: &'a str, marker: &str) -> Option<&'a str> {
    let mut segments = id.split('/');
    while let Some(segment) = segments.next() {
        if segment.eq_ignore_ascii_case(marker) {
            return segments.next().filter(|s| !s.is_empty());
        }
    }
    None
}

/// Extract the resource group from a resource identifier
pub fn resource_group(id: &str) -> Result<String, FleetError> {
    segment_after(id, RESOURCE_GROUPS_MARKER)
        .map(str::to_string)
        .ok_or_else(|| FleetError::MalformedIdentifier(id.to_string()))
}

/// Extract the subscription id from a resource identifier
pub fn subscription_id(id: &str) -> Option<&str> {
    segment_after(id, SUBSCRIPTIONS_MARKER)
}

/// Last path segment, e.g. the VM name of a VM identifier
pub fn short_name(id: &str) -> &str {
    id.trim_end_matches('/').rsplit('/').next().unwrap_or(id)
}
