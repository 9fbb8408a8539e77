//! Provider preference resolution.
//!
//! Free-form labels ("flux-pro", "SDXL", "dall-e-3") collapse onto canonical
//! provider ids by case-insensitive substring match. Unrecognized labels pass
//! through trimmed, so the chain can report them as not configured.

use crate::types::ProviderId;

const FAL_MARKERS: &[&str] = &["flux", "fal"];
const STABILITY_MARKERS: &[&str] = &["stability", "stable", "sdxl", "sd3"];
const OPENAI_MARKERS: &[&str] = &["openai", "dall", "gpt-image"];

/// Map a preference label onto a provider id; `None` for blank input
pub fn resolve_preference(label: &str) -> Option<ProviderId> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        return None;
    }

    let lower = trimmed.to_lowercase();
    let matches = |markers: &[&str]| markers.iter().any(|m| lower.contains(m));

    let id = if matches(FAL_MARKERS) {
        ProviderId::fal()
    } else if matches(STABILITY_MARKERS) {
        ProviderId::stability()
    } else if matches(OPENAI_MARKERS) {
        ProviderId::openai()
    } else {
        ProviderId::new(trimmed)
    };
    Some(id)
}
