//! Media type comparison for allow-lists.

/// Normalize MIME type by stripping parameters and lowercasing
/// (e.g. "Image/JPEG; charset=utf-8" -> "image/jpeg").
pub fn normalize_media_type(media_type: &str) -> String {
    media_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(media_type)
        .to_ascii_lowercase()
}

/// Check a media type against an allow-list. An empty list admits everything and an
/// entry of the form `type/*` admits every subtype of `type`.
pub fn media_type_allowed(media_type: &str, allowed: &[String]) -> bool {
    if allowed.is_empty() {
        return true;
    }

    let normalized = normalize_media_type(media_type);
    allowed.iter().any(|entry| {
        let entry = normalize_media_type(entry);
        match entry.strip_suffix("/*") {
            Some(top_level) => normalized
                .split_once('/')
                .is_some_and(|(kind, _)| kind == top_level),
            None => entry == normalized,
        }
    })
}
