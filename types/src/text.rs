//! Small pure text helpers.

/// Truncate a string to a maximum length, adding `...` if needed.
///
/// - Trims surrounding whitespace before truncating.
/// - Uses `char` count (not bytes) to avoid splitting Unicode scalar values.
/// - Enforces a minimum `max` of 3 so the ellipsis fits.
#[must_use]
pub fn truncate_with_ellipsis(raw: &str, max: usize) -> String {
    let max = max.max(3);
    let trimmed = raw.trim();
    if trimmed.chars().count() <= max {
        return trimmed.to_string();
    }
    let head: String = trimmed.chars().take(max - 3).collect();
    format!("{head}...")
}

/// First line of `raw`, trimmed. Used as a heading preview.
#[must_use]
pub fn first_line(raw: &str) -> &str {
    raw.trim_start()
        .split_once('\n')
        .map_or(raw.trim(), |(head, _)| head.trim())
}
