//! Single-line text fitting: shrink-to-fit font sizing and ellipsis truncation.

/// Appended to truncated names.
pub const ELLIPSIS: &str = "...";

/// Font size for text measured at `base` so that it fits `available`.
///
/// Text that already fits keeps `base`. Otherwise the size scales down proportionally, rounds
/// down to a whole pixel and never goes below `floor`.
pub fn shrink_to_fit(measured: f64, base: f64, available: f64, floor: f64) -> f64 {
    if measured > available && measured > 0.0 {
        (base * available / measured).floor().max(floor)
    } else {
        base
    }
}

/// Drop trailing characters until `text + "..."` fits `max_width`.
///
/// Returns `text` unchanged when it already fits. The result is `"..."` alone when no prefix
/// fits.
pub fn truncate_with_ellipsis(
    text: &str,
    max_width: f64,
    mut measure: impl FnMut(&str) -> f64,
) -> String {
    if measure(text) <= max_width {
        return text.to_string();
    }
    let mut truncated = text.to_string();
    let mut candidate = String::new();
    while !truncated.is_empty() {
        truncated.pop();
        candidate.clear();
        candidate.push_str(&truncated);
        candidate.push_str(ELLIPSIS);
        if measure(&candidate) <= max_width {
            break;
        }
    }
    truncated.push_str(ELLIPSIS);
    truncated
}

#[cfg(test)]
#[path = "../../tests/unit/render/text_fit.rs"]
mod tests;
