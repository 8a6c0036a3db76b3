/// Whether an element at `offset_top` (document coordinates) is close enough
/// to a viewport of `viewport_height` to start loading.
///
/// Only distance from below is checked; an element scrolled past the top still
/// counts as visible, and the answer never flips back once the page scrolls on.
pub fn is_within_threshold(offset_top: f64, viewport_height: f64, threshold: f64) -> bool {
    offset_top <= viewport_height + threshold
}
