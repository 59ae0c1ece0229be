// crates/clipdeck-core/src/geometry.rs
//
// Thumbnail sizing.

/// Fit a `src_w × src_h` frame into a `box_w × box_h` request.
///
/// The longer source side is scaled to exactly `max(box_w, box_h)`; the other
/// side follows the source aspect ratio, rounded, never below 1.
///
/// ```
/// use clipdeck_core::geometry::fit_box;
/// assert_eq!(fit_box(1920, 1080, 100, 100), (100, 56));
/// assert_eq!(fit_box(1080, 1920, 100, 100), (56, 100));
/// assert_eq!(fit_box(640, 640, 100, 50),    (100, 100));
/// ```
pub fn fit_box(src_w: u32, src_h: u32, box_w: u32, box_h: u32) -> (u32, u32) {
    let target = box_w.max(box_h).max(1);
    if src_w == 0 || src_h == 0 {
        return (target, target);
    }
    if src_w >= src_h {
        let h = (target as f64 * src_h as f64 / src_w as f64).round() as u32;
        (target, h.max(1))
    } else {
        let w = (target as f64 * src_w as f64 / src_h as f64).round() as u32;
        (w.max(1), target)
    }
}
