//! Pure calculation functions for batch width tapering.
//!
//! All functions here are pure and testable without any I/O or images.
//!
//! ## The taper
//!
//! A batch of `n` images is anchored at its midpoint, `floor(n / 2)`. That
//! item is resized to exactly the requested width. Every other item blends
//! between the requested width and its own original width, weighted by how
//! far it sits from the midpoint:
//!
//! ```text
//! index:      0     1     2     3     4
//! distance:   2     1     0     1     2        max_distance = 2
//! blend:     1.0   0.5   0.0   0.5   1.0
//! ```
//!
//! Both halves normalize against the *larger* half-span so an even-sized batch
//! (where the midpoint sits right of center) still reaches a blend of `1.0`
//! at its far left edge and stops short of it on the right.

/// Index of the batch item that always resolves to exactly the target width.
///
/// ```
/// # use taper::imaging::midpoint_index;
/// assert_eq!(midpoint_index(1), 0);
/// assert_eq!(midpoint_index(4), 2);
/// assert_eq!(midpoint_index(5), 2);
/// ```
pub fn midpoint_index(count: usize) -> usize {
    count / 2
}

/// The larger of the two half-batch spans around the midpoint.
pub fn max_distance(midpoint: usize, total: usize) -> usize {
    midpoint.max(total.saturating_sub(midpoint + 1))
}

/// Whether resolving `index` requires the item's original width.
///
/// The midpoint and the lone item of a single-item batch resolve to the
/// target width without looking at the source, so the pipeline can skip the
/// metadata read for them.
pub fn needs_original_width(index: usize, midpoint: usize, total: usize) -> bool {
    index != midpoint && max_distance(midpoint, total) != 0
}

/// Resolve the resize width for one batch item.
///
/// Linearly interpolates between `target` (at the midpoint) and `original`
/// (at the farthest edge), flooring the result:
///
/// ```text
/// resolved = floor(target + (distance / max_distance) * (original - target))
/// ```
///
/// The blend is evaluated with exact integer floor division, so the result
/// always lies between `target` and `original` inclusive. Never returns 0.
///
/// # Examples
/// ```
/// # use taper::imaging::resolve_width;
/// // Five items, midpoint 2, target 500.
/// assert_eq!(resolve_width(2, 2, 5, 500, 9999), 500);
/// assert_eq!(resolve_width(0, 2, 5, 500, 300), 300);
/// assert_eq!(resolve_width(1, 2, 5, 500, 300), 400);
/// assert_eq!(resolve_width(3, 2, 5, 500, 900), 700);
/// ```
pub fn resolve_width(index: usize, midpoint: usize, total: usize, target: u32, original: u32) -> u32 {
    if index == midpoint {
        return target.max(1);
    }
    let span = max_distance(midpoint, total);
    if span == 0 {
        return target.max(1);
    }

    let distance = midpoint.abs_diff(index) as i64;
    let delta = original as i64 - target as i64;
    let offset = (distance * delta).div_euclid(span as i64);

    (target as i64 + offset).clamp(1, u32::MAX as i64) as u32
}

/// Height that keeps the source aspect ratio at the given width.
///
/// Rounded to the nearest pixel, never below 1.
pub fn scaled_height(original: (u32, u32), width: u32) -> u32 {
    let (orig_w, orig_h) = original;
    if orig_w == 0 {
        return orig_h.max(1);
    }
    let h = (orig_h as f64 * width as f64 / orig_w as f64).round();
    (h as u32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Resolve every index of a batch given each item's original width.
    fn resolve_all(target: u32, originals: &[u32]) -> Vec<u32> {
        let total = originals.len();
        let mid = midpoint_index(total);
        originals
            .iter()
            .enumerate()
            .map(|(i, &w)| resolve_width(i, mid, total, target, w))
            .collect()
    }

    // =========================================================================
    // midpoint / span
    // =========================================================================

    #[test]
    fn midpoint_is_floor_half() {
        assert_eq!(midpoint_index(0), 0);
        assert_eq!(midpoint_index(1), 0);
        assert_eq!(midpoint_index(2), 1);
        assert_eq!(midpoint_index(3), 1);
        assert_eq!(midpoint_index(200), 100);
    }

    #[test]
    fn max_distance_uses_larger_half() {
        assert_eq!(max_distance(2, 5), 2);
        // even batch: midpoint 2 of 4 → left span 2, right span 1
        assert_eq!(max_distance(2, 4), 2);
        assert_eq!(max_distance(0, 1), 0);
        assert_eq!(max_distance(1, 2), 1);
    }

    #[test]
    fn identify_skipped_for_midpoint_and_single_item() {
        assert!(!needs_original_width(0, 0, 1));
        assert!(!needs_original_width(2, 2, 5));
        assert!(needs_original_width(0, 2, 5));
        assert!(!needs_original_width(1, 1, 2));
        assert!(needs_original_width(0, 1, 2));
    }

    // =========================================================================
    // resolve_width
    // =========================================================================

    #[test]
    fn midpoint_resolves_to_target_for_all_sizes() {
        for n in 1..=200 {
            let mid = midpoint_index(n);
            assert_eq!(resolve_width(mid, mid, n, 640, 12), 640, "n = {n}");
        }
    }

    #[test]
    fn single_item_ignores_original_width() {
        assert_eq!(resolve_width(0, 0, 1, 600, 4000), 600);
        assert_eq!(resolve_width(0, 0, 1, 600, 1), 600);
    }

    #[test]
    fn three_item_batch_reaches_originals_at_edges() {
        assert_eq!(resolve_all(600, &[400, 800, 1200]), vec![400, 600, 1200]);
    }

    #[test]
    fn five_item_batch_blends_halfway() {
        assert_eq!(
            resolve_all(500, &[300, 300, 300, 900, 900]),
            vec![300, 400, 500, 700, 900]
        );
    }

    #[test]
    fn even_batch_right_edge_stops_short() {
        // n = 4, midpoint 2, span 2: index 3 sits at distance 1 → half blend
        assert_eq!(resolve_all(1000, &[200, 200, 200, 200]), vec![200, 600, 1000, 600]);
    }

    #[test]
    fn floor_applies_to_negative_blend() {
        // 500 + 1/3 * (301 - 500) = 433.67 → 433
        assert_eq!(resolve_width(2, 3, 7, 500, 301), 433);
        // 500 + 1/3 * (700 - 500) = 566.67 → 566
        assert_eq!(resolve_width(4, 3, 7, 500, 700), 566);
    }

    #[test]
    fn never_overshoots_between_target_and_original() {
        for n in 2..=40usize {
            let mid = midpoint_index(n);
            for i in 0..n {
                for &orig in &[1u32, 7, 299, 500, 501, 1333, 6000] {
                    let w = resolve_width(i, mid, n, 500, orig);
                    let (lo, hi) = (orig.min(500), orig.max(500));
                    assert!(
                        (lo..=hi).contains(&w),
                        "n={n} i={i} orig={orig} → {w} outside {lo}..={hi}"
                    );
                }
            }
        }
    }

    #[test]
    fn resolve_is_deterministic() {
        let a = resolve_width(3, 10, 21, 777, 1234);
        let b = resolve_width(3, 10, 21, 777, 1234);
        assert_eq!(a, b);
    }

    #[test]
    fn resolve_never_returns_zero() {
        assert_eq!(resolve_width(0, 0, 1, 0, 0), 1);
        assert!(resolve_width(0, 1, 3, 1, 1) >= 1);
    }

    // =========================================================================
    // scaled_height
    // =========================================================================

    #[test]
    fn scaled_height_preserves_aspect() {
        assert_eq!(scaled_height((800, 600), 400), 300);
        assert_eq!(scaled_height((600, 800), 300), 400);
    }

    #[test]
    fn scaled_height_upscales() {
        assert_eq!(scaled_height((400, 300), 1200), 900);
    }

    #[test]
    fn scaled_height_rounds_and_clamps() {
        // 333 * 100 / 1000 = 33.3 → 33
        assert_eq!(scaled_height((1000, 333), 100), 33);
        // extreme panorama would round to 0
        assert_eq!(scaled_height((10_000, 1), 10), 1);
    }
}
