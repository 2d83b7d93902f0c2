//! Pure calculation functions for crop and resize dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Check whether a natural aspect ratio is within `tolerance` (relative)
/// of the target ratio.
///
/// Hero sources shot at the target ratio skip the crop entirely — a 1%
/// tolerance absorbs the rounding that camera crops and prior exports
/// introduce.
pub fn aspect_within_tolerance(natural: (u32, u32), target: (u32, u32), tolerance: f64) -> bool {
    let (nw, nh) = natural;
    let (tw, th) = target;
    if nh == 0 || th == 0 {
        return false;
    }
    let natural_ratio = nw as f64 / nh as f64;
    let target_ratio = tw as f64 / th as f64;
    ((natural_ratio - target_ratio) / target_ratio).abs() <= tolerance
}

/// Crop dimensions for a requested width at a fixed aspect ratio.
///
/// ```
/// # use imagerie::imaging::calculations::crop_dimensions;
/// // 16:9 hero at 1920 → 1920x1080
/// assert_eq!(crop_dimensions(1920, (16, 9)), (1920, 1080));
/// // 4:3 horizontal at 800 → 800x600
/// assert_eq!(crop_dimensions(800, (4, 3)), (800, 600));
/// ```
pub fn crop_dimensions(width: u32, aspect: (u32, u32)) -> (u32, u32) {
    let (aw, ah) = aspect;
    if aw == 0 {
        return (width, 0);
    }
    let height = (width as f64 * ah as f64 / aw as f64).round() as u32;
    (width, height)
}

/// Proportional fit-inside dimensions for a requested width, never
/// upscaling past the natural size.
pub fn fit_width(natural: (u32, u32), width: u32) -> (u32, u32) {
    let (nw, nh) = natural;
    if width >= nw || nw == 0 {
        return (nw, nh);
    }
    let ratio = width as f64 / nw as f64;
    (width, (nh as f64 * ratio).round() as u32)
}

/// Dimensions needed to completely cover a target area (resize before
/// crop), preserving the source aspect ratio. One dimension matches the
/// target exactly, the other meets or exceeds it.
pub fn fill_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;
    if src_h == 0 || tgt_h == 0 {
        return target;
    }

    let src_aspect = src_w as f64 / src_h as f64;
    let tgt_aspect = tgt_w as f64 / tgt_h as f64;

    if src_aspect > tgt_aspect {
        // Source is wider: height matches, width exceeds.
        let h = tgt_h;
        let w = (h as f64 * src_aspect).round() as u32;
        (w.max(tgt_w), h)
    } else {
        // Source is taller: width matches, height exceeds.
        let w = tgt_w;
        let h = (w as f64 / src_aspect).round() as u32;
        (w, h.max(tgt_h))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // aspect_within_tolerance
    // =========================================================================

    #[test]
    fn exact_ratio_is_within_tolerance() {
        assert!(aspect_within_tolerance((1920, 1080), (16, 9), 0.01));
    }

    #[test]
    fn near_ratio_is_within_one_percent() {
        // 1928x1080 is ~0.4% off 16:9.
        assert!(aspect_within_tolerance((1928, 1080), (16, 9), 0.01));
    }

    #[test]
    fn four_three_is_not_sixteen_nine() {
        assert!(!aspect_within_tolerance((800, 600), (16, 9), 0.01));
    }

    #[test]
    fn degenerate_height_is_never_within_tolerance() {
        assert!(!aspect_within_tolerance((1920, 0), (16, 9), 0.01));
    }

    // =========================================================================
    // crop_dimensions
    // =========================================================================

    #[test]
    fn hero_crop_at_all_registered_widths() {
        assert_eq!(crop_dimensions(768, (16, 9)), (768, 432));
        assert_eq!(crop_dimensions(1280, (16, 9)), (1280, 720));
        assert_eq!(crop_dimensions(1920, (16, 9)), (1920, 1080));
    }

    #[test]
    fn horizontal_crop_rounds_height() {
        // 150 * 3/4 = 112.5 → 113
        assert_eq!(crop_dimensions(150, (4, 3)), (150, 113));
    }

    #[test]
    fn square_crop() {
        assert_eq!(crop_dimensions(400, (1, 1)), (400, 400));
    }

    #[test]
    fn zero_aspect_width_yields_degenerate_height() {
        // Configuration bug; the caller surfaces this as an encoding failure.
        assert_eq!(crop_dimensions(400, (0, 1)), (400, 0));
    }

    // =========================================================================
    // fit_width
    // =========================================================================

    #[test]
    fn fit_downscales_proportionally() {
        assert_eq!(fit_width((2000, 1500), 400), (400, 300));
    }

    #[test]
    fn fit_never_upscales() {
        assert_eq!(fit_width((300, 200), 400), (300, 200));
    }

    #[test]
    fn fit_at_exact_natural_width_is_identity() {
        assert_eq!(fit_width((400, 300), 400), (400, 300));
    }

    #[test]
    fn fit_rounds_height() {
        // 1000x667 at 400 → height 266.8 → 267
        assert_eq!(fit_width((1000, 667), 400), (400, 267));
    }

    // =========================================================================
    // fill_dimensions
    // =========================================================================

    #[test]
    fn fill_wider_source_matches_height() {
        // 800x600 (4:3) covering 400x400 → 533x400
        assert_eq!(fill_dimensions((800, 600), (400, 400)), (533, 400));
    }

    #[test]
    fn fill_taller_source_matches_width() {
        // 600x800 (3:4) covering 400x300 → 400x533
        assert_eq!(fill_dimensions((600, 800), (400, 300)), (400, 533));
    }

    #[test]
    fn fill_same_aspect_is_exact() {
        assert_eq!(fill_dimensions((800, 600), (400, 300)), (400, 300));
    }

    #[test]
    fn fill_covers_small_sources_by_upscaling() {
        // Cover semantics: a 100x100 source still fills 400x300.
        assert_eq!(fill_dimensions((100, 100), (400, 300)), (400, 400));
    }

    #[test]
    fn fill_never_undershoots_target() {
        for source in [(123, 457), (1000, 10), (10, 1000), (333, 333)] {
            let (w, h) = fill_dimensions(source, (400, 300));
            assert!(w >= 400 && h >= 300, "{source:?} → ({w}, {h})");
        }
    }
}
