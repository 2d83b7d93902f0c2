//! Content-aware crop anchor selection.
//!
//! After a cover resize, the filled image has slack along exactly one
//! axis. The anchor scorer slides a crop window along that axis and
//! picks the offset whose contents score highest, so crops keep the
//! subject instead of blindly centering.
//!
//! Two scoring modes are used by the transform pipeline:
//!
//! - [`AnchorMode::Attention`] sums gradient energy inside the window.
//!   Edges and texture concentrate where the subject is, which works
//!   well for wide crops (heroes, horizontals).
//! - [`AnchorMode::Entropy`] scores the Shannon entropy of a 64-bin
//!   luma histogram. Flat backgrounds score near zero, so square crops
//!   gravitate toward detailed regions.
//!
//! Scoring runs on a downscaled analysis copy (longest side capped at
//! 512px) so anchor selection stays cheap even for large sources. The
//! chosen offset is mapped back to full resolution and clamped.

use image::{DynamicImage, GrayImage};

/// Longest side of the analysis copy used for scoring.
const ANALYSIS_MAX_DIM: u32 = 512;

/// Number of candidate offsets evaluated along the slack axis.
const CANDIDATE_STEPS: u32 = 32;

/// Scoring strategy for crop anchor selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorMode {
    /// Gradient-energy sum. Favors edges and texture.
    Attention,
    /// Luma histogram entropy. Favors regions with varied tones.
    Entropy,
}

/// Pick the top-left corner for a `crop_w` x `crop_h` window inside
/// `filled`, which must already cover the crop on both axes.
///
/// Returns `(x, y)` in full-resolution coordinates, clamped so the
/// window stays in bounds. Falls back to a centered anchor when there
/// is no slack or the image degenerates.
pub fn crop_anchor(filled: &DynamicImage, crop_w: u32, crop_h: u32, mode: AnchorMode) -> (u32, u32) {
    let (full_w, full_h) = (filled.width(), filled.height());
    if full_w <= crop_w && full_h <= crop_h {
        return (0, 0);
    }

    let analysis = if full_w.max(full_h) > ANALYSIS_MAX_DIM {
        filled.thumbnail(ANALYSIS_MAX_DIM, ANALYSIS_MAX_DIM).to_luma8()
    } else {
        filled.to_luma8()
    };
    let (aw, ah) = analysis.dimensions();
    if aw == 0 || ah == 0 {
        return centered(full_w, full_h, crop_w, crop_h);
    }

    let scale_x = aw as f64 / full_w as f64;
    let scale_y = ah as f64 / full_h as f64;
    let win_w = ((crop_w as f64 * scale_x).round() as u32).clamp(1, aw);
    let win_h = ((crop_h as f64 * scale_y).round() as u32).clamp(1, ah);

    // Slack exists along at most one axis after a cover resize.
    let horizontal = aw.saturating_sub(win_w) >= ah.saturating_sub(win_h);
    let slack = if horizontal { aw - win_w } else { ah - win_h };
    if slack == 0 {
        return centered(full_w, full_h, crop_w, crop_h);
    }

    let scorer: Box<dyn Fn(&GrayImage, u32, u32, u32, u32) -> f64> = match mode {
        AnchorMode::Attention => {
            let integral = gradient_integral(&analysis);
            Box::new(move |_img, x, y, w, h| integral.window_sum(x, y, w, h))
        }
        AnchorMode::Entropy => Box::new(|img, x, y, w, h| window_entropy(img, x, y, w, h)),
    };

    let step = (slack / CANDIDATE_STEPS).max(1);
    let center_offset = slack / 2;
    let mut best_offset = center_offset;
    let mut best_score = f64::NEG_INFINITY;
    let mut offset = 0;
    loop {
        let (x, y) = if horizontal { (offset, 0) } else { (0, offset) };
        let score = scorer(&analysis, x, y, win_w, win_h);
        // Ties break toward center so uniform images stay centered.
        let better = score > best_score
            || (score == best_score
                && offset.abs_diff(center_offset) < best_offset.abs_diff(center_offset));
        if better {
            best_score = score;
            best_offset = offset;
        }
        if offset == slack {
            break;
        }
        offset = (offset + step).min(slack);
    }

    // Map the analysis offset back to full resolution and clamp.
    if horizontal {
        let x = (best_offset as f64 / scale_x).round() as u32;
        (x.min(full_w.saturating_sub(crop_w)), center_axis(full_h, crop_h))
    } else {
        let y = (best_offset as f64 / scale_y).round() as u32;
        (center_axis(full_w, crop_w), y.min(full_h.saturating_sub(crop_h)))
    }
}

fn centered(full_w: u32, full_h: u32, crop_w: u32, crop_h: u32) -> (u32, u32) {
    (center_axis(full_w, crop_w), center_axis(full_h, crop_h))
}

fn center_axis(full: u32, crop: u32) -> u32 {
    full.saturating_sub(crop) / 2
}

/// Summed-area table of per-pixel gradient magnitude, padded by one
/// row and column of zeros so window sums need no edge cases.
struct GradientIntegral {
    width: usize,
    table: Vec<f64>,
}

fn gradient_integral(img: &GrayImage) -> GradientIntegral {
    let (w, h) = (img.width() as usize, img.height() as usize);
    let stride = w + 1;
    let mut table = vec![0.0; stride * (h + 1)];
    for y in 0..h {
        let mut row_sum = 0.0;
        for x in 0..w {
            let here = img.get_pixel(x as u32, y as u32)[0] as f64;
            let right = if x + 1 < w {
                img.get_pixel(x as u32 + 1, y as u32)[0] as f64
            } else {
                here
            };
            let below = if y + 1 < h {
                img.get_pixel(x as u32, y as u32 + 1)[0] as f64
            } else {
                here
            };
            let energy = (right - here).abs() + (below - here).abs();
            row_sum += energy;
            table[(y + 1) * stride + x + 1] = table[y * stride + x + 1] + row_sum;
        }
    }
    GradientIntegral { width: stride, table }
}

impl GradientIntegral {
    fn window_sum(&self, x: u32, y: u32, w: u32, h: u32) -> f64 {
        let (x0, y0) = (x as usize, y as usize);
        let (x1, y1) = (x0 + w as usize, y0 + h as usize);
        let s = self.width;
        self.table[y1 * s + x1] - self.table[y0 * s + x1] - self.table[y1 * s + x0]
            + self.table[y0 * s + x0]
    }
}

/// Shannon entropy of a 64-bin luma histogram over the window.
fn window_entropy(img: &GrayImage, x: u32, y: u32, w: u32, h: u32) -> f64 {
    let mut bins = [0u32; 64];
    for yy in y..(y + h).min(img.height()) {
        for xx in x..(x + w).min(img.width()) {
            bins[(img.get_pixel(xx, yy)[0] >> 2) as usize] += 1;
        }
    }
    let total: u32 = bins.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    bins.iter()
        .filter(|&&count| count > 0)
        .map(|&count| {
            let p = count as f64 / total;
            -p * p.log2()
        })
        .sum()
}
