//! Canny edge detection on 8-bit luma images.
//!
//! - 3x3 Sobel gradients with replicated borders, L1 magnitude `|gx| + |gy|`.
//! - Non-maximum suppression along the gradient direction quantized to four
//!   bins (0°, 45°, 90°, 135°). On plateaus the first pixel along the
//!   direction wins, so a clean step yields a single-pixel edge.
//! - Hysteresis: pixels above `high` seed edges that grow through
//!   8-connected pixels above `low`.
//!
//! The outermost 1-pixel frame never carries edges.
use image::{GrayImage, Luma};

type Kernel3 = [[f32; 3]; 3];

const SOBEL_KERNEL_X: Kernel3 = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
const SOBEL_KERNEL_Y: Kernel3 = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];

const TAN_22_5_DEG: f32 = 0.414_213_56;
const TAN_67_5_DEG: f32 = 2.414_213_6;

/// Per-pixel Sobel derivatives and L1 magnitude, row-major.
#[derive(Clone, Debug)]
pub struct Gradients {
    pub width: usize,
    pub height: usize,
    pub gx: Vec<f32>,
    pub gy: Vec<f32>,
    pub mag: Vec<f32>,
}

pub fn sobel_gradients(gray: &GrayImage) -> Gradients {
    let w = gray.width() as usize;
    let h = gray.height() as usize;
    let mut gx = vec![0.0f32; w * h];
    let mut gy = vec![0.0f32; w * h];
    let mut mag = vec![0.0f32; w * h];

    if w == 0 || h == 0 {
        return Gradients {
            width: w,
            height: h,
            gx,
            gy,
            mag,
        };
    }

    let data = gray.as_raw();
    for y in 0..h {
        let y_idx = [y.saturating_sub(1), y, (y + 1).min(h - 1)];
        for x in 0..w {
            let x_idx = [x.saturating_sub(1), x, (x + 1).min(w - 1)];

            let mut sum_x = 0.0;
            let mut sum_y = 0.0;
            for (ky, &yy) in y_idx.iter().enumerate() {
                let row = &data[yy * w..(yy + 1) * w];
                for (kx, &xx) in x_idx.iter().enumerate() {
                    let v = row[xx] as f32;
                    sum_x += v * SOBEL_KERNEL_X[ky][kx];
                    sum_y += v * SOBEL_KERNEL_Y[ky][kx];
                }
            }

            let idx = y * w + x;
            gx[idx] = sum_x;
            gy[idx] = sum_y;
            mag[idx] = sum_x.abs() + sum_y.abs();
        }
    }

    Gradients {
        width: w,
        height: h,
        gx,
        gy,
        mag,
    }
}

/// Keep only local maxima along the gradient direction above `low`.
fn non_maximum_suppression(grad: &Gradients, low: f32) -> Vec<bool> {
    let w = grad.width;
    let h = grad.height;
    let mut keep = vec![false; w * h];
    if w < 3 || h < 3 {
        return keep;
    }

    for y in 1..h - 1 {
        let mag_prev = &grad.mag[(y - 1) * w..y * w];
        let mag_row = &grad.mag[y * w..(y + 1) * w];
        let mag_next = &grad.mag[(y + 1) * w..(y + 2) * w];

        for x in 1..w - 1 {
            let m = mag_row[x];
            if m <= low {
                continue;
            }

            let gx = grad.gx[y * w + x];
            let gy = grad.gy[y * w + x];
            let abs_gx = gx.abs();
            let abs_gy = gy.abs();

            let is_max = if abs_gy <= abs_gx * TAN_22_5_DEG {
                m > mag_row[x - 1] && m >= mag_row[x + 1]
            } else if abs_gy > abs_gx * TAN_67_5_DEG {
                m > mag_prev[x] && m >= mag_next[x]
            } else if (gx < 0.0) != (gy < 0.0) {
                m > mag_prev[x + 1] && m > mag_next[x - 1]
            } else {
                m > mag_prev[x - 1] && m > mag_next[x + 1]
            };

            keep[y * w + x] = is_max;
        }
    }

    keep
}

/// Binary edge map (0/255) with hysteresis thresholds `low` < `high`.
pub fn canny(gray: &GrayImage, low: f32, high: f32) -> GrayImage {
    let _span = tracing::debug_span!("canny").entered();

    let grad = sobel_gradients(gray);
    let (w, h) = (grad.width, grad.height);
    let candidates = non_maximum_suppression(&grad, low);

    let mut edges = vec![false; w * h];
    let mut stack: Vec<usize> = (0..w * h)
        .filter(|&i| candidates[i] && grad.mag[i] > high)
        .collect();
    for &i in &stack {
        edges[i] = true;
    }

    while let Some(i) = stack.pop() {
        let (x, y) = (i % w, i / w);
        for yy in y.saturating_sub(1)..=(y + 1).min(h - 1) {
            for xx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
                let j = yy * w + xx;
                if candidates[j] && !edges[j] {
                    edges[j] = true;
                    stack.push(j);
                }
            }
        }
    }

    GrayImage::from_fn(w as u32, h as u32, |x, y| {
        Luma([if edges[y as usize * w + x as usize] { 255 } else { 0 }])
    })
}
