use image::{GrayImage, Luma, RgbImage};

/// 5-tap binomial kernel used for the 5x5 smoothing pass.
const BLUR_KERNEL: [f32; 5] = [0.0625, 0.25, 0.375, 0.25, 0.0625];

/// Preprocessor turning a raw frame into a binary belt mask.
///
/// Steps:
/// 1. Luma conversion
/// 2. 5x5 Gaussian smoothing
/// 3. Inverted adaptive threshold against a Gaussian-weighted local mean
/// 4. Morphological closing, then opening, with a square element
///
/// The mask has the same dimensions as the input and holds only 0 or 255.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    block_size: usize,
    offset: f32,
    kernel_size: usize,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(11, 2.0, 5)
    }
}

impl Preprocessor {
    /// `block_size` is the adaptive-threshold neighbourhood (odd), `offset`
    /// the constant subtracted from the local mean and `kernel_size` the side
    /// of the square morphology element.
    pub fn new(block_size: usize, offset: f32, kernel_size: usize) -> Self {
        Self {
            block_size,
            offset,
            kernel_size,
        }
    }

    pub fn preprocess(&self, frame: &RgbImage) -> GrayImage {
        self.preprocess_luma(&to_luma(frame))
    }

    /// Same as [`Preprocessor::preprocess`] for a frame already converted to luma.
    pub fn preprocess_luma(&self, gray: &GrayImage) -> GrayImage {
        let _span = tracing::debug_span!("preprocess").entered();

        let blurred = gaussian_blur_5x5(gray);
        let binary = adaptive_threshold_inv(&blurred, self.block_size, self.offset);
        let closed = close(&binary, self.kernel_size);
        open(&closed, self.kernel_size)
    }
}

/// Convert RGB to 8-bit luma with the Rec.601 weights.
pub fn to_luma(frame: &RgbImage) -> GrayImage {
    let (width, height) = frame.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let p = frame.get_pixel(x, y);
        let r = p[0] as f32;
        let g = p[1] as f32;
        let b = p[2] as f32;
        let value = (0.299 * r + 0.587 * g + 0.114 * b).round().clamp(0.0, 255.0) as u8;
        Luma([value])
    })
}

pub fn gaussian_blur_5x5(gray: &GrayImage) -> GrayImage {
    let (width, height) = gray.dimensions();
    let src: Vec<f32> = gray.as_raw().iter().map(|&v| v as f32).collect();
    let out = convolve_separable(
        &src,
        width as usize,
        height as usize,
        &BLUR_KERNEL,
        reflect101,
    );
    to_gray(&out, width, height)
}

/// Foreground (255) where a pixel is at least `offset` darker than its
/// Gaussian-weighted `block_size` x `block_size` neighbourhood mean.
pub fn adaptive_threshold_inv(gray: &GrayImage, block_size: usize, offset: f32) -> GrayImage {
    let (width, height) = gray.dimensions();
    let src: Vec<f32> = gray.as_raw().iter().map(|&v| v as f32).collect();
    let kernel = gaussian_kernel(block_size);
    let mean = convolve_separable(
        &src,
        width as usize,
        height as usize,
        &kernel,
        replicate,
    );

    let data = src
        .iter()
        .zip(mean.iter())
        .map(|(&value, &local)| {
            if value - local.round() <= -offset {
                255
            } else {
                0
            }
        })
        .collect();
    GrayImage::from_raw(width, height, data).unwrap_or_else(|| GrayImage::new(width, height))
}

/// Dilation followed by erosion: fills holes narrower than the element.
pub fn close(mask: &GrayImage, size: usize) -> GrayImage {
    erode(&dilate(mask, size), size)
}

/// Erosion followed by dilation: removes speckle narrower than the element.
pub fn open(mask: &GrayImage, size: usize) -> GrayImage {
    dilate(&erode(mask, size), size)
}

pub fn erode(mask: &GrayImage, size: usize) -> GrayImage {
    rank_filter(mask, size, u8::min, u8::MAX)
}

pub fn dilate(mask: &GrayImage, size: usize) -> GrayImage {
    rank_filter(mask, size, u8::max, u8::MIN)
}

/// Separable min/max filter with a `size` x `size` square element.
/// Pixels outside the image never take part.
fn rank_filter(mask: &GrayImage, size: usize, pick: fn(u8, u8) -> u8, identity: u8) -> GrayImage {
    let (width, height) = mask.dimensions();
    let (w, h) = (width as usize, height as usize);
    if w == 0 || h == 0 {
        return mask.clone();
    }
    let radius = size / 2;
    let src = mask.as_raw();

    let mut rows = vec![identity; w * h];
    for y in 0..h {
        let row = &src[y * w..(y + 1) * w];
        for x in 0..w {
            let lo = x.saturating_sub(radius);
            let hi = (x + radius).min(w - 1);
            rows[y * w + x] = row[lo..=hi].iter().copied().fold(identity, pick);
        }
    }

    let mut out = vec![identity; w * h];
    for y in 0..h {
        let lo = y.saturating_sub(radius);
        let hi = (y + radius).min(h - 1);
        for x in 0..w {
            out[y * w + x] = (lo..=hi).map(|yy| rows[yy * w + x]).fold(identity, pick);
        }
    }

    GrayImage::from_raw(width, height, out).unwrap_or_else(|| GrayImage::new(width, height))
}

/// Normalized Gaussian kernel of odd length `size`, sigma derived from the
/// size the usual way (`0.3 * ((size - 1) / 2 - 1) + 0.8`).
fn gaussian_kernel(size: usize) -> Vec<f32> {
    let radius = (size / 2) as i32;
    let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let denom = 2.0 * sigma * sigma;
    let raw: Vec<f32> = (-radius..=radius)
        .map(|d| (-((d * d) as f32) / denom).exp())
        .collect();
    let sum: f32 = raw.iter().sum();
    raw.into_iter().map(|v| v / sum).collect()
}

/// `gfedcb|abcdefgh|gfedcba`
fn reflect101(index: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let last = len as isize - 1;
    let mut i = index;
    loop {
        if i < 0 {
            i = -i;
        } else if i > last {
            i = 2 * last - i;
        } else {
            return i as usize;
        }
    }
}

/// `aaaaaa|abcdefgh|hhhhhhh`
fn replicate(index: isize, len: usize) -> usize {
    index.clamp(0, len as isize - 1) as usize
}

fn convolve_separable(
    src: &[f32],
    w: usize,
    h: usize,
    kernel: &[f32],
    border: fn(isize, usize) -> usize,
) -> Vec<f32> {
    if w == 0 || h == 0 {
        return Vec::new();
    }
    let radius = (kernel.len() / 2) as isize;

    let mut horizontal = vec![0.0f32; w * h];
    for y in 0..h {
        let row = &src[y * w..(y + 1) * w];
        for x in 0..w {
            let mut acc = 0.0;
            for (k, weight) in kernel.iter().enumerate() {
                let xx = border(x as isize + k as isize - radius, w);
                acc += row[xx] * weight;
            }
            horizontal[y * w + x] = acc;
        }
    }

    let mut out = vec![0.0f32; w * h];
    for y in 0..h {
        for (k, weight) in kernel.iter().enumerate() {
            let yy = border(y as isize + k as isize - radius, h);
            let src_row = &horizontal[yy * w..(yy + 1) * w];
            let out_row = &mut out[y * w..(y + 1) * w];
            for (o, s) in out_row.iter_mut().zip(src_row) {
                *o += s * weight;
            }
        }
    }
    out
}

fn to_gray(values: &[f32], width: u32, height: u32) -> GrayImage {
    let data = values
        .iter()
        .map(|v| v.round().clamp(0.0, 255.0) as u8)
        .collect();
    GrayImage::from_raw(width, height, data).unwrap_or_else(|| GrayImage::new(width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn belt_frame(width: u32, height: u32, left: u32, right: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, _| {
            if (left..=right).contains(&x) {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        })
    }

    #[test]
    fn luma_uses_rec601_weights() {
        let frame = RgbImage::from_pixel(2, 1, Rgb([255, 0, 0]));
        assert_eq!(to_luma(&frame).get_pixel(0, 0)[0], 76);
        let frame = RgbImage::from_pixel(1, 1, Rgb([0, 255, 0]));
        assert_eq!(to_luma(&frame).get_pixel(0, 0)[0], 150);
    }

    #[test]
    fn blur_smears_a_step_symmetrically() {
        let gray = to_luma(&belt_frame(40, 8, 20, 39));
        let blurred = gaussian_blur_5x5(&gray);
        let row: Vec<u8> = (16..24).map(|x| blurred.get_pixel(x, 4)[0]).collect();
        assert_eq!(row, vec![0, 0, 16, 80, 175, 239, 255, 255]);
    }

    #[test]
    fn mask_matches_input_size_and_is_binary() {
        let frame = belt_frame(120, 60, 30, 90);
        let mask = Preprocessor::default().preprocess(&frame);
        assert_eq!(mask.dimensions(), frame.dimensions());
        assert!(mask.pixels().all(|p| p[0] == 0 || p[0] == 255));
    }

    #[test]
    fn uniform_frame_has_no_foreground() {
        let frame = RgbImage::from_pixel(64, 48, Rgb([90, 90, 90]));
        let mask = Preprocessor::default().preprocess(&frame);
        assert!(mask.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn dark_bands_outside_belt_edges_survive_cleanup() {
        let frame = belt_frame(200, 120, 60, 140);
        let mask = Preprocessor::default().preprocess(&frame);
        let foreground: Vec<u32> = (0..200).filter(|&x| mask.get_pixel(x, 60)[0] == 255).collect();
        assert_eq!(foreground, vec![55, 56, 57, 58, 59, 141, 142, 143, 144, 145]);
    }

    #[test]
    fn opening_removes_isolated_speckle() {
        let mut mask = GrayImage::new(20, 20);
        mask.put_pixel(10, 10, Luma([255]));
        mask.put_pixel(11, 10, Luma([255]));
        let opened = open(&mask, 5);
        assert!(opened.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn closing_fills_small_holes() {
        let mut mask = GrayImage::from_pixel(20, 20, Luma([255]));
        mask.put_pixel(10, 10, Luma([0]));
        let closed = close(&mask, 5);
        assert!(closed.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn empty_frame_is_passed_through() {
        let mask = Preprocessor::default().preprocess(&RgbImage::new(0, 0));
        assert_eq!(mask.dimensions(), (0, 0));
    }
}
