use image::{Rgb, RgbImage};

pub const WIDTH: u32 = 320;
pub const HEIGHT: u32 = 240;

const BACKGROUND: Rgb<u8> = Rgb([0, 0, 0]);
const BELT: Rgb<u8> = Rgb([255, 255, 255]);
const SEAM: Rgb<u8> = Rgb([128, 128, 128]);

/// Bright belt on a dark background covering columns `left..=right`.
///
/// The preprocessor marks a 5-pixel dark band just outside each belt edge,
/// so the measured width is `right - left + 10`.
pub fn belt_frame(left: u32, right: u32) -> RgbImage {
    belt_frame_sized(WIDTH, HEIGHT, left, right)
}

pub fn belt_frame_sized(width: u32, height: u32, left: u32, right: u32) -> RgbImage {
    assert!(left <= right && right < width, "belt must lie inside the frame");
    RgbImage::from_fn(width, height, |x, _| {
        if (left..=right).contains(&x) {
            BELT
        } else {
            BACKGROUND
        }
    })
}

/// Belt frame crossed by a gray horizontal joint over the full frame width.
pub fn seam_frame(left: u32, right: u32) -> RgbImage {
    let mut frame = belt_frame(left, right);
    for y in 110..=130 {
        for x in 0..WIDTH {
            frame.put_pixel(x, y, SEAM);
        }
    }
    frame
}

/// Paint an additional bright vertical bar, e.g. a guide rail outside the ROI.
pub fn with_bar(mut frame: RgbImage, left: u32, right: u32) -> RgbImage {
    let height = frame.height();
    for x in left..=right {
        for y in 0..height {
            frame.put_pixel(x, y, BELT);
        }
    }
    frame
}
