use image::{Rgb, RgbImage};

use super::edges::EdgePair;

const EDGE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const WIDTH_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
const LINE_THICKNESS: u32 = 2;

/// Copy of `frame` with the detected edges drawn as vertical lines and the
/// measured width as a horizontal line at mid-height.
///
/// Frames with an undetected side are returned unchanged.
pub fn annotate(frame: &RgbImage, edges: EdgePair) -> RgbImage {
    let mut vis = frame.clone();
    let Some((left, right)) = edges.both() else {
        return vis;
    };
    let (width, height) = vis.dimensions();

    for column in [left, right] {
        for x in column..(column + LINE_THICKNESS).min(width) {
            for y in 0..height {
                vis.put_pixel(x, y, EDGE_COLOR);
            }
        }
    }

    let (from, to) = (left.min(right), left.max(right).min(width.saturating_sub(1)));
    let mid = height / 2;
    for y in mid..(mid + LINE_THICKNESS).min(height) {
        for x in from..=to {
            vis.put_pixel(x, y, WIDTH_COLOR);
        }
    }

    vis
}
