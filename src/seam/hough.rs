//! Straight line segments from a binary edge map.
//!
//! Point-driven progressive Hough transform. Edge pixels are visited in
//! raster order; each one votes in a (rho, theta) accumulator. When one of
//! its bins reaches the vote threshold, the line through the pixel at that
//! angle is walked in both directions, bridging runs of at most
//! `max_line_gap` misses. Every pixel on the walked stretch is consumed and
//! can no longer vote or extend another line; pixels of an accepted segment
//! also take their votes back. Visiting order depends only on the pixel
//! positions, so results are reproducible.
use image::GrayImage;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoughParams {
    /// Distance resolution in pixels.
    pub rho: f64,
    /// Angle resolution in radians.
    pub theta: f64,
    /// Minimum accumulator votes for a line to be considered.
    pub threshold: u32,
    pub min_line_length: f64,
    pub max_line_gap: u32,
}

impl Default for HoughParams {
    fn default() -> Self {
        Self {
            rho: 1.0,
            theta: std::f64::consts::PI / 180.0,
            threshold: 100,
            min_line_length: 0.0,
            max_line_gap: 10,
        }
    }
}

/// Segment endpoints, ordered so that `x1 <= x2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSegment {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl LineSegment {
    fn from_ends(a: (usize, usize), b: (usize, usize)) -> Self {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        Self {
            x1: first.0 as i32,
            y1: first.1 as i32,
            x2: second.0 as i32,
            y2: second.1 as i32,
        }
    }

    /// Unsigned angle from the horizontal axis in radians.
    pub fn angle(&self) -> f64 {
        let dy = f64::from(self.y2 - self.y1);
        let dx = f64::from(self.x2 - self.x1);
        dy.atan2(dx).abs()
    }

    pub fn length(&self) -> f64 {
        let dy = f64::from(self.y2 - self.y1);
        let dx = f64::from(self.x2 - self.x1);
        dx.hypot(dy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pixel {
    Background,
    Pending,
    Voted,
}

struct Accumulator {
    votes: Vec<u32>,
    trig: Vec<(f64, f64)>,
    num_rho: usize,
    offset: i64,
    rho: f64,
}

impl Accumulator {
    fn new(w: usize, h: usize, params: &HoughParams) -> Self {
        let num_theta = (std::f64::consts::PI / params.theta).round().max(1.0) as usize;
        let trig = (0..num_theta)
            .map(|t| {
                let angle = t as f64 * params.theta;
                (angle.cos(), angle.sin())
            })
            .collect();
        let offset = (((w * w + h * h) as f64).sqrt() / params.rho).ceil() as i64 + 1;
        let num_rho = (2 * offset + 1) as usize;
        Self {
            votes: vec![0; num_theta * num_rho],
            trig,
            num_rho,
            offset,
            rho: params.rho,
        }
    }

    fn bin(&self, t: usize, x: usize, y: usize) -> usize {
        let (cos, sin) = self.trig[t];
        let r = ((x as f64 * cos + y as f64 * sin) / self.rho).round() as i64 + self.offset;
        t * self.num_rho + r as usize
    }

    /// Add the votes of `(x, y)`; returns the strongest of its bins as
    /// `(votes, theta index)`, lowest theta first on ties.
    fn vote(&mut self, x: usize, y: usize) -> (u32, usize) {
        let mut best = (0, 0);
        for t in 0..self.trig.len() {
            let bin = self.bin(t, x, y);
            self.votes[bin] += 1;
            if self.votes[bin] > best.0 {
                best = (self.votes[bin], t);
            }
        }
        best
    }

    fn unvote(&mut self, x: usize, y: usize) {
        for t in 0..self.trig.len() {
            let bin = self.bin(t, x, y);
            self.votes[bin] = self.votes[bin].saturating_sub(1);
        }
    }
}

/// Stepping along a line through a pixel, one unit along the dominant axis.
#[derive(Debug, Clone, Copy)]
struct LineWalk {
    x0: f64,
    y0: f64,
    dx: f64,
    dy: f64,
    w: usize,
    h: usize,
}

impl LineWalk {
    fn new(x: usize, y: usize, cos: f64, sin: f64, w: usize, h: usize) -> Self {
        // Direction of the line with normal (cos, sin)
        let (dx, dy) = (-sin, cos);
        let major = dx.abs().max(dy.abs());
        Self {
            x0: x as f64,
            y0: y as f64,
            dx: dx / major,
            dy: dy / major,
            w,
            h,
        }
    }

    /// Pixel `k` steps away; negative `k` walks backwards.
    fn at(&self, k: i64) -> Option<(usize, usize)> {
        let x = (self.x0 + k as f64 * self.dx).round();
        let y = (self.y0 + k as f64 * self.dy).round();
        if x < 0.0 || y < 0.0 || x >= self.w as f64 || y >= self.h as f64 {
            return None;
        }
        Some((x as usize, y as usize))
    }

    /// Step count to the last unconsumed pixel in direction `sign`, stopping
    /// after more than `max_gap` consecutive misses or at the image border.
    fn reach(&self, sign: i64, pixels: &[Pixel], max_gap: u32) -> i64 {
        let mut last = 0;
        let mut gap = 0;
        let mut k = sign;
        while let Some((x, y)) = self.at(k) {
            if pixels[y * self.w + x] != Pixel::Background {
                last = k;
                gap = 0;
            } else {
                gap += 1;
                if gap > max_gap {
                    break;
                }
            }
            k += sign;
        }
        last
    }
}

pub fn detect_segments(edges: &GrayImage, params: &HoughParams) -> Vec<LineSegment> {
    let _span = tracing::debug_span!("hough").entered();

    let (width, height) = edges.dimensions();
    let (w, h) = (width as usize, height as usize);
    if w == 0 || h == 0 || params.rho <= 0.0 || params.theta <= 0.0 {
        return Vec::new();
    }

    let mut pixels: Vec<Pixel> = edges
        .as_raw()
        .iter()
        .map(|&v| if v > 0 { Pixel::Pending } else { Pixel::Background })
        .collect();
    let mut accumulator = Accumulator::new(w, h, params);
    let mut segments = Vec::new();

    for idx in 0..w * h {
        // Skips background and pixels consumed by an earlier walk
        if pixels[idx] != Pixel::Pending {
            continue;
        }
        let (x, y) = (idx % w, idx / w);
        pixels[idx] = Pixel::Voted;

        let (votes, t) = accumulator.vote(x, y);
        if votes < params.threshold {
            continue;
        }

        let (cos, sin) = accumulator.trig[t];
        let walk = LineWalk::new(x, y, cos, sin, w, h);
        let forward = walk.reach(1, &pixels, params.max_line_gap);
        let backward = walk.reach(-1, &pixels, params.max_line_gap);
        let (Some(a), Some(b)) = (walk.at(forward), walk.at(backward)) else {
            continue;
        };
        let segment = LineSegment::from_ends(a, b);
        let accepted = segment.length() >= params.min_line_length;

        for k in backward..=forward {
            let Some((px, py)) = walk.at(k) else {
                continue;
            };
            let p = py * w + px;
            if accepted && pixels[p] == Pixel::Voted {
                accumulator.unvote(px, py);
            }
            pixels[p] = Pixel::Background;
        }

        if accepted {
            segments.push(segment);
        }
    }

    segments
}
