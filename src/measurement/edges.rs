use image::GrayImage;
use ndarray::{Array1, ArrayView2, Axis};

/// Fraction of the mask height a column must exceed to count as belt edge.
const PROJECTION_RATIO: f64 = 0.3;

/// Left/right belt boundary columns. `None` marks an undetected side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EdgePair {
    pub left: Option<u32>,
    pub right: Option<u32>,
}

impl EdgePair {
    pub fn new(left: u32, right: u32) -> Self {
        Self {
            left: Some(left),
            right: Some(right),
        }
    }

    pub fn undetected() -> Self {
        Self::default()
    }

    pub fn both(&self) -> Option<(u32, u32)> {
        self.left.zip(self.right)
    }
}

/// Foreground pixel count per column.
pub fn column_projection(mask: &GrayImage) -> Array1<u32> {
    let (width, height) = mask.dimensions();
    match ArrayView2::from_shape((height as usize, width as usize), mask.as_raw().as_slice()) {
        Ok(view) => view.fold_axis(Axis(0), 0u32, |&count, &v| count + u32::from(v > 0)),
        Err(_) => Array1::zeros(width as usize),
    }
}

/// Scan the column projection from both sides at once and report the first
/// column on each side whose count exceeds 30% of the mask height.
pub fn locate_edges(mask: &GrayImage) -> EdgePair {
    let projection = column_projection(mask);
    let threshold = f64::from(mask.height()) * PROJECTION_RATIO;
    let n = projection.len();

    let mut edges = EdgePair::undetected();
    for i in 0..n {
        let mirrored = n - 1 - i;
        if edges.left.is_none() && f64::from(projection[i]) > threshold {
            edges.left = Some(i as u32);
        }
        if edges.right.is_none() && f64::from(projection[mirrored]) > threshold {
            edges.right = Some(mirrored as u32);
        }
        if edges.left.is_some() && edges.right.is_some() {
            break;
        }
    }

    tracing::trace!(?edges, "edge scan");
    edges
}
