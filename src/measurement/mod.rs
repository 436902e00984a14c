mod edges;
mod preprocess;
mod visualize;
mod width;

pub use edges::{column_projection, locate_edges, EdgePair};
pub use preprocess::{
    adaptive_threshold_inv, close, dilate, erode, gaussian_blur_5x5, open, to_luma, Preprocessor,
};
pub use visualize::annotate;
pub use width::{WidthOutcome, WidthValidator};
