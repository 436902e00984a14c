mod analyzer;
mod assembler;

pub use analyzer::BeltAnalyzer;
pub use assembler::{assemble, SampledFrame, SegmentAssembler};
