use crate::measurement::WidthOutcome;
use crate::types::{Alert, Segment};

/// Everything the assembler needs to know about one sampled frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampledFrame {
    /// 1-based index of the frame in the decoded stream.
    pub index: u64,
    pub width: WidthOutcome,
    pub seam: bool,
}

/// Sequential segment state: one open segment, the segments closed so far
/// and the alerts raised so far.
///
/// The state is an owned value advanced frame by frame (see
/// [`SegmentAssembler::advance`]), so a whole analysis is a fold over the
/// sampled frames in stream order.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentAssembler {
    warning_width: f64,
    open: Segment,
    closed: Vec<Segment>,
    alerts: Vec<Alert>,
}

impl SegmentAssembler {
    /// Valid widths below `warning_width` raise a width warning.
    pub fn new(warning_width: f64) -> Self {
        Self {
            warning_width,
            open: Segment::new(1, 0),
            closed: Vec::new(),
            alerts: Vec::new(),
        }
    }

    /// Apply the measurement event, then the seam event, of one sampled frame.
    pub fn advance(mut self, frame: SampledFrame) -> Self {
        self.record(frame.width, frame.index, Some(frame.index));
        if frame.seam {
            self.split_at(frame.index);
        }
        self
    }

    /// Image mode: a single measurement, no seam evaluation and no frame
    /// index on alerts.
    pub fn advance_still(mut self, width: WidthOutcome) -> Self {
        self.record(width, 0, None);
        self
    }

    pub fn open_segment(&self) -> &Segment {
        &self.open
    }

    pub fn closed_segments(&self) -> &[Segment] {
        &self.closed
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    /// Close the open segment and return all non-empty segments and alerts.
    pub fn finish(mut self) -> (Vec<Segment>, Vec<Alert>) {
        if !self.open.is_empty() {
            self.closed.push(self.open);
        }
        (self.closed, self.alerts)
    }

    fn record(&mut self, width: WidthOutcome, frame: u64, alert_frame: Option<u64>) {
        let Some(width) = width.value() else {
            return;
        };
        self.open.push(width, frame);
        if width < self.warning_width {
            self.alerts.push(Alert::width_warning(alert_frame, width));
        }
    }

    fn split_at(&mut self, frame: u64) {
        let finished = std::mem::replace(&mut self.open, Segment::new(0, frame));
        if !finished.is_empty() {
            self.closed.push(finished);
        }
        self.open = Segment::new(self.closed.len() as u32 + 1, frame);
    }
}

/// Fold a sequence of sampled frames into segments and alerts.
pub fn assemble<I>(warning_width: f64, frames: I) -> (Vec<Segment>, Vec<Alert>)
where
    I: IntoIterator<Item = SampledFrame>,
{
    frames
        .into_iter()
        .fold(SegmentAssembler::new(warning_width), SegmentAssembler::advance)
        .finish()
}
