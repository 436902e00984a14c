use super::edges::EdgePair;

/// Result of measuring one frame.
///
/// Only `Measured` carries a usable width; the other two variants are both
/// treated as "no measurement" by the segment assembler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WidthOutcome {
    Measured(f64),
    /// At least one belt edge was not found.
    Undetected,
    /// Edges were found but their distance is outside the accepted range.
    OutOfRange(f64),
}

impl WidthOutcome {
    pub fn value(&self) -> Option<f64> {
        match self {
            WidthOutcome::Measured(width) => Some(*width),
            WidthOutcome::Undetected | WidthOutcome::OutOfRange(_) => None,
        }
    }

    pub fn is_measured(&self) -> bool {
        matches!(self, WidthOutcome::Measured(_))
    }
}

/// Accepts widths inside the closed interval `[min_width, max_width]`.
#[derive(Debug, Clone, Copy)]
pub struct WidthValidator {
    min_width: f64,
    max_width: f64,
}

impl WidthValidator {
    pub fn new(min_width: f64, max_width: f64) -> Self {
        Self {
            min_width,
            max_width,
        }
    }

    pub fn validate(&self, edges: EdgePair) -> WidthOutcome {
        let Some((left, right)) = edges.both() else {
            return WidthOutcome::Undetected;
        };
        self.check(f64::from(right.abs_diff(left)))
    }

    /// Range check on an already computed width.
    pub fn check(&self, width: f64) -> WidthOutcome {
        if width < self.min_width || width > self.max_width {
            WidthOutcome::OutOfRange(width)
        } else {
            WidthOutcome::Measured(width)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> WidthValidator {
        WidthValidator::new(100.0, 2000.0)
    }

    #[test]
    fn thresholds_are_inclusive() {
        assert_eq!(validator().check(100.0), WidthOutcome::Measured(100.0));
        assert_eq!(validator().check(2000.0), WidthOutcome::Measured(2000.0));
        assert_eq!(validator().check(99.0), WidthOutcome::OutOfRange(99.0));
        assert_eq!(validator().check(2001.0), WidthOutcome::OutOfRange(2001.0));
    }

    #[test]
    fn width_is_absolute_column_distance() {
        assert_eq!(
            validator().validate(EdgePair::new(100, 450)),
            WidthOutcome::Measured(350.0)
        );
        assert_eq!(
            validator().validate(EdgePair::new(450, 100)),
            WidthOutcome::Measured(350.0)
        );
    }

    #[test]
    fn missing_side_is_undetected() {
        let edges = EdgePair {
            left: Some(10),
            right: None,
        };
        assert_eq!(validator().validate(edges), WidthOutcome::Undetected);
        assert_eq!(validator().validate(EdgePair::undetected()), WidthOutcome::Undetected);
    }

    #[test]
    fn absent_outcomes_have_no_value() {
        assert_eq!(WidthOutcome::Undetected.value(), None);
        assert_eq!(WidthOutcome::OutOfRange(90.0).value(), None);
        assert_eq!(WidthOutcome::Measured(120.0).value(), Some(120.0));
        assert!(!WidthOutcome::OutOfRange(90.0).is_measured());
    }
}
