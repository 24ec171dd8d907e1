use std::fmt;

use serde::Serialize;

/// Pass/fail classification of a row's percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Outcome {
    Pass,
    Fail,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Pass => "Pass",
            Outcome::Fail => "Fail",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies a percentage against the pass threshold.
///
/// | Percentage      | Outcome |
/// |-----------------|---------|
/// | >= threshold    | Pass    |
/// | < threshold     | Fail    |
pub fn classify(percentage: f64, threshold: f64) -> Outcome {
    match percentage {
        p if p >= threshold => Outcome::Pass,
        _ => Outcome::Fail,
    }
}
