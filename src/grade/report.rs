// src/grade/report.rs

use super::diff::{CellLocation, DiffReport};
use super::window::{ComparisonWindow, WindowPoint, WindowRegime};
use serde::Serialize;

/// Everything a presentation layer needs from one grading attempt. Fields are
/// private; a built report never changes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalReport {
    total_error: f64,
    max_error: f64,
    location: CellLocation,
    window_regime: WindowRegime,
    window: Vec<WindowPoint>,
}

impl FinalReport {
    pub fn total_error(&self) -> f64 {
        self.total_error
    }

    pub fn max_error(&self) -> f64 {
        self.max_error
    }

    pub fn location(&self) -> &CellLocation {
        &self.location
    }

    pub fn window_regime(&self) -> WindowRegime {
        self.window_regime
    }

    pub fn window(&self) -> &[WindowPoint] {
        &self.window
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Assemble the final report. No computation happens here.
pub fn build(diff: DiffReport, window: ComparisonWindow) -> FinalReport {
    let (total_error, max_error, location) = diff.into_parts();
    let (window_regime, window) = window.into_parts();
    FinalReport {
        total_error,
        max_error,
        location,
        window_regime,
        window,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grade::{align::align, diff, window};
    use crate::table::Table;
    use serde_json::{json, Value};

    #[test]
    fn serializes_for_presentation() {
        let truth = Table::from_values(
            vec![0i64, 1],
            vec!["occ_a", "occ_b"],
            vec![vec![1.0, 2.0], vec![3.0, 4.0]],
        )
        .unwrap();
        let submitted = Table::from_values(
            vec![0i64, 1],
            vec!["occ_a", "occ_b"],
            vec![vec![1.0, 2.5], vec![3.0, 4.0]],
        )
        .unwrap();
        let aligned = align(&truth, &submitted).unwrap();
        let d = diff::diff(&truth, &aligned, diff::MissingPolicy::Reject).unwrap();
        let w = window::extract_window(&truth, &aligned, d.location(), &Default::default()).unwrap();
        let report = build(d, w);

        let value: Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "total_error": 0.5,
                "max_error": 0.5,
                "location": { "row_label": 0, "column_label": "occ_b" },
                "window_regime": { "kind": "block", "index": 0 },
                "window": [
                    { "order": 1, "truth_value": 2.0, "submitted_value": 2.5 },
                    { "order": 2, "truth_value": 4.0, "submitted_value": 4.0 }
                ]
            })
        );
    }
}
