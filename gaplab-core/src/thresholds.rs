//! Containment threshold grid.
//!
//! The grid is an explicit value passed to the reducer, summarizer, and
//! exporters — never global state — so alternate grids are trivial to test.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single containment threshold: display label plus decimal fraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub label: String,
    pub value: Decimal,
}

/// Ordered set of containment thresholds.
///
/// Every `DailyRow` and `SummaryRow` is keyed against each entry, in grid
/// order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdGrid {
    thresholds: Vec<Threshold>,
}

impl ThresholdGrid {
    /// The standard five-threshold grid: 1.0%, 1.5%, 2.0%, 3.0%, 4.0%.
    pub fn standard() -> Self {
        Self {
            thresholds: vec![
                Threshold {
                    label: "1.0%".into(),
                    value: Decimal::new(1, 2),
                },
                Threshold {
                    label: "1.5%".into(),
                    value: Decimal::new(15, 3),
                },
                Threshold {
                    label: "2.0%".into(),
                    value: Decimal::new(2, 2),
                },
                Threshold {
                    label: "3.0%".into(),
                    value: Decimal::new(3, 2),
                },
                Threshold {
                    label: "4.0%".into(),
                    value: Decimal::new(4, 2),
                },
            ],
        }
    }

    /// Build a grid from raw fractions, deriving labels (e.g. 0.025 → "2.5%").
    pub fn from_values(values: &[Decimal]) -> Self {
        Self {
            thresholds: values
                .iter()
                .map(|v| Threshold {
                    label: format!("{:.1}%", v * Decimal::ONE_HUNDRED),
                    value: *v,
                })
                .collect(),
        }
    }

    pub fn thresholds(&self) -> &[Threshold] {
        &self.thresholds
    }

    pub fn len(&self) -> usize {
        self.thresholds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }

    pub fn labels(&self) -> Vec<String> {
        self.thresholds.iter().map(|t| t.label.clone()).collect()
    }
}

impl Default for ThresholdGrid {
    fn default() -> Self {
        Self::standard()
    }
}
