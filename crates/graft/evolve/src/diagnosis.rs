//! Failure diagnosis — why a tentative record was rejected.

use serde::{Deserialize, Serialize};

use graft_types::{Record, Symbol, Value};

// ── Failure Reason ──────────────────────────────────────────────────

/// Symbolic reason for a rejected attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureReason {
    /// The diagnosed field sat at or above the upper bound.
    TooHigh,
    /// The diagnosed field sat at or below the lower bound.
    TooLow,
    /// The diagnosed field was absent or null.
    NoValue,
    /// The candidate modifier itself failed during Fork.
    HardFailure,
    /// Nothing more specific could be said.
    Unknown,
}

impl FailureReason {
    pub fn as_symbol(&self) -> Symbol {
        Symbol::new(self.to_string())
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooHigh => write!(f, "too-high"),
            Self::TooLow => write!(f, "too-low"),
            Self::NoValue => write!(f, "no-value"),
            Self::HardFailure => write!(f, "hard-failure"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

// ── Diagnosis ───────────────────────────────────────────────────────

/// Symbolic reason plus free-form detail for one rejection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub reason: FailureReason,
    /// Field the diagnosis is about; empty for hard failures.
    pub field: String,
    pub detail: String,
}

impl Diagnosis {
    pub fn new(
        reason: FailureReason,
        field: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            reason,
            field: field.into(),
            detail: detail.into(),
        }
    }

    pub fn hard_failure(detail: impl Into<String>) -> Self {
        Self::new(FailureReason::HardFailure, "", detail)
    }
}

impl std::fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.field.is_empty() {
            write!(f, "{}: {}", self.reason, self.detail)
        } else {
            write!(f, "{} on '{}': {}", self.reason, self.field, self.detail)
        }
    }
}

// ── Failure Analyzer ────────────────────────────────────────────────

/// Produces a diagnosis for a rejected tentative record.
///
/// The vocabulary is open: caller-supplied analyzers may diagnose
/// with their own reasons, which the mutation engine maps through its
/// rewrite table.
pub trait FailureAnalyzer: Send + Sync {
    fn diagnose(&self, record: &Record) -> Diagnosis;

    /// Name of this analyzer.
    fn name(&self) -> &str;
}

// ── Band Analyzer ───────────────────────────────────────────────────

/// Default analyzer: diagnoses one numeric field against an optional
/// band.
///
/// Absent or null → `no-value`; at or above the upper bound →
/// `too-high`; at or below the lower bound → `too-low`; otherwise
/// `unknown`.
#[derive(Clone, Debug)]
pub struct BandAnalyzer {
    field: String,
    lower: Option<f64>,
    upper: Option<f64>,
}

impl BandAnalyzer {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            lower: None,
            upper: None,
        }
    }

    pub fn with_lower(mut self, lower: f64) -> Self {
        self.lower = Some(lower);
        self
    }

    pub fn with_upper(mut self, upper: f64) -> Self {
        self.upper = Some(upper);
        self
    }

    /// Band with both bounds: acceptable values lie strictly between.
    pub fn band(field: impl Into<String>, lower: f64, upper: f64) -> Self {
        Self::new(field).with_lower(lower).with_upper(upper)
    }

    pub fn field(&self) -> &str {
        &self.field
    }
}

impl FailureAnalyzer for BandAnalyzer {
    fn diagnose(&self, record: &Record) -> Diagnosis {
        let value = record.get(&self.field);
        let numeric = value.and_then(Value::as_f64);
        match (value, numeric) {
            (None, _) | (Some(Value::Null), _) => Diagnosis::new(
                FailureReason::NoValue,
                self.field.clone(),
                "field absent or null",
            ),
            (_, Some(v)) => {
                if let Some(upper) = self.upper {
                    if v >= upper {
                        return Diagnosis::new(
                            FailureReason::TooHigh,
                            self.field.clone(),
                            format!("{} at or above {}", v, upper),
                        );
                    }
                }
                if let Some(lower) = self.lower {
                    if v <= lower {
                        return Diagnosis::new(
                            FailureReason::TooLow,
                            self.field.clone(),
                            format!("{} at or below {}", v, lower),
                        );
                    }
                }
                Diagnosis::new(
                    FailureReason::Unknown,
                    self.field.clone(),
                    format!("{} inside bounds yet rejected", v),
                )
            }
            (_, None) => Diagnosis::new(
                FailureReason::Unknown,
                self.field.clone(),
                "field is not numeric",
            ),
        }
    }

    fn name(&self) -> &str {
        "band-analyzer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_display_is_kebab() {
        assert_eq!(FailureReason::TooHigh.to_string(), "too-high");
        assert_eq!(FailureReason::NoValue.to_string(), "no-value");
        assert_eq!(FailureReason::HardFailure.to_string(), "hard-failure");
    }

    #[test]
    fn missing_field_is_no_value() {
        let analyzer = BandAnalyzer::band("value", 20.0, 30.0);
        let d = analyzer.diagnose(&Record::new());
        assert_eq!(d.reason, FailureReason::NoValue);
        assert_eq!(d.field, "value");
    }

    #[test]
    fn null_field_is_no_value() {
        let analyzer = BandAnalyzer::band("value", 20.0, 30.0);
        let record = Record::new().with_field("value", Value::Null);
        assert_eq!(analyzer.diagnose(&record).reason, FailureReason::NoValue);
    }

    #[test]
    fn above_upper_is_too_high() {
        let analyzer = BandAnalyzer::band("value", 20.0, 30.0);
        let record = Record::new().with_field("value", Value::Float(50.0));
        let d = analyzer.diagnose(&record);
        assert_eq!(d.reason, FailureReason::TooHigh);
        assert!(d.detail.contains("50"));
    }

    #[test]
    fn upper_bound_itself_is_too_high() {
        // Scenario band (20, 30): 30 is outside, so 30 diagnoses high.
        let analyzer = BandAnalyzer::band("value", 20.0, 30.0);
        let record = Record::new().with_field("value", Value::Float(30.0));
        assert_eq!(analyzer.diagnose(&record).reason, FailureReason::TooHigh);
    }

    #[test]
    fn below_lower_is_too_low() {
        let analyzer = BandAnalyzer::band("value", 20.0, 30.0);
        let record = Record::new().with_field("value", Value::Int(5));
        assert_eq!(analyzer.diagnose(&record).reason, FailureReason::TooLow);
    }

    #[test]
    fn inside_band_is_unknown() {
        let analyzer = BandAnalyzer::band("value", 20.0, 30.0);
        let record = Record::new().with_field("value", Value::Float(25.0));
        assert_eq!(analyzer.diagnose(&record).reason, FailureReason::Unknown);
    }

    #[test]
    fn non_numeric_is_unknown() {
        let analyzer = BandAnalyzer::new("value");
        let record = Record::new().with_field("value", Value::Text("high".into()));
        assert_eq!(analyzer.diagnose(&record).reason, FailureReason::Unknown);
    }

    #[test]
    fn unbounded_analyzer_never_diagnoses_bounds() {
        let analyzer = BandAnalyzer::new("value");
        let record = Record::new().with_field("value", Value::Float(1e12));
        assert_eq!(analyzer.diagnose(&record).reason, FailureReason::Unknown);
    }

    #[test]
    fn diagnosis_display() {
        let d = Diagnosis::new(FailureReason::TooHigh, "value", "50 at or above 30");
        assert!(d.to_string().contains("too-high on 'value'"));
        let h = Diagnosis::hard_failure("candidate failed");
        assert_eq!(h.to_string(), "hard-failure: candidate failed");
    }
}
