// ── Alert and health classification ──
//
// Pure mapping from raw `status` / `severity` strings to the visual
// taxonomy every panel shares: label, color, and icon. Two parallel
// taxonomies exist -- system health and security-alert severity -- and
// unknown values classify to a neutral default instead of failing.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Color bucket driving panel styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorColor {
    Green,
    Amber,
    Red,
    DarkRed,
    Blue,
    Neutral,
}

/// Classification result: what a panel renders for a status value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Indicator {
    pub label: &'static str,
    pub color: IndicatorColor,
    pub icon: &'static str,
}

/// Returned for any status or severity string outside the taxonomy.
pub const NEUTRAL: Indicator = Indicator {
    label: "unknown",
    color: IndicatorColor::Neutral,
    icon: "?",
};

// ── System-health taxonomy ───────────────────────────────────────────

/// System-health status: `healthy | warning | critical | degraded`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
    Degraded,
}

impl HealthStatus {
    pub fn indicator(self) -> Indicator {
        match self {
            Self::Healthy => Indicator {
                label: "healthy",
                color: IndicatorColor::Green,
                icon: "●",
            },
            Self::Warning => Indicator {
                label: "warning",
                color: IndicatorColor::Amber,
                icon: "◐",
            },
            Self::Critical => Indicator {
                label: "critical",
                color: IndicatorColor::Red,
                icon: "○",
            },
            Self::Degraded => Indicator {
                label: "degraded",
                color: IndicatorColor::Blue,
                icon: "◉",
            },
        }
    }
}

/// Classify a raw health `status` string. Unknown values map to
/// [`NEUTRAL`], never an error.
pub fn classify_health(status: &str) -> Indicator {
    HealthStatus::from_str(status.trim()).map_or(NEUTRAL, HealthStatus::indicator)
}

// ── Security-alert taxonomy ──────────────────────────────────────────

/// Security-alert severity: `low | medium | high | critical`.
///
/// `Ord` follows escalation order so feeds can sort by severity.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    pub fn indicator(self) -> Indicator {
        match self {
            Self::Low => Indicator {
                label: "low",
                color: IndicatorColor::Blue,
                icon: "▂",
            },
            Self::Medium => Indicator {
                label: "medium",
                color: IndicatorColor::Amber,
                icon: "▄",
            },
            Self::High => Indicator {
                label: "high",
                color: IndicatorColor::Red,
                icon: "▆",
            },
            Self::Critical => Indicator {
                label: "critical",
                color: IndicatorColor::DarkRed,
                icon: "█",
            },
        }
    }

    /// High and critical alerts trigger the audible cue.
    pub fn triggers_sound(self) -> bool {
        self >= Self::High
    }
}

/// Classify a raw alert `severity` string. Unknown values map to
/// [`NEUTRAL`], never an error.
pub fn classify_severity(severity: &str) -> Indicator {
    AlertSeverity::from_str(severity.trim()).map_or(NEUTRAL, AlertSeverity::indicator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn every_health_status_has_a_distinct_color() {
        let colors: Vec<_> = HealthStatus::iter()
            .map(|s| s.indicator().color)
            .collect();
        assert_eq!(
            colors,
            vec![
                IndicatorColor::Green,
                IndicatorColor::Amber,
                IndicatorColor::Red,
                IndicatorColor::Blue,
            ]
        );
    }

    #[test]
    fn every_severity_has_a_distinct_color() {
        let colors: Vec<_> = AlertSeverity::iter()
            .map(|s| s.indicator().color)
            .collect();
        assert_eq!(
            colors,
            vec![
                IndicatorColor::Blue,
                IndicatorColor::Amber,
                IndicatorColor::Red,
                IndicatorColor::DarkRed,
            ]
        );
    }

    #[test]
    fn classification_is_deterministic_and_case_insensitive() {
        assert_eq!(classify_health("healthy"), classify_health("HEALTHY"));
        assert_eq!(classify_health("warning").label, "warning");
        assert_eq!(classify_severity(" critical ").color, IndicatorColor::DarkRed);
    }

    #[test]
    fn unknown_values_classify_to_neutral() {
        assert_eq!(classify_health("exploded"), NEUTRAL);
        assert_eq!(classify_health(""), NEUTRAL);
        assert_eq!(classify_severity("severe"), NEUTRAL);
    }

    #[test]
    fn severity_orders_by_escalation() {
        assert!(AlertSeverity::Low < AlertSeverity::Medium);
        assert!(AlertSeverity::Medium < AlertSeverity::High);
        assert!(AlertSeverity::High < AlertSeverity::Critical);
    }

    #[test]
    fn only_high_and_critical_trigger_sound() {
        assert!(!AlertSeverity::Low.triggers_sound());
        assert!(!AlertSeverity::Medium.triggers_sound());
        assert!(AlertSeverity::High.triggers_sound());
        assert!(AlertSeverity::Critical.triggers_sound());
    }
}
