//! AQI severity bands and their display colors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Six-band AQI classification.
///
/// Upper bounds are inclusive: 50 is `Good`, 50.01 is `Satisfactory`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AqiCategory {
    Good,
    Satisfactory,
    Moderate,
    Poor,
    #[serde(rename = "Very Poor")]
    VeryPoor,
    Severe,
}

impl AqiCategory {
    pub const ALL: [AqiCategory; 6] = [
        AqiCategory::Good,
        AqiCategory::Satisfactory,
        AqiCategory::Moderate,
        AqiCategory::Poor,
        AqiCategory::VeryPoor,
        AqiCategory::Severe,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AqiCategory::Good => "Good",
            AqiCategory::Satisfactory => "Satisfactory",
            AqiCategory::Moderate => "Moderate",
            AqiCategory::Poor => "Poor",
            AqiCategory::VeryPoor => "Very Poor",
            AqiCategory::Severe => "Severe",
        }
    }
}

impl fmt::Display for AqiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Map a score onto its band.
///
/// Total over `f64`: NaN fails every comparison and lands in `Severe`.
pub fn categorize(score: f64) -> AqiCategory {
    if score <= 50.0 {
        AqiCategory::Good
    } else if score <= 100.0 {
        AqiCategory::Satisfactory
    } else if score <= 200.0 {
        AqiCategory::Moderate
    } else if score <= 300.0 {
        AqiCategory::Poor
    } else if score <= 400.0 {
        AqiCategory::VeryPoor
    } else {
        AqiCategory::Severe
    }
}

/// Hex color per category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub good: String,
    pub satisfactory: String,
    pub moderate: String,
    pub poor: String,
    pub very_poor: String,
    pub severe: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            good: "#10b981".to_string(),
            satisfactory: "#9cd84e".to_string(),
            moderate: "#f59e0b".to_string(),
            poor: "#ff8c42".to_string(),
            very_poor: "#ef4444".to_string(),
            severe: "#7f1d1d".to_string(),
        }
    }
}

impl Palette {
    pub fn color(&self, category: AqiCategory) -> &str {
        match category {
            AqiCategory::Good => &self.good,
            AqiCategory::Satisfactory => &self.satisfactory,
            AqiCategory::Moderate => &self.moderate,
            AqiCategory::Poor => &self.poor,
            AqiCategory::VeryPoor => &self.very_poor,
            AqiCategory::Severe => &self.severe,
        }
    }

    /// Check every entry is a `#rgb` or `#rrggbb` hex color
    pub fn validate(&self) -> Result<(), String> {
        for category in AqiCategory::ALL {
            let color = self.color(category);
            if !is_hex_color(color) {
                return Err(format!(
                    "color for '{}' is not a hex color: '{}'",
                    category, color
                ));
            }
        }
        Ok(())
    }
}

fn is_hex_color(value: &str) -> bool {
    match value.strip_prefix('#') {
        Some(digits) => {
            matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit())
        }
        None => false,
    }
}

/// Round to two decimals from the exact binary value, ties to even.
///
/// `2.675` is stored as `2.67499...` and becomes `2.67`; an exact tie such as
/// `0.125` becomes `0.12`.
pub fn round_aqi(score: f64) -> f64 {
    format!("{score:.2}").parse().unwrap_or(score)
}
