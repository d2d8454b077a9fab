// src/state/param_info.rs
//
// Parameter metadata for UI display and validation.

use std::fmt;

/// Unit type for parameter display.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ParamUnit {
    #[default]
    None,
    /// Angle in degrees
    Degrees,
    /// Linear multiplier
    Multiplier,
    /// Scene-linear radiance
    Radiance,
}

impl fmt::Display for ParamUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamUnit::None => Ok(()),
            ParamUnit::Degrees => write!(f, "°"),
            ParamUnit::Multiplier => write!(f, "x"),
            ParamUnit::Radiance => Ok(()),
        }
    }
}

/// Whether a parameter carries a number or a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Float,
    Toggle,
}

/// Metadata describing a look parameter.
///
/// Used by the UI to:
/// - Display appropriate controls (sliders, checkboxes)
/// - Validate input ranges
/// - Format values for display
#[derive(Debug, Clone)]
pub struct ParamInfo {
    /// Name on the UI boundary (e.g. `hdri_contrast`)
    pub name: &'static str,

    /// Human-readable label
    pub label: &'static str,

    pub kind: ParamKind,

    pub min: f32,
    pub max: f32,
    pub default: f32,

    pub unit: ParamUnit,
}

impl ParamInfo {
    pub const fn float(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            kind: ParamKind::Float,
            min: 0.0,
            max: 1.0,
            default: 0.0,
            unit: ParamUnit::None,
        }
    }

    pub const fn toggle(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            kind: ParamKind::Toggle,
            min: 0.0,
            max: 1.0,
            default: 0.0,
            unit: ParamUnit::None,
        }
    }

    pub const fn range(mut self, min: f32, max: f32) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub const fn default(mut self, value: f32) -> Self {
        self.default = value;
        self
    }

    pub const fn unit(mut self, unit: ParamUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Whether a value lies inside the valid range.
    #[inline]
    pub fn contains(&self, value: f32) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }

    /// Format a value for display.
    pub fn format(&self, value: f32) -> String {
        if self.kind == ParamKind::Toggle {
            return if value != 0.0 { "on" } else { "off" }.to_string();
        }
        if self.unit == ParamUnit::None {
            format!("{:.2}", value)
        } else {
            format!("{:.2} {}", value, self.unit)
        }
    }
}
