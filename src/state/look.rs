// src/state/look.rs
//
// The user-facing look parameters and their UI names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{ParamInfo, ParamUnit};
use crate::error::{GafferError, Result};
use crate::stage::Variant;

/// Adjustments that can take a separate value for the background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Brightness,
    Contrast,
    Saturation,
    Warmth,
    Tint,
}

impl Channel {
    pub const ALL: [Channel; 5] = [
        Channel::Brightness,
        Channel::Contrast,
        Channel::Saturation,
        Channel::Warmth,
        Channel::Tint,
    ];

    fn as_str(self) -> &'static str {
        match self {
            Channel::Brightness => "brightness",
            Channel::Contrast => "contrast",
            Channel::Saturation => "saturation",
            Channel::Warmth => "warmth",
            Channel::Tint => "tint",
        }
    }
}

/// One user-facing look parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookParam {
    Rotation,
    HorzShift,
    HorzExp,
    Clamp,
    UseJpgBackground,
    UseDarkenedJpg,
    /// Foreground value of an adjustment
    Value(Channel),
    /// "Use separate background value" toggle
    UseSeparate(Channel),
    /// Background override value
    Background(Channel),
}

impl LookParam {
    pub fn all() -> Vec<LookParam> {
        let mut all = vec![
            LookParam::Rotation,
            LookParam::HorzShift,
            LookParam::HorzExp,
            LookParam::Clamp,
            LookParam::UseJpgBackground,
            LookParam::UseDarkenedJpg,
        ];
        for ch in Channel::ALL {
            all.push(LookParam::Value(ch));
            all.push(LookParam::UseSeparate(ch));
            all.push(LookParam::Background(ch));
        }
        all
    }

    /// Metadata for this parameter.
    pub fn info(self) -> ParamInfo {
        match self {
            LookParam::Rotation => ParamInfo::float("hdri_rotation", "Rotation")
                .range(-360.0, 360.0)
                .unit(ParamUnit::Degrees),
            LookParam::HorzShift => {
                ParamInfo::float("hdri_horz_shift", "Horizon Shift").range(-1.0, 1.0)
            }
            LookParam::HorzExp => ParamInfo::float("hdri_horz_exp", "Horizon Warp")
                .range(0.01, 2.0)
                .default(1.0),
            LookParam::Clamp => ParamInfo::float("hdri_clamp", "Clamp Brightest")
                .range(0.0, 1000.0)
                .unit(ParamUnit::Radiance),
            LookParam::UseJpgBackground => {
                ParamInfo::toggle("hdri_use_jpg_background", "JPG Background")
            }
            LookParam::UseDarkenedJpg => {
                ParamInfo::toggle("hdri_use_darkened_jpg", "Darkened JPG Background")
            }
            LookParam::Value(ch) | LookParam::Background(ch) => {
                let bg = matches!(self, LookParam::Background(_));
                let (name, label) = channel_names(ch, bg);
                let info = ParamInfo::float(name, label).default(1.0);
                match ch {
                    Channel::Brightness => info.range(0.0, 100.0).unit(ParamUnit::Multiplier),
                    _ => info.range(0.0, 2.0),
                }
            }
            LookParam::UseSeparate(ch) => {
                let (name, label) = separate_names(ch);
                ParamInfo::toggle(name, label)
            }
        }
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }
}

fn channel_names(ch: Channel, background: bool) -> (&'static str, &'static str) {
    match (ch, background) {
        (Channel::Brightness, false) => ("hdri_brightness", "Brightness"),
        (Channel::Contrast, false) => ("hdri_contrast", "Contrast"),
        (Channel::Saturation, false) => ("hdri_saturation", "Saturation"),
        (Channel::Warmth, false) => ("hdri_warmth", "Warmth"),
        (Channel::Tint, false) => ("hdri_tint", "Tint"),
        (Channel::Brightness, true) => ("hdri_bg_brightness", "Background Brightness"),
        (Channel::Contrast, true) => ("hdri_bg_contrast", "Background Contrast"),
        (Channel::Saturation, true) => ("hdri_bg_saturation", "Background Saturation"),
        (Channel::Warmth, true) => ("hdri_bg_warmth", "Background Warmth"),
        (Channel::Tint, true) => ("hdri_bg_tint", "Background Tint"),
    }
}

fn separate_names(ch: Channel) -> (&'static str, &'static str) {
    match ch {
        Channel::Brightness => ("hdri_use_separate_brightness", "Separate Brightness"),
        Channel::Contrast => ("hdri_use_separate_contrast", "Separate Contrast"),
        Channel::Saturation => ("hdri_use_separate_saturation", "Separate Saturation"),
        Channel::Warmth => ("hdri_use_separate_warmth", "Separate Warmth"),
        Channel::Tint => ("hdri_use_separate_tint", "Separate Tint"),
    }
}

impl fmt::Display for LookParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LookParam {
    type Err = GafferError;

    fn from_str(s: &str) -> Result<Self> {
        LookParam::all()
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| GafferError::UnknownParameter { name: s.to_string() })
    }
}

/// A value sent by one UI control.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Toggle(bool),
    Float(f32),
}

impl From<f32> for ParamValue {
    fn from(v: f32) -> Self {
        ParamValue::Float(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Toggle(v)
    }
}

/// The complete configuration of one HDRI look.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookParameters {
    /// Rotation around the vertical axis, degrees
    pub rotation: f32,
    pub brightness: f32,
    /// 1 = neutral
    pub contrast: f32,
    pub saturation: f32,
    pub warmth: f32,
    pub tint: f32,
    pub horz_shift: f32,
    pub horz_exp: f32,
    /// 0 disables clamping
    pub clamp: f32,

    pub use_jpg_background: bool,
    pub use_darkened_jpg: bool,

    pub use_separate_brightness: bool,
    pub use_separate_contrast: bool,
    pub use_separate_saturation: bool,
    pub use_separate_warmth: bool,
    pub use_separate_tint: bool,

    pub bg_brightness: f32,
    pub bg_contrast: f32,
    pub bg_saturation: f32,
    pub bg_warmth: f32,
    pub bg_tint: f32,
}

impl Default for LookParameters {
    fn default() -> Self {
        Self {
            rotation: 0.0,
            brightness: 1.0,
            contrast: 1.0,
            saturation: 1.0,
            warmth: 1.0,
            tint: 1.0,
            horz_shift: 0.0,
            horz_exp: 1.0,
            clamp: 0.0,
            use_jpg_background: false,
            use_darkened_jpg: false,
            use_separate_brightness: false,
            use_separate_contrast: false,
            use_separate_saturation: false,
            use_separate_warmth: false,
            use_separate_tint: false,
            bg_brightness: 1.0,
            bg_contrast: 1.0,
            bg_saturation: 1.0,
            bg_warmth: 1.0,
            bg_tint: 1.0,
        }
    }
}

impl LookParameters {
    pub fn new() -> Self {
        Self::default()
    }

    fn float(&self, param: LookParam) -> Option<f32> {
        Some(match param {
            LookParam::Rotation => self.rotation,
            LookParam::HorzShift => self.horz_shift,
            LookParam::HorzExp => self.horz_exp,
            LookParam::Clamp => self.clamp,
            LookParam::Value(Channel::Brightness) => self.brightness,
            LookParam::Value(Channel::Contrast) => self.contrast,
            LookParam::Value(Channel::Saturation) => self.saturation,
            LookParam::Value(Channel::Warmth) => self.warmth,
            LookParam::Value(Channel::Tint) => self.tint,
            LookParam::Background(Channel::Brightness) => self.bg_brightness,
            LookParam::Background(Channel::Contrast) => self.bg_contrast,
            LookParam::Background(Channel::Saturation) => self.bg_saturation,
            LookParam::Background(Channel::Warmth) => self.bg_warmth,
            LookParam::Background(Channel::Tint) => self.bg_tint,
            _ => return None,
        })
    }

    fn float_mut(&mut self, param: LookParam) -> Option<&mut f32> {
        Some(match param {
            LookParam::Rotation => &mut self.rotation,
            LookParam::HorzShift => &mut self.horz_shift,
            LookParam::HorzExp => &mut self.horz_exp,
            LookParam::Clamp => &mut self.clamp,
            LookParam::Value(Channel::Brightness) => &mut self.brightness,
            LookParam::Value(Channel::Contrast) => &mut self.contrast,
            LookParam::Value(Channel::Saturation) => &mut self.saturation,
            LookParam::Value(Channel::Warmth) => &mut self.warmth,
            LookParam::Value(Channel::Tint) => &mut self.tint,
            LookParam::Background(Channel::Brightness) => &mut self.bg_brightness,
            LookParam::Background(Channel::Contrast) => &mut self.bg_contrast,
            LookParam::Background(Channel::Saturation) => &mut self.bg_saturation,
            LookParam::Background(Channel::Warmth) => &mut self.bg_warmth,
            LookParam::Background(Channel::Tint) => &mut self.bg_tint,
            _ => return None,
        })
    }

    fn toggle_mut(&mut self, param: LookParam) -> Option<&mut bool> {
        Some(match param {
            LookParam::UseJpgBackground => &mut self.use_jpg_background,
            LookParam::UseDarkenedJpg => &mut self.use_darkened_jpg,
            LookParam::UseSeparate(Channel::Brightness) => &mut self.use_separate_brightness,
            LookParam::UseSeparate(Channel::Contrast) => &mut self.use_separate_contrast,
            LookParam::UseSeparate(Channel::Saturation) => &mut self.use_separate_saturation,
            LookParam::UseSeparate(Channel::Warmth) => &mut self.use_separate_warmth,
            LookParam::UseSeparate(Channel::Tint) => &mut self.use_separate_tint,
            _ => return None,
        })
    }

    pub fn get(&self, param: LookParam) -> ParamValue {
        match self.float(param) {
            Some(v) => ParamValue::Float(v),
            None => ParamValue::Toggle(self.is_set(param)),
        }
    }

    fn is_set(&self, param: LookParam) -> bool {
        match param {
            LookParam::UseJpgBackground => self.use_jpg_background,
            LookParam::UseDarkenedJpg => self.use_darkened_jpg,
            LookParam::UseSeparate(ch) => self.uses_separate(ch),
            _ => false,
        }
    }

    /// Validate `value` for `param` without changing anything.
    pub fn validate(param: LookParam, value: ParamValue) -> Result<()> {
        let info = param.info();
        match (info.kind, value) {
            (super::ParamKind::Float, ParamValue::Float(v)) => {
                if info.contains(v) {
                    Ok(())
                } else {
                    Err(GafferError::InvalidParameterValue {
                        name: info.name.to_string(),
                        reason: format!("{} outside [{}, {}]", v, info.min, info.max),
                    })
                }
            }
            (super::ParamKind::Toggle, ParamValue::Toggle(_)) => Ok(()),
            (super::ParamKind::Float, ParamValue::Toggle(_)) => {
                Err(GafferError::InvalidParameterValue {
                    name: info.name.to_string(),
                    reason: "expected a number".to_string(),
                })
            }
            (super::ParamKind::Toggle, ParamValue::Float(_)) => {
                Err(GafferError::InvalidParameterValue {
                    name: info.name.to_string(),
                    reason: "expected a toggle".to_string(),
                })
            }
        }
    }

    /// Set one parameter. Nothing changes when validation fails.
    pub fn set(&mut self, param: LookParam, value: ParamValue) -> Result<()> {
        Self::validate(param, value)?;
        match value {
            ParamValue::Float(v) => {
                if let Some(slot) = self.float_mut(param) {
                    *slot = v;
                }
            }
            ParamValue::Toggle(b) => {
                if let Some(slot) = self.toggle_mut(param) {
                    *slot = b;
                }
            }
        }
        Ok(())
    }

    pub fn uses_separate(&self, ch: Channel) -> bool {
        match ch {
            Channel::Brightness => self.use_separate_brightness,
            Channel::Contrast => self.use_separate_contrast,
            Channel::Saturation => self.use_separate_saturation,
            Channel::Warmth => self.use_separate_warmth,
            Channel::Tint => self.use_separate_tint,
        }
    }

    /// The background image is swapped for a JPG (optionally darkened).
    pub fn substitutes_background_image(&self) -> bool {
        self.use_jpg_background || self.use_darkened_jpg
    }

    /// The raw UI value of a channel for one variant.
    ///
    /// The background falls back to the foreground value without an override.
    pub fn channel(&self, ch: Channel, variant: Variant) -> f32 {
        let fg = self.float(LookParam::Value(ch)).unwrap_or(1.0);
        match variant {
            Variant::Foreground => fg,
            Variant::Background if self.uses_separate(ch) => {
                self.float(LookParam::Background(ch)).unwrap_or(fg)
            }
            Variant::Background => fg,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_names_round_trip() {
        for param in LookParam::all() {
            assert_eq!(param.name().parse::<LookParam>().unwrap(), param);
        }
        assert_eq!(
            "hdri_use_separate_brightness".parse::<LookParam>().unwrap(),
            LookParam::UseSeparate(Channel::Brightness)
        );
    }

    #[test]
    fn test_unknown_parameter() {
        let err = "hdri_sharpness".parse::<LookParam>().unwrap_err();
        assert!(matches!(err, GafferError::UnknownParameter { .. }));
    }

    #[test]
    fn test_set_rejects_without_mutation() {
        let mut look = LookParameters::new();
        assert!(look.set(LookParam::Value(Channel::Contrast), ParamValue::Float(5.0)).is_err());
        assert!(look.set(LookParam::Value(Channel::Contrast), true.into()).is_err());
        assert!(look.set(LookParam::UseDarkenedJpg, ParamValue::Float(1.0)).is_err());
        assert_eq!(look, LookParameters::new());
    }

    #[test]
    fn test_background_channel_fallback() {
        let mut look = LookParameters::new();
        look.set(LookParam::Value(Channel::Warmth), ParamValue::Float(1.5)).unwrap();
        look.set(LookParam::Background(Channel::Warmth), ParamValue::Float(0.5)).unwrap();
        assert_eq!(look.channel(Channel::Warmth, Variant::Background), 1.5);

        look.set(LookParam::UseSeparate(Channel::Warmth), true.into()).unwrap();
        assert_eq!(look.channel(Channel::Warmth, Variant::Background), 0.5);
        assert_eq!(look.channel(Channel::Warmth, Variant::Foreground), 1.5);
    }

    #[test]
    fn test_json_round_trip_is_exact() {
        let mut look = LookParameters::new();
        look.rotation = 123.456;
        look.contrast = 1.4;
        look.use_separate_tint = true;
        look.bg_tint = 0.3;

        let json = serde_json::to_string(&look).unwrap();
        let back: LookParameters = serde_json::from_str(&json).unwrap();
        assert_eq!(back, look);
    }

    #[test]
    fn test_json_missing_fields_use_defaults() {
        let look: LookParameters = serde_json::from_str(r#"{"contrast": 1.2}"#).unwrap();
        assert_eq!(look.contrast, 1.2);
        assert_eq!(look.brightness, 1.0);
        assert!(!look.use_jpg_background);
    }
}
