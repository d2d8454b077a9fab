// src/stage.rs
//
// Stage, socket, and link types for the look graph.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{GafferError, Result};

/// Unique identifier for a stage within a graph.
pub type StageId = u32;

/// The fixed set of processing stage kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    CoordinateSource,
    PlanarTransform,
    ImageSampler,
    ExposureAdjust,
    ContrastAdjust,
    HueSatAdjust,
    WarmthAdjust,
    OutputMerge,
    RayTypeSwitch,
    ValueConstant,
    ThresholdCompare,
    ChannelSplit,
    ChannelCombine,
    FinalOutput,
}

impl StageKind {
    pub const ALL: [StageKind; 14] = [
        StageKind::CoordinateSource,
        StageKind::PlanarTransform,
        StageKind::ImageSampler,
        StageKind::ExposureAdjust,
        StageKind::ContrastAdjust,
        StageKind::HueSatAdjust,
        StageKind::WarmthAdjust,
        StageKind::OutputMerge,
        StageKind::RayTypeSwitch,
        StageKind::ValueConstant,
        StageKind::ThresholdCompare,
        StageKind::ChannelSplit,
        StageKind::ChannelCombine,
        StageKind::FinalOutput,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StageKind::CoordinateSource => "coordinate_source",
            StageKind::PlanarTransform => "planar_transform",
            StageKind::ImageSampler => "image_sampler",
            StageKind::ExposureAdjust => "exposure_adjust",
            StageKind::ContrastAdjust => "contrast_adjust",
            StageKind::HueSatAdjust => "hue_sat_adjust",
            StageKind::WarmthAdjust => "warmth_adjust",
            StageKind::OutputMerge => "output_merge",
            StageKind::RayTypeSwitch => "ray_type_switch",
            StageKind::ValueConstant => "value_constant",
            StageKind::ThresholdCompare => "threshold_compare",
            StageKind::ChannelSplit => "channel_split",
            StageKind::ChannelCombine => "channel_combine",
            StageKind::FinalOutput => "final_output",
        }
    }

    /// Name prefix of stages of this kind inside the host graph.
    pub fn base_name(self) -> &'static str {
        match self {
            StageKind::CoordinateSource => "HDRI_TexCoord",
            StageKind::PlanarTransform => "HDRI_Mapping",
            StageKind::ImageSampler => "HDRI_Image",
            StageKind::ExposureAdjust => "HDRI_Exposure",
            StageKind::ContrastAdjust => "HDRI_Contrast",
            StageKind::HueSatAdjust => "HDRI_HueSat",
            StageKind::WarmthAdjust => "HDRI_Warmth",
            StageKind::OutputMerge => "HDRI_Background",
            StageKind::RayTypeSwitch => "HDRI_RaySwitch",
            StageKind::ValueConstant => "HDRI_ClampValue",
            StageKind::ThresholdCompare => "HDRI_ClampMin",
            StageKind::ChannelSplit => "HDRI_SeparateHSV",
            StageKind::ChannelCombine => "HDRI_CombineHSV",
            StageKind::FinalOutput => "HDRI_Output",
        }
    }

    /// Name of the stage of this kind for the given variant.
    pub fn stage_name(self, variant: Variant) -> String {
        format!("{}{}", self.base_name(), variant.suffix())
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StageKind {
    type Err = GafferError;

    fn from_str(s: &str) -> Result<Self> {
        StageKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| GafferError::UnknownStageKind { kind: s.to_string() })
    }
}

/// Foreground or background copy of a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    Foreground,
    Background,
}

impl Variant {
    pub fn suffix(self) -> &'static str {
        match self {
            Variant::Foreground => "",
            Variant::Background => "_BG",
        }
    }
}

/// Socket signal type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocketType {
    Value,
    Color,
    Vector,
}

/// Unlinked value held by a socket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocketValue {
    Value(f32),
    Color([f32; 4]),
    Vector([f32; 3]),
}

impl SocketValue {
    pub fn socket_type(&self) -> SocketType {
        match self {
            SocketValue::Value(_) => SocketType::Value,
            SocketValue::Color(_) => SocketType::Color,
            SocketValue::Vector(_) => SocketType::Vector,
        }
    }

    pub fn as_value(&self) -> Option<f32> {
        match self {
            SocketValue::Value(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<[f32; 3]> {
        match self {
            SocketValue::Vector(v) => Some(*v),
            _ => None,
        }
    }
}

/// A typed connection point on a stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Socket {
    pub name: String,
    pub default_value: SocketValue,
}

impl Socket {
    pub fn value(name: impl Into<String>, v: f32) -> Self {
        Self {
            name: name.into(),
            default_value: SocketValue::Value(v),
        }
    }

    pub fn color(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_value: SocketValue::Color([0.0, 0.0, 0.0, 1.0]),
        }
    }

    pub fn vector(name: impl Into<String>, v: [f32; 3]) -> Self {
        Self {
            name: name.into(),
            default_value: SocketValue::Vector(v),
        }
    }

    pub fn socket_type(&self) -> SocketType {
        self.default_value.socket_type()
    }
}

/// Endpoint of a link: a stage and a socket index on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SocketRef {
    pub stage: StageId,
    pub socket: usize,
}

impl SocketRef {
    pub fn new(stage: StageId, socket: usize) -> Self {
        Self { stage, socket }
    }
}

/// Directed edge from an output socket to an input socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    pub from: SocketRef,
    pub to: SocketRef,
}

/// A named unit of the processing graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub id: StageId,
    pub name: String,
    pub kind: StageKind,
    pub variant: Variant,
    pub inputs: Vec<Socket>,
    pub outputs: Vec<Socket>,

    /// Layout hint for graph editors.
    pub position: (f32, f32),

    pub muted: bool,

    /// Created by the registry rather than by the user.
    pub managed: bool,

    /// Image path bound to an image sampler.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Stage {
    pub fn input(&self, index: usize) -> Result<&Socket> {
        self.inputs.get(index).ok_or_else(|| GafferError::SocketOutOfRange {
            stage: self.name.clone(),
            index,
            output: false,
        })
    }

    pub fn output(&self, index: usize) -> Result<&Socket> {
        self.outputs.get(index).ok_or_else(|| GafferError::SocketOutOfRange {
            stage: self.name.clone(),
            index,
            output: true,
        })
    }
}
