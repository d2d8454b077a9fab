// src/stages/mod.rs
//
// Standard stage templates for the HDRI look graph.

use crate::stage::{Socket, StageKind};
use crate::stage_registry::{StageRegistry, StageTemplate};

// ═══════════════════════════════════════════════════════════════════
// Socket Indices (per-stage-kind)
// ═══════════════════════════════════════════════════════════════════

pub mod sockets {
    // Coordinate source outputs
    pub const GENERATED: usize = 0;

    // Planar transform inputs / output
    pub const MAP_VECTOR: usize = 0;
    pub const MAP_LOCATION: usize = 1;
    pub const MAP_ROTATION: usize = 2;
    pub const MAP_SCALE: usize = 3;

    // Image sampler
    pub const IMAGE_VECTOR: usize = 0;
    pub const IMAGE_COLOR: usize = 0;

    // Shared color in / out for the adjustment stages
    pub const COLOR_IN: usize = 0;
    pub const COLOR_OUT: usize = 0;

    pub const EXPOSURE: usize = 1;

    pub const BRIGHT: usize = 1;
    pub const CONTRAST: usize = 2;

    pub const HUE: usize = 0;
    pub const SATURATION: usize = 1;
    pub const VALUE: usize = 2;
    pub const FAC: usize = 3;
    pub const HUESAT_COLOR: usize = 4;

    pub const WARMTH: usize = 1;
    pub const TINT: usize = 2;

    // Output merge (emitter)
    pub const MERGE_COLOR: usize = 0;
    pub const STRENGTH: usize = 1;
    pub const MERGE_OUT: usize = 0;

    // Ray type switch
    pub const SWITCH_FOREGROUND: usize = 0;
    pub const SWITCH_BACKGROUND: usize = 1;
    pub const SWITCH_OUT: usize = 0;

    // Clamp path
    pub const CONSTANT_OUT: usize = 0;
    pub const THRESHOLD_VALUE: usize = 0;
    pub const THRESHOLD_LIMIT: usize = 1;
    pub const THRESHOLD_OUT: usize = 0;
    pub const SPLIT_H: usize = 0;
    pub const SPLIT_S: usize = 1;
    pub const SPLIT_V: usize = 2;
    pub const COMBINE_H: usize = 0;
    pub const COMBINE_S: usize = 1;
    pub const COMBINE_V: usize = 2;

    pub const SURFACE: usize = 0;
}

// ═══════════════════════════════════════════════════════════════════
// Registry Population
// ═══════════════════════════════════════════════════════════════════

/// Populate the registry with every stage kind the look graph uses.
pub fn register_standard_stages(registry: &mut StageRegistry) {
    register_geometry(registry);
    register_adjustments(registry);
    register_clamp(registry);
    register_outputs(registry);
}

fn register_geometry(registry: &mut StageRegistry) {
    registry.register(
        StageTemplate::new(StageKind::CoordinateSource, "Texture Coordinate")
            .with_output(Socket::vector("Generated", [0.0; 3]))
            .with_output(Socket::vector("Normal", [0.0; 3]))
            .with_output(Socket::vector("Object", [0.0; 3])),
    );

    registry.register(
        StageTemplate::new(StageKind::PlanarTransform, "Mapping")
            .with_input(Socket::vector("Vector", [0.0; 3]))
            .with_input(Socket::vector("Location", [0.0; 3]))
            .with_input(Socket::vector("Rotation", [0.0; 3]))
            .with_input(Socket::vector("Scale", [1.0; 3]))
            .with_output(Socket::vector("Vector", [0.0; 3])),
    );

    registry.register(
        StageTemplate::new(StageKind::ImageSampler, "Environment Texture")
            .with_input(Socket::vector("Vector", [0.0; 3]))
            .with_output(Socket::color("Color"))
            .with_output(Socket::value("Alpha", 1.0)),
    );
}

fn register_adjustments(registry: &mut StageRegistry) {
    registry.register(
        StageTemplate::new(StageKind::ExposureAdjust, "Exposure")
            .with_input(Socket::color("Color"))
            .with_input(Socket::value("Exposure", 0.0))
            .with_output(Socket::color("Color")),
    );

    registry.register(
        StageTemplate::new(StageKind::ContrastAdjust, "Bright/Contrast")
            .with_input(Socket::color("Color"))
            .with_input(Socket::value("Bright", 0.0))
            .with_input(Socket::value("Contrast", 0.0))
            .with_output(Socket::color("Color")),
    );

    registry.register(
        StageTemplate::new(StageKind::HueSatAdjust, "Hue/Saturation")
            .with_input(Socket::value("Hue", 0.5))
            .with_input(Socket::value("Saturation", 1.0))
            .with_input(Socket::value("Value", 1.0))
            .with_input(Socket::value("Fac", 1.0))
            .with_input(Socket::color("Color"))
            .with_output(Socket::color("Color")),
    );

    registry.register(
        StageTemplate::new(StageKind::WarmthAdjust, "Warmth/Tint")
            .with_input(Socket::color("Color"))
            .with_input(Socket::value("Warmth", 0.0))
            .with_input(Socket::value("Tint", 0.0))
            .with_output(Socket::color("Color")),
    );
}

fn register_clamp(registry: &mut StageRegistry) {
    registry.register(
        StageTemplate::new(StageKind::ValueConstant, "Clamp Value")
            .with_input(Socket::value("Value", 0.0))
            .with_output(Socket::value("Value", 0.0)),
    );

    // Outputs min(Value, Threshold).
    registry.register(
        StageTemplate::new(StageKind::ThresholdCompare, "Clamp Minimum")
            .with_input(Socket::value("Value", 0.0))
            .with_input(Socket::value("Threshold", 0.0))
            .with_output(Socket::value("Value", 0.0)),
    );

    registry.register(
        StageTemplate::new(StageKind::ChannelSplit, "Separate HSV")
            .with_input(Socket::color("Color"))
            .with_output(Socket::value("H", 0.0))
            .with_output(Socket::value("S", 0.0))
            .with_output(Socket::value("V", 0.0)),
    );

    registry.register(
        StageTemplate::new(StageKind::ChannelCombine, "Combine HSV")
            .with_input(Socket::value("H", 0.0))
            .with_input(Socket::value("S", 0.0))
            .with_input(Socket::value("V", 0.0))
            .with_output(Socket::color("Color")),
    );
}

fn register_outputs(registry: &mut StageRegistry) {
    registry.register(
        StageTemplate::new(StageKind::OutputMerge, "Background")
            .with_input(Socket::color("Color"))
            .with_input(Socket::value("Strength", 1.0))
            .with_output(Socket::color("Background")),
    );

    // Camera rays see the background input, every other ray the foreground.
    registry.register(
        StageTemplate::new(StageKind::RayTypeSwitch, "Camera Ray Switch")
            .with_input(Socket::color("Foreground"))
            .with_input(Socket::color("Background"))
            .with_output(Socket::color("Shader")),
    );

    registry.register(
        StageTemplate::new(StageKind::FinalOutput, "World Output")
            .with_input(Socket::color("Surface")),
    );
}
