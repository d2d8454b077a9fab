// src/stage_registry.rs
//
// Stage templates and idempotent stage materialization.

use std::collections::HashMap;

use log::debug;

use crate::error::{GafferError, Result};
use crate::graph::GraphStore;
use crate::stage::{Socket, Stage, StageId, StageKind, Variant};

/// Describes the sockets a stage kind is created with.
#[derive(Debug, Clone)]
pub struct StageTemplate {
    pub kind: StageKind,
    pub label: String,
    pub inputs: Vec<Socket>,
    pub outputs: Vec<Socket>,
}

impl StageTemplate {
    pub fn new(kind: StageKind, label: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn with_input(mut self, socket: Socket) -> Self {
        self.inputs.push(socket);
        self
    }

    pub fn with_output(mut self, socket: Socket) -> Self {
        self.outputs.push(socket);
        self
    }

    /// Build a fresh stage of this kind.
    pub fn instantiate(&self, variant: Variant) -> Stage {
        Stage {
            id: 0,
            name: self.kind.stage_name(variant),
            kind: self.kind,
            variant,
            inputs: self.inputs.clone(),
            outputs: self.outputs.clone(),
            position: layout_position(self.kind, variant),
            muted: false,
            managed: true,
            image: None,
        }
    }
}

/// Column of each kind in the left-to-right layout.
fn layout_column(kind: StageKind) -> f32 {
    match kind {
        StageKind::CoordinateSource => 0.0,
        StageKind::PlanarTransform => 1.0,
        StageKind::ImageSampler => 2.0,
        StageKind::ExposureAdjust => 3.0,
        StageKind::WarmthAdjust => 3.0,
        StageKind::ContrastAdjust => 4.0,
        StageKind::HueSatAdjust => 5.0,
        StageKind::ChannelSplit => 6.0,
        StageKind::ValueConstant => 6.0,
        StageKind::ThresholdCompare => 7.0,
        StageKind::ChannelCombine => 8.0,
        StageKind::OutputMerge => 9.0,
        StageKind::RayTypeSwitch => 10.0,
        StageKind::FinalOutput => 11.0,
    }
}

const COLUMN_WIDTH: f32 = 200.0;
const BACKGROUND_ROW: f32 = -320.0;

/// Deterministic layout hint for a stage.
pub fn layout_position(kind: StageKind, variant: Variant) -> (f32, f32) {
    let x = layout_column(kind) * COLUMN_WIDTH;
    let mut y = match variant {
        Variant::Foreground => 0.0,
        Variant::Background => BACKGROUND_ROW,
    };
    if kind == StageKind::ValueConstant {
        y -= 160.0;
    }
    (x, y)
}

/// Registry of stage kinds that can be materialized.
#[derive(Debug, Default)]
pub struct StageRegistry {
    templates: HashMap<StageKind, StageTemplate>,
}

impl StageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, template: StageTemplate) {
        self.templates.insert(template.kind, template);
    }

    pub fn get(&self, kind: StageKind) -> Option<&StageTemplate> {
        self.templates.get(&kind)
    }

    /// Return the stage for `(kind, variant)`, creating it if needed.
    ///
    /// An existing stage is returned untouched. Returns the id and whether
    /// the stage was created by this call.
    pub fn get_or_create_stage_tracked(
        &self,
        store: &mut dyn GraphStore,
        kind: StageKind,
        variant: Variant,
    ) -> Result<(StageId, bool)> {
        let template = self.get(kind).ok_or_else(|| GafferError::UnknownStageKind {
            kind: kind.as_str().to_string(),
        })?;

        let name = kind.stage_name(variant);
        let (id, created) =
            store.get_or_create_named_node(&name, &mut || template.instantiate(variant));
        if created {
            debug!("created stage {} ({}) as {}", name, template.label, id);
        }
        Ok((id, created))
    }

    pub fn get_or_create_stage(
        &self,
        store: &mut dyn GraphStore,
        kind: StageKind,
        variant: Variant,
    ) -> Result<StageId> {
        self.get_or_create_stage_tracked(store, kind, variant)
            .map(|(id, _)| id)
    }
}
