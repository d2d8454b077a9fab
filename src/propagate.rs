// src/propagate.rs
//
// Parameter propagation: maps look parameters onto stage socket defaults and
// keeps the mute-at-neutral flags current.

use log::debug;

use crate::error::{GafferError, Result};
use crate::graph::GraphStore;
use crate::stage::{SocketRef, SocketValue, StageId, StageKind, Variant};
use crate::stages::sockets;
use crate::state::{Channel, LookParam, LookParameters};
use crate::topology::TopologyFlags;

/// Background strength multiplier when the background samples the
/// pre-darkened JPG and no separate brightness is set.
pub const DARKENED_JPG_FACTOR: f32 = 20.0;

/// Which component of a vector socket a write replaces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WriteValue {
    Set(SocketValue),
    Component { index: usize, value: f32 },
}

/// One planned socket write.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SocketWrite {
    pub kind: StageKind,
    pub variant: Variant,
    pub socket: usize,
    pub value: WriteValue,
}

fn set(kind: StageKind, variant: Variant, socket: usize, v: f32) -> SocketWrite {
    SocketWrite {
        kind,
        variant,
        socket,
        value: WriteValue::Set(SocketValue::Value(v)),
    }
}

fn mapping_z(socket: usize, v: f32) -> SocketWrite {
    SocketWrite {
        kind: StageKind::PlanarTransform,
        variant: Variant::Foreground,
        socket,
        value: WriteValue::Component { index: 2, value: v },
    }
}

/// Effective background brightness.
fn background_brightness(params: &LookParameters) -> f32 {
    if params.use_separate_brightness {
        params.bg_brightness
    } else if params.use_darkened_jpg {
        params.brightness * DARKENED_JPG_FACTOR
    } else {
        params.brightness
    }
}

/// The socket write carrying one channel into one variant.
pub fn channel_write(ch: Channel, variant: Variant, params: &LookParameters) -> SocketWrite {
    let raw = params.channel(ch, variant);
    match ch {
        Channel::Brightness => {
            let v = match variant {
                Variant::Foreground => params.brightness,
                Variant::Background => background_brightness(params),
            };
            set(StageKind::OutputMerge, variant, sockets::STRENGTH, v)
        }
        Channel::Contrast => set(StageKind::ContrastAdjust, variant, sockets::CONTRAST, raw - 1.0),
        Channel::Saturation => set(StageKind::HueSatAdjust, variant, sockets::SATURATION, raw),
        Channel::Warmth => set(
            StageKind::WarmthAdjust,
            variant,
            sockets::WARMTH,
            (raw - 1.0) * 100.0,
        ),
        Channel::Tint => set(
            StageKind::WarmthAdjust,
            variant,
            sockets::TINT,
            (raw - 1.0) * 100.0,
        ),
    }
}

/// Socket writes implied by a change of `param`, given the current topology.
pub fn writes_for(
    param: LookParam,
    params: &LookParameters,
    flags: TopologyFlags,
) -> Vec<SocketWrite> {
    let mut writes = Vec::new();
    let split = flags.needs_background_split;

    match param {
        LookParam::Rotation => {
            writes.push(mapping_z(sockets::MAP_ROTATION, params.rotation.to_radians()))
        }
        LookParam::HorzShift => writes.push(mapping_z(sockets::MAP_LOCATION, -params.horz_shift)),
        LookParam::HorzExp => writes.push(mapping_z(sockets::MAP_SCALE, params.horz_exp)),
        LookParam::Clamp => {
            if flags.needs_clamp_path {
                writes.push(set(
                    StageKind::ValueConstant,
                    Variant::Foreground,
                    0,
                    params.clamp,
                ));
            }
        }
        LookParam::UseJpgBackground | LookParam::UseDarkenedJpg => {
            if split {
                writes.push(channel_write(Channel::Brightness, Variant::Background, params));
            }
        }
        LookParam::Value(ch) => {
            writes.push(channel_write(ch, Variant::Foreground, params));
            if split {
                writes.push(channel_write(ch, Variant::Background, params));
            }
        }
        LookParam::UseSeparate(ch) | LookParam::Background(ch) => {
            if split {
                writes.push(channel_write(ch, Variant::Background, params));
            }
        }
    }
    writes
}

/// Every socket write needed to bring the graph in line with `params`.
pub fn all_writes(params: &LookParameters, flags: TopologyFlags) -> Vec<SocketWrite> {
    let mut writes = Vec::new();
    for param in [
        LookParam::Rotation,
        LookParam::HorzShift,
        LookParam::HorzExp,
        LookParam::Clamp,
    ] {
        writes.extend(writes_for(param, params, flags));
    }
    for ch in Channel::ALL {
        writes.extend(writes_for(LookParam::Value(ch), params, flags));
    }
    writes
}

/// Resolve and type-check a write against the store without mutating it.
fn plan(store: &dyn GraphStore, w: &SocketWrite) -> Result<(SocketRef, SocketValue)> {
    let name = w.kind.stage_name(w.variant);
    let id = store
        .find_stage(&name)
        .ok_or_else(|| GafferError::StageMissing { name: name.clone() })?;
    let at = SocketRef::new(id, w.socket);
    let current = store.read_socket_default(at)?;

    let value = match w.value {
        WriteValue::Set(v) => v,
        WriteValue::Component { index, value } => match current {
            SocketValue::Vector(mut v) if index < 3 => {
                v[index] = value;
                SocketValue::Vector(v)
            }
            _ => {
                let stage = store.stage(id)?;
                return Err(GafferError::SocketTypeMismatch {
                    stage: stage.name.clone(),
                    socket: stage.input(w.socket)?.name.clone(),
                });
            }
        },
    };

    if value.socket_type() != current.socket_type() {
        let stage = store.stage(id)?;
        return Err(GafferError::SocketTypeMismatch {
            stage: stage.name.clone(),
            socket: stage.input(w.socket)?.name.clone(),
        });
    }
    Ok((at, value))
}

/// Apply a batch of writes all-or-nothing and refresh the mute flag of every
/// touched stage. Returns the touched stage ids.
pub fn apply_writes(store: &mut dyn GraphStore, writes: &[SocketWrite]) -> Result<Vec<StageId>> {
    let planned = writes
        .iter()
        .map(|w| plan(store, w))
        .collect::<Result<Vec<_>>>()?;

    let mut touched: Vec<StageId> = Vec::new();
    for (at, value) in planned {
        store.set_socket_default(at, value)?;
        if !touched.contains(&at.stage) {
            touched.push(at.stage);
        }
    }
    for &id in &touched {
        refresh_mute(store, id)?;
    }
    Ok(touched)
}

/// Push the change of a single parameter into the graph.
pub fn propagate(
    store: &mut dyn GraphStore,
    param: LookParam,
    params: &LookParameters,
    flags: TopologyFlags,
) -> Result<Vec<StageId>> {
    let writes = writes_for(param, params, flags);
    debug!("{} -> {} socket writes", param, writes.len());
    apply_writes(store, &writes)
}

/// Push every parameter into the graph.
pub fn sync_all(
    store: &mut dyn GraphStore,
    params: &LookParameters,
    flags: TopologyFlags,
) -> Result<Vec<StageId>> {
    apply_writes(store, &all_writes(params, flags))
}

// ═══════════════════════════════════════════════════════════════════
// Mute-at-neutral policy
// ═══════════════════════════════════════════════════════════════════

const MAPPING_NEUTRAL: [(usize, SocketValue); 3] = [
    (sockets::MAP_LOCATION, SocketValue::Vector([0.0; 3])),
    (sockets::MAP_ROTATION, SocketValue::Vector([0.0; 3])),
    (sockets::MAP_SCALE, SocketValue::Vector([1.0; 3])),
];

const CONTRAST_NEUTRAL: [(usize, SocketValue); 2] = [
    (sockets::BRIGHT, SocketValue::Value(0.0)),
    (sockets::CONTRAST, SocketValue::Value(0.0)),
];

const HUESAT_NEUTRAL: [(usize, SocketValue); 4] = [
    (sockets::HUE, SocketValue::Value(0.5)),
    (sockets::SATURATION, SocketValue::Value(1.0)),
    (sockets::VALUE, SocketValue::Value(1.0)),
    (sockets::FAC, SocketValue::Value(1.0)),
];

const WARMTH_NEUTRAL: [(usize, SocketValue); 2] = [
    (sockets::WARMTH, SocketValue::Value(0.0)),
    (sockets::TINT, SocketValue::Value(0.0)),
];

const EXPOSURE_NEUTRAL: [(usize, SocketValue); 1] = [(sockets::EXPOSURE, SocketValue::Value(0.0))];

/// Tracked inputs and their neutral values. Kinds with no entry are never
/// muted by the optimization.
pub fn neutral_inputs(kind: StageKind) -> &'static [(usize, SocketValue)] {
    match kind {
        StageKind::PlanarTransform => &MAPPING_NEUTRAL,
        StageKind::ContrastAdjust => &CONTRAST_NEUTRAL,
        StageKind::HueSatAdjust => &HUESAT_NEUTRAL,
        StageKind::WarmthAdjust => &WARMTH_NEUTRAL,
        StageKind::ExposureAdjust => &EXPOSURE_NEUTRAL,
        _ => &[],
    }
}

/// Whether every tracked input of the stage sits at its neutral value.
pub fn is_neutral(store: &dyn GraphStore, id: StageId) -> Result<bool> {
    let stage = store.stage(id)?;
    let tracked = neutral_inputs(stage.kind);
    if tracked.is_empty() {
        return Ok(false);
    }
    for (index, neutral) in tracked {
        if stage.input(*index)?.default_value != *neutral {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Mute the stage iff all its tracked inputs are neutral.
pub fn refresh_mute(store: &mut dyn GraphStore, id: StageId) -> Result<bool> {
    let muted = is_neutral(store, id)?;
    store.set_muted(id, muted)?;
    Ok(muted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ShaderGraph;
    use crate::stage_registry::StageRegistry;
    use crate::stages::register_standard_stages;
    use crate::topology::compute_flags;
    use crate::wiring::ensure_topology;

    fn built(params: &LookParameters) -> (ShaderGraph, TopologyFlags) {
        let mut registry = StageRegistry::new();
        register_standard_stages(&mut registry);
        let mut graph = ShaderGraph::new();
        let flags = compute_flags(params);
        ensure_topology(&mut graph, &registry, flags).unwrap();
        sync_all(&mut graph, params, flags).unwrap();
        (graph, flags)
    }

    fn read(graph: &ShaderGraph, kind: StageKind, variant: Variant, socket: usize) -> SocketValue {
        let id = graph.find_stage(&kind.stage_name(variant)).unwrap();
        graph.read_socket_default(SocketRef::new(id, socket)).unwrap()
    }

    fn muted(graph: &ShaderGraph, kind: StageKind, variant: Variant) -> bool {
        let id = graph.find_stage(&kind.stage_name(variant)).unwrap();
        graph.stage(id).unwrap().muted
    }

    #[test]
    fn test_contrast_is_centered() {
        let mut params = LookParameters::default();
        let (mut graph, flags) = built(&params);

        params.contrast = 1.4;
        propagate(&mut graph, LookParam::Value(Channel::Contrast), &params, flags).unwrap();

        let v = read(&graph, StageKind::ContrastAdjust, Variant::Foreground, sockets::CONTRAST)
            .as_value()
            .unwrap();
        assert!((v - 0.4).abs() < 1e-6);
        assert!(!muted(&graph, StageKind::ContrastAdjust, Variant::Foreground));
    }

    #[test]
    fn test_warmth_and_tint_scale() {
        let mut params = LookParameters::default();
        params.warmth = 1.25;
        params.tint = 0.5;
        let (graph, _) = built(&params);

        let warmth = read(&graph, StageKind::WarmthAdjust, Variant::Foreground, sockets::WARMTH)
            .as_value()
            .unwrap();
        let tint = read(&graph, StageKind::WarmthAdjust, Variant::Foreground, sockets::TINT)
            .as_value()
            .unwrap();
        assert!((warmth - 25.0).abs() < 1e-4);
        assert!((tint + 50.0).abs() < 1e-4);
    }

    #[test]
    fn test_darkened_background_brightness() {
        let mut params = LookParameters::default();
        params.use_darkened_jpg = true;
        let (mut graph, flags) = built(&params);
        assert!(flags.needs_background_split);

        params.brightness = 2.0;
        propagate(&mut graph, LookParam::Value(Channel::Brightness), &params, flags).unwrap();

        assert_eq!(
            read(&graph, StageKind::OutputMerge, Variant::Foreground, sockets::STRENGTH),
            SocketValue::Value(2.0)
        );
        assert_eq!(
            read(&graph, StageKind::OutputMerge, Variant::Background, sockets::STRENGTH),
            SocketValue::Value(40.0)
        );
    }

    #[test]
    fn test_separate_brightness_beats_darkened_factor() {
        let mut params = LookParameters::default();
        params.use_darkened_jpg = true;
        params.use_separate_brightness = true;
        params.bg_brightness = 3.0;
        params.brightness = 2.0;
        let (mut graph, flags) = built(&params);

        assert_eq!(
            read(&graph, StageKind::OutputMerge, Variant::Background, sockets::STRENGTH),
            SocketValue::Value(3.0)
        );

        params.brightness = 4.0;
        propagate(&mut graph, LookParam::Value(Channel::Brightness), &params, flags).unwrap();
        propagate(&mut graph, LookParam::UseDarkenedJpg, &params, flags).unwrap();
        assert_eq!(
            read(&graph, StageKind::OutputMerge, Variant::Foreground, sockets::STRENGTH),
            SocketValue::Value(4.0)
        );
        assert_eq!(
            read(&graph, StageKind::OutputMerge, Variant::Background, sockets::STRENGTH),
            SocketValue::Value(3.0)
        );
    }

    #[test]
    fn test_separate_background_override() {
        let mut params = LookParameters::default();
        params.use_separate_saturation = true;
        params.bg_saturation = 0.2;
        params.saturation = 1.5;
        let (graph, _) = built(&params);

        assert_eq!(
            read(&graph, StageKind::HueSatAdjust, Variant::Foreground, sockets::SATURATION),
            SocketValue::Value(1.5)
        );
        assert_eq!(
            read(&graph, StageKind::HueSatAdjust, Variant::Background, sockets::SATURATION),
            SocketValue::Value(0.2)
        );
    }

    #[test]
    fn test_background_falls_back_to_foreground() {
        let mut params = LookParameters::default();
        params.use_separate_contrast = true;
        let (mut graph, flags) = built(&params);

        params.warmth = 1.5;
        propagate(&mut graph, LookParam::Value(Channel::Warmth), &params, flags).unwrap();

        assert_eq!(
            read(&graph, StageKind::WarmthAdjust, Variant::Background, sockets::WARMTH),
            read(&graph, StageKind::WarmthAdjust, Variant::Foreground, sockets::WARMTH)
        );
    }

    #[test]
    fn test_mapping_components() {
        let mut params = LookParameters::default();
        let (mut graph, flags) = built(&params);
        assert!(muted(&graph, StageKind::PlanarTransform, Variant::Foreground));

        params.rotation = 180.0;
        propagate(&mut graph, LookParam::Rotation, &params, flags).unwrap();
        params.horz_exp = 0.5;
        propagate(&mut graph, LookParam::HorzExp, &params, flags).unwrap();

        let rotation = read(&graph, StageKind::PlanarTransform, Variant::Foreground, sockets::MAP_ROTATION)
            .as_vector()
            .unwrap();
        assert!((rotation[2] - std::f32::consts::PI).abs() < 1e-6);
        assert_eq!(
            read(&graph, StageKind::PlanarTransform, Variant::Foreground, sockets::MAP_SCALE),
            SocketValue::Vector([1.0, 1.0, 0.5])
        );
        assert!(!muted(&graph, StageKind::PlanarTransform, Variant::Foreground));

        params.rotation = 0.0;
        params.horz_exp = 1.0;
        propagate(&mut graph, LookParam::Rotation, &params, flags).unwrap();
        propagate(&mut graph, LookParam::HorzExp, &params, flags).unwrap();
        assert!(muted(&graph, StageKind::PlanarTransform, Variant::Foreground));
    }

    #[test]
    fn test_neutral_look_mutes_adjustments() {
        let (graph, _) = built(&LookParameters::default());
        for kind in [
            StageKind::PlanarTransform,
            StageKind::ContrastAdjust,
            StageKind::HueSatAdjust,
            StageKind::WarmthAdjust,
        ] {
            assert!(muted(&graph, kind, Variant::Foreground), "{} not muted", kind);
        }
        assert!(!muted(&graph, StageKind::OutputMerge, Variant::Foreground));
    }

    #[test]
    fn test_failed_plan_writes_nothing() {
        let params = LookParameters::default();
        let (mut graph, _) = built(&params);

        let writes = [
            set(StageKind::ContrastAdjust, Variant::Foreground, sockets::CONTRAST, 0.7),
            set(StageKind::ContrastAdjust, Variant::Background, sockets::CONTRAST, 0.7),
        ];
        let err = apply_writes(&mut graph, &writes).unwrap_err();
        assert!(matches!(err, GafferError::StageMissing { ref name } if name == "HDRI_Contrast_BG"));
        assert_eq!(
            read(&graph, StageKind::ContrastAdjust, Variant::Foreground, sockets::CONTRAST),
            SocketValue::Value(0.0)
        );
    }

    #[test]
    fn test_clamp_value_written_only_with_path() {
        let mut params = LookParameters::default();
        params.clamp = 8.0;
        let (graph, flags) = built(&params);
        assert!(flags.needs_clamp_path);
        assert_eq!(
            read(&graph, StageKind::ValueConstant, Variant::Foreground, 0),
            SocketValue::Value(8.0)
        );

        assert!(writes_for(LookParam::Clamp, &LookParameters::default(), TopologyFlags::default()).is_empty());
    }
}
