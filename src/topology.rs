// src/topology.rs
//
// Topology selection and the edge policy table.
//
// `required_edges` is the single source of truth for which links exist for
// a given set of flags and whether each one is authoritative (re-asserted on
// every update) or advisory (created once, then left to the user).

use crate::stage::{StageKind, Variant};
use crate::stages::sockets;
use crate::state::LookParameters;

/// Optional branches the graph needs this cycle. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TopologyFlags {
    pub needs_background_split: bool,
    pub needs_clamp_path: bool,
}

/// Decide which optional branches must exist.
pub fn compute_flags(params: &LookParameters) -> TopologyFlags {
    let any_separate = params.use_separate_brightness
        || params.use_separate_contrast
        || params.use_separate_saturation
        || params.use_separate_warmth
        || params.use_separate_tint;

    TopologyFlags {
        needs_background_split: params.substitutes_background_image() || any_separate,
        needs_clamp_path: params.clamp > 0.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgePolicy {
    /// Always reflects the current topology.
    Authoritative,
    /// Created once; a user's link into the destination is preserved.
    Advisory,
}

/// One socket on a stage identified by kind and variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageSocket {
    pub kind: StageKind,
    pub variant: Variant,
    pub socket: usize,
}

const fn at(kind: StageKind, variant: Variant, socket: usize) -> StageSocket {
    StageSocket {
        kind,
        variant,
        socket,
    }
}

/// A required link and its policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeSpec {
    pub from: StageSocket,
    pub to: StageSocket,
    pub policy: EdgePolicy,
}

fn edge(from: StageSocket, to: StageSocket, policy: EdgePolicy) -> EdgeSpec {
    EdgeSpec { from, to, policy }
}

use EdgePolicy::{Advisory, Authoritative};
use StageKind::*;
use Variant::{Background, Foreground};

/// Color chain from the image sampler to the output merge of one variant.
fn color_chain(v: Variant, clamp: bool, edges: &mut Vec<EdgeSpec>) {
    edges.push(edge(
        at(PlanarTransform, Foreground, sockets::MAP_VECTOR),
        at(ImageSampler, v, sockets::IMAGE_VECTOR),
        Authoritative,
    ));
    edges.push(edge(
        at(ImageSampler, v, sockets::IMAGE_COLOR),
        at(WarmthAdjust, v, sockets::COLOR_IN),
        Authoritative,
    ));
    edges.push(edge(
        at(WarmthAdjust, v, sockets::COLOR_OUT),
        at(ContrastAdjust, v, sockets::COLOR_IN),
        Authoritative,
    ));
    edges.push(edge(
        at(ContrastAdjust, v, sockets::COLOR_OUT),
        at(HueSatAdjust, v, sockets::HUESAT_COLOR),
        Authoritative,
    ));

    if clamp {
        edges.extend([
            edge(
                at(HueSatAdjust, v, sockets::COLOR_OUT),
                at(ChannelSplit, v, sockets::COLOR_IN),
                Authoritative,
            ),
            edge(
                at(ChannelSplit, v, sockets::SPLIT_H),
                at(ChannelCombine, v, sockets::COMBINE_H),
                Authoritative,
            ),
            edge(
                at(ChannelSplit, v, sockets::SPLIT_S),
                at(ChannelCombine, v, sockets::COMBINE_S),
                Authoritative,
            ),
            edge(
                at(ChannelSplit, v, sockets::SPLIT_V),
                at(ThresholdCompare, v, sockets::THRESHOLD_VALUE),
                Authoritative,
            ),
            edge(
                at(ValueConstant, Foreground, sockets::CONSTANT_OUT),
                at(ThresholdCompare, v, sockets::THRESHOLD_LIMIT),
                Authoritative,
            ),
            edge(
                at(ThresholdCompare, v, sockets::THRESHOLD_OUT),
                at(ChannelCombine, v, sockets::COMBINE_V),
                Authoritative,
            ),
            edge(
                at(ChannelCombine, v, sockets::COLOR_OUT),
                at(OutputMerge, v, sockets::MERGE_COLOR),
                Authoritative,
            ),
        ]);
    } else {
        edges.push(edge(
            at(HueSatAdjust, v, sockets::COLOR_OUT),
            at(OutputMerge, v, sockets::MERGE_COLOR),
            Authoritative,
        ));
    }
}

/// Every link the graph must have for `flags`, in dependency order.
pub fn required_edges(flags: TopologyFlags) -> Vec<EdgeSpec> {
    let mut edges = vec![edge(
        at(CoordinateSource, Foreground, sockets::GENERATED),
        at(PlanarTransform, Foreground, sockets::MAP_VECTOR),
        Advisory,
    )];

    color_chain(Foreground, flags.needs_clamp_path, &mut edges);

    if flags.needs_background_split {
        color_chain(Background, flags.needs_clamp_path, &mut edges);
        edges.extend([
            edge(
                at(OutputMerge, Foreground, sockets::MERGE_OUT),
                at(RayTypeSwitch, Foreground, sockets::SWITCH_FOREGROUND),
                Authoritative,
            ),
            edge(
                at(OutputMerge, Background, sockets::MERGE_OUT),
                at(RayTypeSwitch, Foreground, sockets::SWITCH_BACKGROUND),
                Authoritative,
            ),
            edge(
                at(RayTypeSwitch, Foreground, sockets::SWITCH_OUT),
                at(FinalOutput, Foreground, sockets::SURFACE),
                Advisory,
            ),
        ]);
    } else {
        edges.push(edge(
            at(OutputMerge, Foreground, sockets::MERGE_OUT),
            at(FinalOutput, Foreground, sockets::SURFACE),
            Advisory,
        ));
    }

    edges
}

/// Whether `from -> to` is a link some topology would lay out. Links that
/// fail this test were made by someone other than the look.
pub fn is_topology_edge(from: StageSocket, to: StageSocket) -> bool {
    [false, true].into_iter().any(|split| {
        [false, true].into_iter().any(|clamp| {
            let flags = TopologyFlags {
                needs_background_split: split,
                needs_clamp_path: clamp,
            };
            required_edges(flags)
                .iter()
                .any(|e| e.from == from && e.to == to)
        })
    })
}

/// Stages referenced by `required_edges`, first appearance first.
pub fn required_stages(flags: TopologyFlags) -> Vec<(StageKind, Variant)> {
    let mut stages: Vec<(StageKind, Variant)> = Vec::new();
    for e in required_edges(flags) {
        for s in [e.from, e.to] {
            if !stages.contains(&(s.kind, s.variant)) {
                stages.push((s.kind, s.variant));
            }
        }
    }
    stages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_look_is_minimal() {
        let flags = compute_flags(&LookParameters::default());
        assert_eq!(flags, TopologyFlags::default());
    }

    #[test]
    fn test_each_override_flips_only_split() {
        let setters: [fn(&mut LookParameters); 7] = [
            |p| p.use_separate_brightness = true,
            |p| p.use_separate_contrast = true,
            |p| p.use_separate_saturation = true,
            |p| p.use_separate_warmth = true,
            |p| p.use_separate_tint = true,
            |p| p.use_jpg_background = true,
            |p| p.use_darkened_jpg = true,
        ];
        for setter in setters {
            let mut params = LookParameters::default();
            setter(&mut params);
            let flags = compute_flags(&params);
            assert!(flags.needs_background_split);
            assert!(!flags.needs_clamp_path);
        }
    }

    #[test]
    fn test_clamp_flag() {
        let mut params = LookParameters::default();
        params.clamp = 4.0;
        let flags = compute_flags(&params);
        assert!(flags.needs_clamp_path);
        assert!(!flags.needs_background_split);
    }

    #[test]
    fn test_minimal_stage_set() {
        let stages = required_stages(TopologyFlags::default());
        assert_eq!(
            stages,
            vec![
                (CoordinateSource, Foreground),
                (PlanarTransform, Foreground),
                (ImageSampler, Foreground),
                (WarmthAdjust, Foreground),
                (ContrastAdjust, Foreground),
                (HueSatAdjust, Foreground),
                (OutputMerge, Foreground),
                (FinalOutput, Foreground),
            ]
        );
    }

    #[test]
    fn test_split_and_clamp_stage_set() {
        let stages = required_stages(TopologyFlags {
            needs_background_split: true,
            needs_clamp_path: true,
        });
        assert!(stages.contains(&(ChannelCombine, Background)));
        assert!(stages.contains(&(RayTypeSwitch, Foreground)));
        assert!(!stages.contains(&(ValueConstant, Background)));
        assert!(!stages.contains(&(ExposureAdjust, Foreground)));
    }

    #[test]
    fn test_one_edge_per_destination() {
        let edges = required_edges(TopologyFlags {
            needs_background_split: true,
            needs_clamp_path: true,
        });
        for (i, a) in edges.iter().enumerate() {
            for b in &edges[i + 1..] {
                assert_ne!(a.to, b.to, "two edges into {:?}", a.to);
            }
        }
    }

    #[test]
    fn test_topology_edges_cover_every_flag_set() {
        let huesat_out = at(HueSatAdjust, Foreground, sockets::COLOR_OUT);
        let merge_in = at(OutputMerge, Foreground, sockets::MERGE_COLOR);
        let split_in = at(ChannelSplit, Foreground, sockets::COLOR_IN);
        assert!(is_topology_edge(huesat_out, merge_in));
        assert!(is_topology_edge(huesat_out, split_in));
        assert!(!is_topology_edge(
            at(ContrastAdjust, Foreground, sockets::COLOR_OUT),
            at(WarmthAdjust, Foreground, sockets::COLOR_IN),
        ));
    }

    #[test]
    fn test_only_entry_and_exit_are_advisory() {
        let edges = required_edges(TopologyFlags {
            needs_background_split: true,
            needs_clamp_path: false,
        });
        let advisory: Vec<_> = edges.iter().filter(|e| e.policy == Advisory).collect();
        assert_eq!(advisory.len(), 2);
        assert_eq!(advisory[0].to.kind, PlanarTransform);
        assert_eq!(advisory[1].to.kind, FinalOutput);
    }
}
