// src/wiring.rs
//
// Graph wiring: link creation with keep/force merge semantics, and the
// topology pass that materializes stages and re-validates every edge.

use log::{debug, warn};

use crate::error::{GafferError, Result};
use crate::graph::GraphStore;
use crate::stage::{SocketRef, StageId};
use crate::stage_registry::StageRegistry;
use crate::topology::{
    EdgePolicy, EdgeSpec, StageSocket, TopologyFlags, is_topology_edge, required_edges,
    required_stages,
};

/// What `connect` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// The destination was free and is now linked.
    Created,
    /// The destination was already linked to this source.
    Unchanged,
    /// The destination was linked elsewhere and was left alone.
    Kept,
    /// The previous link into the destination was removed.
    Replaced,
}

/// Link `from` into `to`.
///
/// An already-linked destination is left alone unless `force` is set, in
/// which case its link is replaced.
pub fn connect(
    store: &mut dyn GraphStore,
    from: SocketRef,
    to: SocketRef,
    force: bool,
) -> Result<ConnectOutcome> {
    match store.link_into(to) {
        Some(existing) if existing.from == from => Ok(ConnectOutcome::Unchanged),
        Some(_) if !force => Ok(ConnectOutcome::Kept),
        Some(_) => {
            store.create_link(from, to)?;
            Ok(ConnectOutcome::Replaced)
        }
        None => {
            store.create_link(from, to)?;
            Ok(ConnectOutcome::Created)
        }
    }
}

/// Result of one topology pass.
#[derive(Debug, Default)]
pub struct WiringReport {
    /// Stages materialized by this pass.
    pub created_stages: Vec<StageId>,
    /// Links created or replaced.
    pub changed_links: usize,
    /// Authoritative edges found linked from an unmanaged source.
    pub inconsistencies: Vec<GafferError>,
}

impl WiringReport {
    pub fn changed(&self) -> bool {
        !self.created_stages.is_empty() || self.changed_links > 0
    }
}

fn resolve(store: &dyn GraphStore, s: StageSocket) -> Result<SocketRef> {
    let name = s.kind.stage_name(s.variant);
    let id = store
        .find_stage(&name)
        .ok_or_else(|| GafferError::StageMissing { name: name.clone() })?;
    Ok(SocketRef::new(id, s.socket))
}

/// Whether a link from `source` into `to` is one the look itself lays out
/// under some topology.
fn laid_out_by_look(store: &dyn GraphStore, source: SocketRef, to: StageSocket) -> Result<bool> {
    let stage = store.stage(source.stage)?;
    if !stage.managed {
        return Ok(false);
    }
    let from = StageSocket {
        kind: stage.kind,
        variant: stage.variant,
        socket: source.socket,
    };
    Ok(is_topology_edge(from, to))
}

fn describe(store: &dyn GraphStore, at: SocketRef, output: bool) -> String {
    match store.stage(at.stage) {
        Ok(stage) => {
            let sockets = if output { &stage.outputs } else { &stage.inputs };
            let socket = sockets
                .get(at.socket)
                .map(|s| s.name.as_str())
                .unwrap_or("?");
            format!("{}.{}", stage.name, socket)
        }
        Err(_) => format!("#{}.{}", at.stage, at.socket),
    }
}

/// Apply one edge from the policy table.
///
/// A destination already linked from a managed stage is the synthesizer's
/// own earlier wiring and is always retargeted. A link from an unmanaged
/// stage is kept for advisory edges and overridden for authoritative ones.
/// Overriding any link that no topology would have laid out is reported as
/// an inconsistency.
fn apply_edge(
    store: &mut dyn GraphStore,
    edge: &EdgeSpec,
    report: &mut WiringReport,
) -> Result<()> {
    let from = resolve(store, edge.from)?;
    let to = resolve(store, edge.to)?;

    let existing = store.link_into(to);
    let from_managed = match existing {
        Some(link) => store.stage(link.from.stage)?.managed,
        None => true,
    };

    let force = match edge.policy {
        EdgePolicy::Authoritative => true,
        EdgePolicy::Advisory => from_managed,
    };

    if let Some(link) = existing {
        if force && link.from != from && !laid_out_by_look(store, link.from, edge.to)? {
            let err = GafferError::GraphInconsistent {
                stage: store.stage(to.stage)?.name.clone(),
                socket: store.stage(to.stage)?.input(to.socket)?.name.clone(),
                found: describe(store, link.from, true),
                expected: describe(store, from, true),
            };
            warn!("{}", err);
            report.inconsistencies.push(err);
        }
    }

    match connect(store, from, to, force)? {
        ConnectOutcome::Created | ConnectOutcome::Replaced => {
            debug!(
                "linked {} -> {}",
                describe(store, from, true),
                describe(store, to, false)
            );
            report.changed_links += 1;
        }
        ConnectOutcome::Kept => {
            debug!("kept user link into {}", describe(store, to, false));
        }
        ConnectOutcome::Unchanged => {}
    }
    Ok(())
}

/// Materialize every stage `flags` needs and lay out (or re-validate) all
/// required links.
pub fn ensure_topology(
    store: &mut dyn GraphStore,
    registry: &StageRegistry,
    flags: TopologyFlags,
) -> Result<WiringReport> {
    let mut report = WiringReport::default();

    for (kind, variant) in required_stages(flags) {
        let (id, created) = registry.get_or_create_stage_tracked(store, kind, variant)?;
        if created {
            report.created_stages.push(id);
        }
    }

    for edge in required_edges(flags) {
        apply_edge(store, &edge, &mut report)?;
    }

    Ok(report)
}
