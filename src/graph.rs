// src/graph.rs
//
// Host graph store interface and the in-memory graph that implements it.
//
// The synthesizer only talks to the host through `GraphStore`, so a host
// application can back it with its own node tree. `ShaderGraph` is the
// standalone implementation used by the CLI, the FFI layer, and tests.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::error::{GafferError, Result};
use crate::stage::{Link, SocketRef, SocketValue, Stage, StageId};

/// Operations the core consumes from the host scene graph.
pub trait GraphStore {
    /// Look up a stage by its unique name.
    fn find_stage(&self, name: &str) -> Option<StageId>;

    fn stage(&self, id: StageId) -> Result<&Stage>;

    /// Insert a stage. The store assigns and returns its id.
    fn add_stage(&mut self, stage: Stage) -> StageId;

    /// All stage ids, in ascending order.
    fn stage_ids(&self) -> Vec<StageId>;

    /// The link terminating at an input socket, if any.
    fn link_into(&self, to: SocketRef) -> Option<Link>;

    /// All links leaving an output socket.
    fn list_links_from(&self, from: SocketRef) -> Vec<Link>;

    /// Link an output to an input. Any link already terminating at `to` is
    /// removed and returned.
    fn create_link(&mut self, from: SocketRef, to: SocketRef) -> Result<Option<Link>>;

    /// Remove the link terminating at `to`.
    fn remove_link(&mut self, to: SocketRef) -> Option<Link>;

    fn set_socket_default(&mut self, at: SocketRef, value: SocketValue) -> Result<()>;

    fn read_socket_default(&self, at: SocketRef) -> Result<SocketValue>;

    fn set_muted(&mut self, id: StageId, muted: bool) -> Result<()>;

    fn set_image(&mut self, id: StageId, image: Option<String>) -> Result<()>;

    /// Return the stage named `name`, creating it with `make` if missing.
    /// The flag is true when the stage was created by this call.
    fn get_or_create_named_node(
        &mut self,
        name: &str,
        make: &mut dyn FnMut() -> Stage,
    ) -> (StageId, bool) {
        match self.find_stage(name) {
            Some(id) => (id, false),
            None => (self.add_stage(make()), true),
        }
    }
}

/// In-memory look graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShaderGraph {
    /// All stages, keyed by id
    pub stages: BTreeMap<StageId, Stage>,

    /// All links
    pub links: Vec<Link>,

    /// Next available stage ID
    next_id: StageId,
}

impl ShaderGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter_stages(&self) -> impl Iterator<Item = &Stage> {
        self.stages.values()
    }

    fn stage_mut(&mut self, id: StageId) -> Result<&mut Stage> {
        self.stages
            .get_mut(&id)
            .ok_or(GafferError::StageNotFound { id })
    }

    /// Source stage ids feeding each stage.
    fn incoming(&self) -> BTreeMap<StageId, Vec<StageId>> {
        let mut map: BTreeMap<StageId, Vec<StageId>> = BTreeMap::new();
        for link in &self.links {
            map.entry(link.to.stage).or_default().push(link.from.stage);
        }
        map
    }

    /// Stage evaluation order (Kahn's algorithm). Fails on cycles.
    pub fn evaluation_order(&self) -> Result<Vec<StageId>> {
        let mut in_degree: BTreeMap<StageId, usize> =
            self.stages.keys().map(|&id| (id, 0)).collect();
        let mut out_edges: BTreeMap<StageId, Vec<StageId>> = BTreeMap::new();

        for link in &self.links {
            if let Some(d) = in_degree.get_mut(&link.to.stage) {
                *d += 1;
            }
            out_edges
                .entry(link.from.stage)
                .or_default()
                .push(link.to.stage);
        }

        let mut queue: VecDeque<StageId> = in_degree
            .iter()
            .filter(|&(_, d)| *d == 0)
            .map(|(&id, _)| id)
            .collect();

        let mut order = Vec::with_capacity(self.stages.len());
        while let Some(id) = queue.pop_front() {
            order.push(id);
            if let Some(nexts) = out_edges.get(&id) {
                for next in nexts {
                    if let Some(d) = in_degree.get_mut(next) {
                        *d -= 1;
                        if *d == 0 {
                            queue.push_back(*next);
                        }
                    }
                }
            }
        }

        if order.len() != self.stages.len() {
            return Err(GafferError::Cycle);
        }
        Ok(order)
    }

    /// Every stage that contributes to `start`, including `start` itself.
    pub fn upstream_of(&self, start: StageId) -> Vec<StageId> {
        let incoming = self.incoming();
        let mut visited = Vec::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            if visited.contains(&id) {
                continue;
            }
            visited.push(id);
            if let Some(prevs) = incoming.get(&id) {
                stack.extend(prevs.iter().copied());
            }
        }
        visited.sort_unstable();
        visited
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn check_output(&self, at: SocketRef) -> Result<()> {
        self.stage(at.stage)?.output(at.socket).map(|_| ())
    }
}

impl GraphStore for ShaderGraph {
    fn find_stage(&self, name: &str) -> Option<StageId> {
        self.stages.values().find(|s| s.name == name).map(|s| s.id)
    }

    fn stage(&self, id: StageId) -> Result<&Stage> {
        self.stages.get(&id).ok_or(GafferError::StageNotFound { id })
    }

    fn add_stage(&mut self, mut stage: Stage) -> StageId {
        let id = self.next_id;
        self.next_id += 1;
        stage.id = id;
        self.stages.insert(id, stage);
        id
    }

    fn stage_ids(&self) -> Vec<StageId> {
        self.stages.keys().copied().collect()
    }

    fn link_into(&self, to: SocketRef) -> Option<Link> {
        self.links.iter().find(|l| l.to == to).copied()
    }

    fn list_links_from(&self, from: SocketRef) -> Vec<Link> {
        self.links.iter().filter(|l| l.from == from).copied().collect()
    }

    fn create_link(&mut self, from: SocketRef, to: SocketRef) -> Result<Option<Link>> {
        self.check_output(from)?;
        self.stage(to.stage)?.input(to.socket)?;

        let previous = self.remove_link(to);
        self.links.push(Link { from, to });
        Ok(previous)
    }

    fn remove_link(&mut self, to: SocketRef) -> Option<Link> {
        let pos = self.links.iter().position(|l| l.to == to)?;
        Some(self.links.remove(pos))
    }

    fn set_socket_default(&mut self, at: SocketRef, value: SocketValue) -> Result<()> {
        let stage = self.stage_mut(at.stage)?;
        let name = stage.name.clone();
        let socket = stage
            .inputs
            .get_mut(at.socket)
            .ok_or_else(|| GafferError::SocketOutOfRange {
                stage: name.clone(),
                index: at.socket,
                output: false,
            })?;
        if socket.socket_type() != value.socket_type() {
            return Err(GafferError::SocketTypeMismatch {
                stage: name,
                socket: socket.name.clone(),
            });
        }
        socket.default_value = value;
        Ok(())
    }

    fn read_socket_default(&self, at: SocketRef) -> Result<SocketValue> {
        Ok(self.stage(at.stage)?.input(at.socket)?.default_value)
    }

    fn set_muted(&mut self, id: StageId, muted: bool) -> Result<()> {
        self.stage_mut(id)?.muted = muted;
        Ok(())
    }

    fn set_image(&mut self, id: StageId, image: Option<String>) -> Result<()> {
        self.stage_mut(id)?.image = image;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::{Socket, StageKind, Variant};

    fn pass_stage(name: &str) -> Stage {
        Stage {
            id: 0,
            name: name.to_string(),
            kind: StageKind::ContrastAdjust,
            variant: Variant::Foreground,
            inputs: vec![Socket::color("Color"), Socket::value("Contrast", 0.0)],
            outputs: vec![Socket::color("Color")],
            position: (0.0, 0.0),
            muted: false,
            managed: false,
            image: None,
        }
    }

    #[test]
    fn test_create_link_replaces_existing() {
        let mut g = ShaderGraph::new();
        let a = g.add_stage(pass_stage("a"));
        let b = g.add_stage(pass_stage("b"));
        let c = g.add_stage(pass_stage("c"));

        g.create_link(SocketRef::new(a, 0), SocketRef::new(c, 0)).unwrap();
        let old = g
            .create_link(SocketRef::new(b, 0), SocketRef::new(c, 0))
            .unwrap();

        assert_eq!(old.unwrap().from.stage, a);
        assert_eq!(g.links.len(), 1);
        assert_eq!(g.link_into(SocketRef::new(c, 0)).unwrap().from.stage, b);
    }

    #[test]
    fn test_create_link_checks_sockets() {
        let mut g = ShaderGraph::new();
        let a = g.add_stage(pass_stage("a"));
        let b = g.add_stage(pass_stage("b"));

        let err = g
            .create_link(SocketRef::new(a, 3), SocketRef::new(b, 0))
            .unwrap_err();
        assert!(matches!(err, GafferError::SocketOutOfRange { output: true, .. }));
        assert!(g.links.is_empty());
    }

    #[test]
    fn test_socket_default_type_checked() {
        let mut g = ShaderGraph::new();
        let a = g.add_stage(pass_stage("a"));

        let at = SocketRef::new(a, 1);
        let err = g
            .set_socket_default(at, SocketValue::Vector([0.0; 3]))
            .unwrap_err();
        assert!(matches!(err, GafferError::SocketTypeMismatch { .. }));
        assert_eq!(g.read_socket_default(at).unwrap(), SocketValue::Value(0.0));
    }

    #[test]
    fn test_evaluation_order_and_cycle() {
        let mut g = ShaderGraph::new();
        let a = g.add_stage(pass_stage("a"));
        let b = g.add_stage(pass_stage("b"));
        g.create_link(SocketRef::new(a, 0), SocketRef::new(b, 0)).unwrap();

        assert_eq!(g.evaluation_order().unwrap(), vec![a, b]);
        assert_eq!(g.upstream_of(b), vec![a, b]);

        g.create_link(SocketRef::new(b, 0), SocketRef::new(a, 0)).unwrap();
        assert!(matches!(g.evaluation_order(), Err(GafferError::Cycle)));
    }

    #[test]
    fn test_get_or_create_named_node() {
        let mut g = ShaderGraph::new();
        let (first, created) = g.get_or_create_named_node("a", &mut || pass_stage("a"));
        assert!(created);
        let (second, created) = g.get_or_create_named_node("a", &mut || pass_stage("a"));
        assert!(!created);
        assert_eq!(first, second);
        assert_eq!(g.stages.len(), 1);
    }
}
