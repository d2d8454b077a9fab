// src/look.rs
//
// The look controller: owns the registry, the graph and the declarative
// parameters, and keeps the graph in sync with them.
//
// Two states:
//   Uninitialized  parameters are recorded, the graph is untouched
//   Bound          every accepted change is pushed into the graph

use log::{info, warn};

use crate::catalog::{background_image_path, Catalog, VariantRequest};
use crate::error::{GafferError, Result};
use crate::graph::{GraphStore, ShaderGraph};
use crate::propagate::{propagate, refresh_mute, sync_all};
use crate::stage::{StageKind, Variant};
use crate::stage_registry::StageRegistry;
use crate::stages::register_standard_stages;
use crate::state::{Command, CommandResult, LookParam, LookParameters, ParamValue};
use crate::topology::{compute_flags, TopologyFlags};
use crate::wiring::ensure_topology;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookState {
    Uninitialized,
    Bound,
}

/// Owns one HDRI world graph.
#[derive(Debug)]
pub struct HdriLook<S: GraphStore = ShaderGraph> {
    registry: StageRegistry,
    graph: S,
    params: LookParameters,
    state: LookState,
    image: Option<String>,
    bound_path: Option<String>,
    needs_attention: bool,
}

impl HdriLook<ShaderGraph> {
    pub fn new() -> Self {
        Self::with_store(ShaderGraph::new())
    }
}

impl Default for HdriLook<ShaderGraph> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: GraphStore> HdriLook<S> {
    /// Drive an existing graph store with the standard stage registry.
    pub fn with_store(graph: S) -> Self {
        let mut registry = StageRegistry::new();
        register_standard_stages(&mut registry);
        Self {
            registry,
            graph,
            params: LookParameters::default(),
            state: LookState::Uninitialized,
            image: None,
            bound_path: None,
            needs_attention: false,
        }
    }

    pub fn graph(&self) -> &S {
        &self.graph
    }

    pub fn params(&self) -> &LookParameters {
        &self.params
    }

    pub fn state(&self) -> LookState {
        self.state
    }

    pub fn is_bound(&self) -> bool {
        self.state == LookState::Bound
    }

    /// Logical name of the bound image.
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    /// Catalog path of the bound foreground variant.
    pub fn bound_path(&self) -> Option<&str> {
        self.bound_path.as_deref()
    }

    /// Set when the requested variant was missing and a fallback was bound.
    pub fn needs_attention(&self) -> bool {
        self.needs_attention
    }

    pub fn flags(&self) -> TopologyFlags {
        compute_flags(&self.params)
    }

    // ═══════════════════════════════════════════════════════════════
    // Lifecycle
    // ═══════════════════════════════════════════════════════════════

    /// Bind `name` from the catalog and synthesize the full graph.
    ///
    /// Returns the bound variant path.
    pub fn enable(
        &mut self,
        catalog: &Catalog,
        name: &str,
        request: &VariantRequest,
    ) -> Result<String> {
        let (path, fallback) = resolve_with_fallback(catalog, name, request)?;

        self.image = Some(name.to_string());
        self.bound_path = Some(path.clone());
        self.needs_attention = fallback;
        self.state = LookState::Bound;

        self.resync()?;
        info!("enabled look for {} ({})", name, path);
        Ok(path)
    }

    /// Bind a different image or variant without touching the topology.
    pub fn swap_image(
        &mut self,
        catalog: &Catalog,
        name: &str,
        request: &VariantRequest,
    ) -> Result<String> {
        if !self.is_bound() {
            return Err(GafferError::NotBound);
        }
        let (path, fallback) = resolve_with_fallback(catalog, name, request)?;

        self.image = Some(name.to_string());
        self.bound_path = Some(path.clone());
        self.needs_attention = fallback;
        self.bind_samplers()?;
        info!("bound {} ({})", name, path);
        Ok(path)
    }

    /// Stop driving the graph. Managed stages stay in place, muted.
    pub fn disable(&mut self) -> Result<()> {
        for id in self.graph.stage_ids() {
            if self.graph.stage(id)?.managed {
                self.graph.set_muted(id, true)?;
            }
        }
        self.state = LookState::Uninitialized;
        info!("disabled look");
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════
    // Parameter changes
    // ═══════════════════════════════════════════════════════════════

    /// Apply one parameter change by its UI name.
    pub fn apply(&mut self, name: &str, value: ParamValue) -> Result<()> {
        let param: LookParam = name.parse()?;
        self.apply_param(param, value)
    }

    /// Apply one parameter change. A rejected value leaves both the
    /// parameters and the graph untouched.
    pub fn apply_param(&mut self, param: LookParam, value: ParamValue) -> Result<()> {
        let mut next = self.params.clone();
        next.set(param, value)?;

        if !self.is_bound() {
            self.params = next;
            return Ok(());
        }

        let flags = compute_flags(&next);
        let report = ensure_topology(&mut self.graph, &self.registry, flags)?;
        if report.changed() {
            sync_all(&mut self.graph, &next, flags)?;
        } else {
            propagate(&mut self.graph, param, &next, flags)?;
        }
        self.params = next;

        if report.changed()
            || matches!(param, LookParam::UseJpgBackground | LookParam::UseDarkenedJpg)
        {
            self.bind_samplers()?;
        }
        Ok(())
    }

    /// Replace every parameter at once.
    pub fn set_parameters(&mut self, params: LookParameters) -> Result<()> {
        for param in LookParam::all() {
            LookParameters::validate(param, params.get(param))?;
        }
        self.params = params;
        if self.is_bound() {
            self.resync()?;
        }
        Ok(())
    }

    /// Restore every parameter to its neutral value.
    pub fn reset_look(&mut self) -> Result<()> {
        self.set_parameters(LookParameters::default())
    }

    /// Full synthesis: topology, every socket, every mute flag, images.
    fn resync(&mut self) -> Result<()> {
        let flags = compute_flags(&self.params);
        ensure_topology(&mut self.graph, &self.registry, flags)?;
        sync_all(&mut self.graph, &self.params, flags)?;
        for id in self.graph.stage_ids() {
            if self.graph.stage(id)?.managed {
                refresh_mute(&mut self.graph, id)?;
            }
        }
        self.bind_samplers()
    }

    /// Point the image samplers at the bound variant. The background
    /// sampler takes the substituted JPG when that mode is on.
    fn bind_samplers(&mut self) -> Result<()> {
        let Some(path) = self.bound_path.clone() else {
            return Ok(());
        };

        if let Some(id) = self
            .graph
            .find_stage(&StageKind::ImageSampler.stage_name(Variant::Foreground))
        {
            self.graph.set_image(id, Some(path.clone()))?;
        }

        if let Some(id) = self
            .graph
            .find_stage(&StageKind::ImageSampler.stage_name(Variant::Background))
        {
            let bg = if self.params.substitutes_background_image() {
                background_image_path(&path, self.params.use_darkened_jpg)
            } else {
                path
            };
            self.graph.set_image(id, Some(bg))?;
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════
    // Commands
    // ═══════════════════════════════════════════════════════════════

    /// Process one UI command.
    pub fn handle(&mut self, command: Command, catalog: &Catalog) -> CommandResult {
        let outcome = match command {
            Command::Apply { name, value } => self.apply(&name, value).map(|_| None),
            Command::Enable { image, variant } => {
                self.enable(catalog, &image, &variant).map(Some)
            }
            Command::SwapImage { image, variant } => {
                self.swap_image(catalog, &image, &variant).map(Some)
            }
            Command::Disable => self.disable().map(|_| None),
            Command::ResetLook => self.reset_look().map(|_| None),
        };

        match outcome {
            Ok(Some(bound)) if self.needs_attention => CommandResult::NeedsAttention { bound },
            Ok(_) => CommandResult::Ok,
            Err(e) => CommandResult::Error {
                message: e.to_string(),
            },
        }
    }
}

/// Resolve a variant, falling back to the smallest one when the request
/// cannot be met. The flag is set when the fallback was taken.
fn resolve_with_fallback(
    catalog: &Catalog,
    name: &str,
    request: &VariantRequest,
) -> Result<(String, bool)> {
    match catalog.resolve_variant(name, request) {
        Ok(path) => Ok((path, false)),
        Err(err @ GafferError::VariantNotFound { .. }) if *request != VariantRequest::Smallest => {
            match catalog.resolve_variant(name, &VariantRequest::Smallest) {
                Ok(path) => {
                    warn!("{}; binding {} instead", err, path);
                    Ok((path, true))
                }
                Err(_) => Err(err),
            }
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::{SocketRef, SocketValue};
    use crate::stages::sockets;
    use crate::state::Channel;

    fn catalog() -> Catalog {
        let mut c = Catalog::new();
        c.insert(
            "studio",
            vec!["studio/studio_1k.hdr".to_string(), "studio/studio_4k.hdr".to_string()],
        );
        c
    }

    fn read(look: &HdriLook, kind: StageKind, variant: Variant, socket: usize) -> SocketValue {
        let g = look.graph();
        let id = g.find_stage(&kind.stage_name(variant)).unwrap();
        g.read_socket_default(SocketRef::new(id, socket)).unwrap()
    }

    fn stage_image(look: &HdriLook, variant: Variant) -> Option<String> {
        let g = look.graph();
        let id = g.find_stage(&StageKind::ImageSampler.stage_name(variant)).unwrap();
        g.stage(id).unwrap().image.clone()
    }

    #[test]
    fn test_unbound_apply_only_records() {
        let mut look = HdriLook::new();
        look.apply("hdri_contrast", ParamValue::Float(1.4)).unwrap();
        assert_eq!(look.params().contrast, 1.4);
        assert!(look.graph().stage_ids().is_empty());
    }

    #[test]
    fn test_enable_builds_and_binds() {
        let mut look = HdriLook::new();
        let path = look
            .enable(&catalog(), "studio", &VariantRequest::Smallest)
            .unwrap();
        assert_eq!(path, "studio/studio_1k.hdr");
        assert!(look.is_bound());
        assert!(!look.needs_attention());
        assert_eq!(look.graph().stage_ids().len(), 8);
        assert_eq!(stage_image(&look, Variant::Foreground).as_deref(), Some(path.as_str()));
    }

    #[test]
    fn test_missing_variant_falls_back() {
        let mut look = HdriLook::new();
        let request = VariantRequest::Exact("studio/studio_8k.hdr".to_string());
        let path = look.enable(&catalog(), "studio", &request).unwrap();
        assert_eq!(path, "studio/studio_1k.hdr");
        assert!(look.needs_attention());
    }

    #[test]
    fn test_unknown_image_fails() {
        let mut look = HdriLook::new();
        let err = look
            .enable(&catalog(), "nowhere", &VariantRequest::Biggest)
            .unwrap_err();
        assert!(matches!(err, GafferError::VariantNotFound { .. }));
        assert!(!look.is_bound());
    }

    #[test]
    fn test_invalid_value_leaves_state() {
        let mut look = HdriLook::new();
        look.enable(&catalog(), "studio", &VariantRequest::Smallest)
            .unwrap();
        let before = look.graph().to_json().unwrap();

        assert!(look.apply("hdri_contrast", ParamValue::Float(7.0)).is_err());
        assert!(look.apply("hdri_contrast", ParamValue::Toggle(true)).is_err());
        assert!(matches!(
            look.apply("hdri_sparkle", ParamValue::Float(1.0)),
            Err(GafferError::UnknownParameter { .. })
        ));

        assert_eq!(look.params(), &LookParameters::default());
        assert_eq!(look.graph().to_json().unwrap(), before);
    }

    #[test]
    fn test_darkened_mode_substitutes_background() {
        let mut look = HdriLook::new();
        look.enable(&catalog(), "studio", &VariantRequest::Smallest)
            .unwrap();
        look.apply("hdri_use_darkened_jpg", ParamValue::Toggle(true))
            .unwrap();
        look.apply("hdri_brightness", ParamValue::Float(2.0)).unwrap();

        assert_eq!(
            stage_image(&look, Variant::Background).as_deref(),
            Some("studio/studio_1k_dark.jpg")
        );
        assert_eq!(
            read(&look, StageKind::OutputMerge, Variant::Background, sockets::STRENGTH),
            SocketValue::Value(40.0)
        );

        look.apply("hdri_use_darkened_jpg", ParamValue::Toggle(false))
            .unwrap();
        assert_eq!(
            stage_image(&look, Variant::Background).as_deref(),
            Some("studio/studio_1k.hdr")
        );
    }

    #[test]
    fn test_disable_mutes_and_enable_restores() {
        let mut look = HdriLook::new();
        look.enable(&catalog(), "studio", &VariantRequest::Smallest)
            .unwrap();
        look.apply("hdri_saturation", ParamValue::Float(1.3)).unwrap();

        look.disable().unwrap();
        assert_eq!(look.state(), LookState::Uninitialized);
        assert!(look.graph().iter_stages().all(|s| s.muted));

        look.enable(&catalog(), "studio", &VariantRequest::Smallest)
            .unwrap();
        let huesat = look
            .graph()
            .find_stage(&StageKind::HueSatAdjust.stage_name(Variant::Foreground))
            .unwrap();
        let contrast = look
            .graph()
            .find_stage(&StageKind::ContrastAdjust.stage_name(Variant::Foreground))
            .unwrap();
        assert!(!look.graph().stage(huesat).unwrap().muted);
        assert!(look.graph().stage(contrast).unwrap().muted);
    }

    #[test]
    fn test_swap_requires_binding() {
        let mut look = HdriLook::new();
        assert!(matches!(
            look.swap_image(&catalog(), "studio", &VariantRequest::Biggest),
            Err(GafferError::NotBound)
        ));

        look.enable(&catalog(), "studio", &VariantRequest::Smallest)
            .unwrap();
        let stages = look.graph().stage_ids().len();
        look.swap_image(&catalog(), "studio", &VariantRequest::Biggest)
            .unwrap();
        assert_eq!(look.graph().stage_ids().len(), stages);
        assert_eq!(
            stage_image(&look, Variant::Foreground).as_deref(),
            Some("studio/studio_4k.hdr")
        );
    }

    #[test]
    fn test_handle_commands() {
        let mut look = HdriLook::new();
        let c = catalog();

        let result = look.handle(
            Command::Enable {
                image: "studio".to_string(),
                variant: VariantRequest::Exact("missing.hdr".to_string()),
            },
            &c,
        );
        assert_eq!(
            result,
            CommandResult::NeedsAttention {
                bound: "studio/studio_1k.hdr".to_string()
            }
        );

        let result = look.handle(
            Command::Apply {
                name: "hdri_clamp".to_string(),
                value: ParamValue::Float(-1.0),
            },
            &c,
        );
        assert!(matches!(result, CommandResult::Error { .. }));

        look.apply_param(LookParam::Value(Channel::Tint), ParamValue::Float(1.5))
            .unwrap();
        assert_eq!(look.handle(Command::ResetLook, &c), CommandResult::Ok);
        assert_eq!(look.params(), &LookParameters::default());
        assert_eq!(
            read(&look, StageKind::WarmthAdjust, Variant::Foreground, sockets::TINT),
            SocketValue::Value(0.0)
        );
    }

    #[test]
    fn test_look_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<HdriLook>();
    }
}
