//! Session orchestrator
//!
//! [`Configurator`] owns the configuration, the mapping tables and the
//! private scene copy, and drives every other component once per frame:
//!
//! 1. collect a finished scene load (dropping superseded ones)
//! 2. request a new load when the hull changes
//! 3. run the apply pass if the configuration changed since the last one
//! 4. advance motion and water, re-center and update the camera
//! 5. emit a [`RenderFrame`]
//!
//! All scene mutation for a frame happens before the frame is built, so a
//! frame never shows a half-applied configuration.

use crate::camera::{CameraTransform, EventResponse, InputController, OrbitBounds, OrbitController, PointerEvent};
use crate::config::EngineConfig;
use crate::configuration::{Configuration, OptionCatalog};
use crate::loader::{LoadResult, SceneLoader, SourceRegistry, TextureCache};
use crate::mapping::ConfigurationMapper;
use crate::model::{BaseModelId, WaveMode};
use crate::motion::{BoatPose, MotionAnimator};
use crate::scene::{Material, NodeId, SceneGraph, SceneTemplate};
use crate::settings::MappingTables;
use crate::water::{WaterSurface, WaterUniform};
use keel_core::Vec2;
use smallvec::SmallVec;
use std::time::Duration;
use tokio::runtime::Handle;

/// One visible mesh, ready to draw
#[derive(Clone, Debug)]
pub struct DrawItem {
    pub node: NodeId,
    pub name: String,
    pub render_order: i32,
    pub cast_shadow: bool,
    pub depth_mask: bool,
    /// Resolved material parameters, one per primitive
    pub materials: SmallVec<[Material; 2]>,
}

/// Everything needed to draw one frame
#[derive(Clone, Debug, Default)]
pub struct RenderFrame {
    pub camera: CameraTransform,
    /// Pose of the boat root
    pub pose: BoatPose,
    /// Visible meshes sorted by render order
    pub draws: Vec<DrawItem>,
    /// Water uniform, present in ocean mode while the water is enabled
    pub water: Option<WaterUniform>,
    /// A hull load is in flight; no boat is shown
    pub loading: bool,
}

/// Scene loaded for one hull
struct SceneSession {
    base: BaseModelId,
    scene: SceneGraph,
    mapper: ConfigurationMapper,
}

type BoundsCallback = Box<dyn FnMut(Vec2)>;

/// Configuration session driving the 3D view
pub struct Configurator {
    engine: EngineConfig,
    config: Configuration,
    applied: Option<Configuration>,
    tables: MappingTables,
    catalog: OptionCatalog,
    loader: SceneLoader,
    textures: TextureCache,
    requested: Option<BaseModelId>,
    session: Option<SceneSession>,
    orbit: OrbitController,
    input: InputController,
    wave_mode: Option<WaveMode>,
    water: Option<WaterSurface>,
    environment_stale: bool,
    motion: MotionAnimator,
    bounds_center: Option<Vec2>,
    bounds_listeners: Vec<BoundsCallback>,
}

impl Configurator {
    /// Create a session using the built-in scene sources
    pub fn new(engine: EngineConfig, tables: MappingTables, catalog: OptionCatalog, runtime: Handle) -> Self {
        Self::with_registry(engine, tables, catalog, runtime, SourceRegistry::new())
    }

    pub fn with_registry(
        engine: EngineConfig,
        tables: MappingTables,
        catalog: OptionCatalog,
        runtime: Handle,
        registry: SourceRegistry,
    ) -> Self {
        let loader = SceneLoader::new(runtime, registry, engine.assets.template_cache_size);
        let textures = TextureCache::with_root(engine.assets.texture_dir.clone());
        Self {
            engine,
            config: Configuration::default(),
            applied: None,
            tables,
            catalog,
            loader,
            textures,
            requested: None,
            session: None,
            orbit: OrbitController::default(),
            input: InputController::default(),
            wave_mode: None,
            water: None,
            environment_stale: false,
            motion: MotionAnimator::new(),
            bounds_center: None,
            bounds_listeners: Vec::new(),
        }
    }

    pub fn configuration(&self) -> &Configuration {
        &self.config
    }

    /// Mutable access; changes take effect on the next frame
    pub fn configuration_mut(&mut self) -> &mut Configuration {
        &mut self.config
    }

    pub fn set_configuration(&mut self, config: Configuration) {
        self.config = config;
    }

    pub fn tables(&self) -> &MappingTables {
        &self.tables
    }

    /// Mutable tables for in-session overrides
    ///
    /// Forces a full re-apply and picks up environment changes on the next
    /// frame.
    pub fn tables_mut(&mut self) -> &mut MappingTables {
        self.applied = None;
        self.environment_stale = true;
        &mut self.tables
    }

    pub fn catalog(&self) -> &OptionCatalog {
        &self.catalog
    }

    pub fn engine_config(&self) -> &EngineConfig {
        &self.engine
    }

    /// Scene of the current hull, once loaded
    pub fn scene(&self) -> Option<&SceneGraph> {
        self.session.as_ref().map(|s| &s.scene)
    }

    pub fn orbit(&self) -> &OrbitController {
        &self.orbit
    }

    pub fn input(&self) -> &InputController {
        &self.input
    }

    pub fn water(&self) -> Option<&WaterSurface> {
        self.water.as_ref()
    }

    pub fn loader(&self) -> &SceneLoader {
        &self.loader
    }

    /// Horizontal bounds center of the loaded hull
    pub fn bounds_center(&self) -> Option<Vec2> {
        self.bounds_center
    }

    /// Register a callback for the hull's horizontal bounds center
    ///
    /// Called once per loaded hull. Registering after a hull is loaded
    /// reports the current center immediately.
    pub fn on_bounds_center(&mut self, mut callback: impl FnMut(Vec2) + 'static) {
        if let Some(center) = self.bounds_center {
            callback(center);
        }
        self.bounds_listeners.push(Box::new(callback));
    }

    /// Serve a hull from memory instead of its asset file
    pub fn preload(&mut self, base: BaseModelId, template: SceneTemplate) {
        self.loader.preload(self.engine.model_path(base), template);
    }

    /// Route a pointer event to the camera
    pub fn handle_pointer(&mut self, event: PointerEvent) -> EventResponse {
        self.input.handle(event, &mut self.orbit)
    }

    /// Block until the current hull is loaded, for headless use
    pub fn wait_for_scene(&mut self, timeout: Duration) -> bool {
        self.request_hull();
        if let Some(done) = self.loader.wait(timeout) {
            self.integrate(done);
        }
        self.session.is_some()
    }

    /// Advance by `dt` seconds and produce the next frame
    pub fn frame(&mut self, dt: f32) -> RenderFrame {
        if let Some(done) = self.loader.poll() {
            self.integrate(done);
        }
        self.request_hull();
        self.sync_wave_mode();
        self.sync_environment();
        self.apply_if_changed();

        self.motion.advance(dt);
        if let Some(water) = self.water.as_mut() {
            water.advance(dt);
        }
        if let Some(center) = self.bounds_center {
            self.orbit.recenter(center);
        }
        let camera = self.orbit.update();

        RenderFrame {
            camera,
            pose: self.motion.pose(self.config.wave_mode),
            draws: self.draw_list(),
            water: self
                .water
                .as_ref()
                .filter(|w| w.is_enabled())
                .map(WaterSurface::uniform),
            loading: self.loader.is_pending(),
        }
    }

    /// Ask for the configured hull if it is neither loaded nor requested
    fn request_hull(&mut self) {
        let base = self.config.model.base();
        if self.requested == Some(base) {
            return;
        }
        if self.session.as_ref().is_some_and(|s| s.base != base) {
            // No boat while the new hull loads
            self.session = None;
            self.bounds_center = None;
        }
        self.requested = Some(base);
        self.applied = None;
        let path = self.engine.model_path(base);
        let ticket = self.loader.request(&path);
        tracing::info!(model = %self.config.model, path = %path.display(), ticket = ticket.id(), "loading hull");
    }

    fn integrate(&mut self, done: LoadResult) {
        let Some(base) = self.requested else {
            return;
        };
        let template = match done.result {
            Ok(template) => template,
            Err(err) => {
                tracing::error!(path = %done.path.display(), %err, "hull failed to load, showing empty scene");
                self.session = None;
                self.bounds_center = None;
                return;
            }
        };

        let mut scene = SceneGraph::instantiate(&template);
        let mapper = ConfigurationMapper::new(&mut scene, self.engine.descriptor(base));
        self.bounds_center = scene.horizontal_center();
        tracing::info!(hull = %base, nodes = scene.node_count(), center = ?self.bounds_center, "hull ready");

        self.session = Some(SceneSession { base, scene, mapper });
        self.applied = None;
        if let Some(center) = self.bounds_center {
            for listener in self.bounds_listeners.iter_mut() {
                listener(center);
            }
        }
    }

    fn sync_wave_mode(&mut self) {
        let mode = self.config.wave_mode;
        if self.wave_mode == Some(mode) {
            return;
        }
        self.wave_mode = Some(mode);
        self.orbit.set_bounds(OrbitBounds::for_wave_mode(mode));

        self.water = match mode {
            WaveMode::Ocean => {
                let mut water = WaterSurface::from_environment(self.tables.environment());
                if let Some(name) = self.engine.water.normals_texture.as_deref() {
                    water.set_normals(self.textures.get_or_load(name));
                }
                Some(water)
            }
            WaveMode::DryDock => None,
        };
        tracing::debug!(mode = mode.as_str(), "wave mode changed");
    }

    fn sync_environment(&mut self) {
        if !std::mem::take(&mut self.environment_stale) {
            return;
        }
        if let Some(water) = self.water.as_mut() {
            water.set_environment(self.tables.environment());
            tracing::debug!(radius = water.radius(), "water rebuilt from environment");
        }
    }

    fn apply_if_changed(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if self.applied.as_ref() == Some(&self.config) {
            return;
        }
        session
            .mapper
            .apply_configuration(&mut session.scene, &self.config, &self.tables, &self.catalog);
        self.applied = Some(self.config.clone());
    }

    fn draw_list(&self) -> Vec<DrawItem> {
        let Some(session) = self.session.as_ref() else {
            return Vec::new();
        };
        let scene = &session.scene;
        let mut draws: Vec<DrawItem> = scene
            .nodes()
            .filter(|(_, node)| node.is_mesh() && node.visible)
            .map(|(id, node)| DrawItem {
                node: id,
                name: node.name.clone(),
                render_order: node.render_order,
                cast_shadow: node.cast_shadow,
                depth_mask: node.depth_mask,
                materials: node
                    .materials
                    .iter()
                    .filter_map(|&m| scene.material(m).cloned())
                    .collect(),
            })
            .collect();
        draws.sort_by_key(|d| d.render_order);
        draws
    }
}
