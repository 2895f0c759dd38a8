//! The boundary between the renderer and the page that embeds it.
//!
//! A browser binding implements [`Document`] and [`Container`] over real elements; tests and the
//! CLI use [`HeadlessDocument`].

use crate::interaction::InteractionMap;
use crate::scene::Scene;
use rustc_hash::FxHashMap;

/// Everything one render leaves behind in its container.
#[derive(Debug, Clone)]
pub struct DrawnSurface {
    pub svg: String,
    pub scene: Scene,
    pub interactions: InteractionMap,
}

pub trait Container {
    /// Current pixel size `(width, height)`; read once per render.
    fn size(&self) -> (f64, f64);

    /// Drops whatever an earlier render drew and installs `surface`.
    fn replace_children(&mut self, surface: DrawnSurface);
}

pub trait Document {
    fn container_mut(&mut self, id: &str) -> Option<&mut dyn Container>;
}

#[derive(Debug, Clone)]
pub struct HeadlessContainer {
    width: f64,
    height: f64,
    surface: Option<DrawnSurface>,
    renders: usize,
}

impl HeadlessContainer {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            surface: None,
            renders: 0,
        }
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    pub fn surface(&self) -> Option<&DrawnSurface> {
        self.surface.as_ref()
    }

    /// Number of times the contents were replaced.
    pub fn render_count(&self) -> usize {
        self.renders
    }
}

impl Container for HeadlessContainer {
    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn replace_children(&mut self, surface: DrawnSurface) {
        self.surface = Some(surface);
        self.renders += 1;
    }
}

/// In-memory page: containers keyed by element id.
#[derive(Debug, Clone, Default)]
pub struct HeadlessDocument {
    containers: FxHashMap<String, HeadlessContainer>,
}

impl HeadlessDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_container(mut self, id: impl Into<String>, width: f64, height: f64) -> Self {
        self.insert_container(id, width, height);
        self
    }

    pub fn insert_container(&mut self, id: impl Into<String>, width: f64, height: f64) {
        self.containers
            .insert(id.into(), HeadlessContainer::new(width, height));
    }

    pub fn container(&self, id: &str) -> Option<&HeadlessContainer> {
        self.containers.get(id)
    }

    pub fn headless_container_mut(&mut self, id: &str) -> Option<&mut HeadlessContainer> {
        self.containers.get_mut(id)
    }
}

impl Document for HeadlessDocument {
    fn container_mut(&mut self, id: &str) -> Option<&mut dyn Container> {
        self.containers
            .get_mut(id)
            .map(|c| c as &mut dyn Container)
    }
}
