#![forbid(unsafe_code)]

//! `tributary` renders weighted flows between named categories as Sankey diagrams, headless.
//!
//! The data model, validation and normalization are always available (re-exported from
//! `tributary-core`).
//!
//! # Features
//!
//! - `render`: enable layout, SVG rendering and interaction (`tributary::render`)
//! - `raster`: enable PNG/JPG/PDF output via pure-Rust SVG rasterization/conversion

pub use tributary_core::*;

#[cfg(feature = "render")]
pub mod render {
    use std::sync::Arc;
    use tributary_core::{FlowConfig, FlowData, Interval, NodeAlign, NormalizeOptions};

    pub use tributary_render::host::{
        Container, Document, DrawnSurface, HeadlessContainer, HeadlessDocument,
    };
    pub use tributary_render::interaction::{
        BarClick, BarSeries, InteractionMap, Navigator, RecordingNavigator, bar_click_url,
        navigate_bar_click,
    };
    pub use tributary_render::Error as RenderError;
    pub use tributary_render::{
        ColorAssigner, FlowLayout, GroupedFormatter, LayoutOptions, LinkColorMode, Palette,
        Scene, SceneOptions, SvgRenderOptions, ValueFormatter, build_scene, layout_flow,
        render_svg,
    };

    #[cfg(feature = "raster")]
    pub mod raster;

    #[derive(Debug, thiserror::Error)]
    pub enum HeadlessError {
        #[error(transparent)]
        Model(#[from] tributary_core::Error),
        #[error(transparent)]
        Render(#[from] tributary_render::Error),
    }

    pub type Result<T> = std::result::Result<T, HeadlessError>;

    /// Converts an arbitrary string into a conservative SVG `id` token, so several diagrams can
    /// be inlined into one page without their gradient ids colliding.
    ///
    /// Unsupported characters become `-`; ids not starting with an ASCII letter get an `s-`
    /// prefix.
    pub fn sanitize_svg_id(raw: &str) -> String {
        let raw = raw.trim();
        let mut out = String::with_capacity(raw.len() + 2);
        let mut last_dash = false;
        for ch in raw.chars() {
            let ok = ch.is_ascii_alphanumeric() || ch == '_' || ch == '.';
            if ok {
                out.push(ch);
                last_dash = false;
            } else if !last_dash {
                out.push('-');
                last_dash = true;
            }
        }
        let out = out.trim_matches('-');
        if out.is_empty() {
            return "sankey".to_string();
        }
        if out.starts_with(|c: char| c.is_ascii_alphabetic()) {
            out.to_string()
        } else {
            format!("s-{out}")
        }
    }

    /// Configured pipeline: normalize, lay out, color, build the scene, serialize, wire up hit
    /// regions.
    ///
    /// Holds no per-render state; every call starts from the given data and a fresh
    /// [`ColorAssigner`], so rendering the same data twice yields identical output.
    #[derive(Clone)]
    pub struct SankeyRenderer {
        /// Explicit `sankey.*` settings; anything unset falls back to [`FlowConfig::defaults`].
        pub config: FlowConfig,
        pub svg: SvgRenderOptions,
        formatter: Option<Arc<dyn ValueFormatter + Send + Sync>>,
    }

    impl Default for SankeyRenderer {
        fn default() -> Self {
            Self {
                config: FlowConfig::empty_object(),
                svg: SvgRenderOptions::default(),
                formatter: None,
            }
        }
    }

    impl std::fmt::Debug for SankeyRenderer {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("SankeyRenderer")
                .field("config", &self.config)
                .field("svg", &self.svg)
                .field("custom_formatter", &self.formatter.is_some())
                .finish()
        }
    }

    impl SankeyRenderer {
        pub fn new() -> Self {
            Self::default()
        }

        /// Deep-merges `overrides` (a JSON object such as `{"sankey": {"linkColor": "none"}}`)
        /// into the renderer's config.
        pub fn with_config(mut self, overrides: &FlowConfig) -> Self {
            self.config.deep_merge(overrides.as_value());
            self
        }

        pub fn with_diagram_id(mut self, diagram_id: &str) -> Self {
            self.svg.diagram_id = Some(sanitize_svg_id(diagram_id));
            self
        }

        /// Replaces the default grouped-number formatter for labels and tooltips.
        pub fn with_formatter(
            mut self,
            formatter: impl ValueFormatter + Send + Sync + 'static,
        ) -> Self {
            self.formatter = Some(Arc::new(formatter));
            self
        }

        pub fn effective_config(&self) -> FlowConfig {
            let mut cfg = FlowConfig::defaults();
            cfg.deep_merge(self.config.as_value());
            cfg
        }

        /// Surface size from `sankey.width` / `sankey.height`.
        pub fn configured_size(&self) -> (f64, f64) {
            let options = LayoutOptions::from_config(&self.effective_config());
            match options {
                Ok(o) => (o.width, o.height),
                Err(_) => (
                    tributary_render::layout::DEFAULT_WIDTH,
                    tributary_render::layout::DEFAULT_HEIGHT,
                ),
            }
        }

        /// Applies the configured `sankey.interval` to a copy of `data`.
        pub fn normalize(&self, data: &FlowData) -> Result<FlowData> {
            let interval = match self.effective_config().get_str("sankey.interval") {
                Some(s) => s.parse::<Interval>()?,
                None => Interval::default(),
            };
            let options = NormalizeOptions::from_interval(interval, data)?;
            Ok(tributary_core::normalize(data, &options)?)
        }

        /// An explicit `sankey.nodeAlignment` wins over the data's own `align`.
        fn alignment(&self, data: &FlowData) -> Result<NodeAlign> {
            match self.config.get_str("sankey.nodeAlignment") {
                Some(s) => Ok(s.parse::<NodeAlign>()?),
                None => Ok(data.align),
            }
        }

        /// An explicit `sankey.units` wins over the data's own `units`.
        fn units(&self, data: &FlowData) -> Option<String> {
            self.config
                .get_str("sankey.units")
                .map(str::to_string)
                .or_else(|| data.units.clone())
        }

        pub fn layout_sync(&self, data: &FlowData, size: (f64, f64)) -> Result<FlowLayout> {
            let normalized = self.normalize(data)?;
            let graph = normalized.graph()?;
            let options = LayoutOptions::from_config(&self.effective_config())?
                .with_surface(size.0, size.1)
                .with_align(self.alignment(data)?);
            Ok(layout_flow(&graph, &options)?)
        }

        pub fn render_surface_sync(
            &self,
            data: &FlowData,
            size: (f64, f64),
        ) -> Result<DrawnSurface> {
            let layout = self.layout_sync(data, size)?;
            let scene_options = SceneOptions::from_config(&self.effective_config())?;
            let mut colors = ColorAssigner::new(scene_options.palette);
            let scene = match &self.formatter {
                Some(formatter) => {
                    build_scene(&layout, &mut colors, formatter.as_ref(), &scene_options)
                }
                None => {
                    let formatter = GroupedFormatter::new(self.units(data));
                    build_scene(&layout, &mut colors, &formatter, &scene_options)
                }
            };
            let svg = render_svg(&scene, &self.svg);
            let interactions = InteractionMap::from_scene(&scene);
            tracing::debug!(
                nodes = scene.nodes.len(),
                links = scene.links.len(),
                width = scene.width,
                height = scene.height,
                "rendered sankey"
            );
            Ok(DrawnSurface {
                svg,
                scene,
                interactions,
            })
        }

        /// Renders at the configured size.
        pub fn render_svg_sync(&self, data: &FlowData) -> Result<String> {
            Ok(self.render_surface_sync(data, self.configured_size())?.svg)
        }

        /// Renders into the container with id `element_id`, replacing whatever was drawn there.
        ///
        /// The container's size is read once, before layout.
        pub fn render_into(
            &self,
            document: &mut dyn Document,
            element_id: &str,
            data: &FlowData,
        ) -> Result<()> {
            let container = document.container_mut(element_id).ok_or_else(|| {
                tributary_render::Error::MissingContainer {
                    id: element_id.to_string(),
                }
            })?;
            let size = container.size();
            let surface = self.render_surface_sync(data, size)?;
            container.replace_children(surface);
            Ok(())
        }

        #[cfg(feature = "raster")]
        pub fn render_png_sync(
            &self,
            data: &FlowData,
            raster: &raster::RasterOptions,
        ) -> raster::Result<Vec<u8>> {
            raster::svg_to_png(&self.render_svg_sync(data)?, raster)
        }

        #[cfg(feature = "raster")]
        pub fn render_jpeg_sync(
            &self,
            data: &FlowData,
            raster: &raster::RasterOptions,
        ) -> raster::Result<Vec<u8>> {
            raster::svg_to_jpeg(&self.render_svg_sync(data)?, raster)
        }

        #[cfg(feature = "raster")]
        pub fn render_pdf_sync(&self, data: &FlowData) -> raster::Result<Vec<u8>> {
            raster::svg_to_pdf(&self.render_svg_sync(data)?)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn sanitize_svg_id_keeps_safe_ids() {
            assert_eq!(sanitize_svg_id("budget-2024"), "budget-2024");
            assert_eq!(sanitize_svg_id("  my chart!! "), "my-chart");
            assert_eq!(sanitize_svg_id("2024 budget"), "s-2024-budget");
            assert_eq!(sanitize_svg_id("???"), "sankey");
        }

        #[test]
        fn explicit_alignment_overrides_data() {
            let data = FlowData {
                align: NodeAlign::Left,
                ..Default::default()
            };
            assert_eq!(SankeyRenderer::new().alignment(&data).unwrap(), NodeAlign::Left);

            let mut overrides = FlowConfig::empty_object();
            overrides.set_value("sankey.nodeAlignment", serde_json::json!("right"));
            let renderer = SankeyRenderer::new().with_config(&overrides);
            assert_eq!(renderer.alignment(&data).unwrap(), NodeAlign::Right);
        }
    }
}
