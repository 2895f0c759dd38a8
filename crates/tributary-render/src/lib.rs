#![forbid(unsafe_code)]

//! Headless layout + rendering for Sankey flow diagrams.
//!
//! The pipeline is linear and stateless:
//! [`layout::layout_flow`] -> [`color::ColorAssigner`] -> [`scene::build_scene`] ->
//! [`svg::render_svg`] / [`interaction::InteractionMap`]. Nothing here touches a live DOM; the
//! [`host`] module describes the boundary a page (or a test) implements.

pub mod color;
pub mod format;
pub mod host;
pub mod interaction;
pub mod layout;
pub mod model;
pub mod scene;
pub mod svg;

pub use color::{ColorAssigner, Palette};
pub use format::{GroupedFormatter, ValueFormatter};
pub use host::{Container, Document, DrawnSurface, HeadlessContainer, HeadlessDocument};
pub use interaction::{
    BarClick, BarSeries, InteractionMap, Navigator, RecordingNavigator, bar_click_url,
    navigate_bar_click,
};
pub use layout::{LayoutExtent, LayoutOptions, layout_flow};
pub use model::{Bounds, FlowLayout, PositionedLink, PositionedNode};
pub use scene::{LinkColorMode, Scene, SceneOptions, build_scene};
pub use svg::{SvgRenderOptions, render_svg};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] tributary_core::Error),
    #[error("invalid layout options: {message}")]
    InvalidLayout { message: String },
    #[error("unknown {key} option {value:?}")]
    UnknownOption { key: &'static str, value: String },
    #[error("container element {id:?} not found; the host page must provide it before rendering")]
    MissingContainer { id: String },
    #[error("bar label {label:?} is not a MM/YYYY period")]
    InvalidPeriodLabel { label: String },
}

pub type Result<T> = std::result::Result<T, Error>;
