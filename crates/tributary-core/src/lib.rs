#![forbid(unsafe_code)]

//! Flow graph model for Sankey diagrams (headless).
//!
//! This crate owns everything that happens before geometry exists:
//! - the serde data model (`FlowData`, `FlowNode`, `FlowLink`)
//! - validation into an index-based [`FlowGraph`]
//! - link-weight normalization ([`normalize()`])
//! - CSV input and the JSON-valued [`FlowConfig`]
//!
//! Layout and rendering live in `tributary-render`.

pub mod config;
pub mod csv;
pub mod error;
pub mod model;
pub mod normalize;

pub use config::FlowConfig;
pub use error::{Error, Result};
pub use model::{FlowData, FlowGraph, FlowLink, FlowNode, IndexedLink, NodeAlign};
pub use normalize::{DAYS_PER_MONTH, Interval, NormalizeOptions, normalize};
