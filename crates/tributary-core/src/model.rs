use crate::{Error, Result};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A named entity in the flow diagram.
///
/// The original data producers emit `name` instead of `id`; both spellings are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowNode {
    #[serde(alias = "name")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl FlowNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            category: None,
            link: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    /// Key used for color assignment: the category when present, the id otherwise.
    pub fn color_key(&self) -> &str {
        self.category.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowLink {
    pub source: String,
    pub target: String,
    pub value: f64,
}

impl FlowLink {
    pub fn new(source: impl Into<String>, target: impl Into<String>, value: f64) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            value,
        }
    }
}

/// Placement policy for nodes in the layered grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeAlign {
    Left,
    Right,
    #[default]
    Justify,
    Center,
}

impl NodeAlign {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeAlign::Left => "left",
            NodeAlign::Right => "right",
            NodeAlign::Justify => "justify",
            NodeAlign::Center => "center",
        }
    }
}

impl FromStr for NodeAlign {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "justify" => Ok(Self::Justify),
            "center" => Ok(Self::Center),
            _ => Err(Error::UnknownAlignment {
                value: s.to_string(),
            }),
        }
    }
}

/// The data object handed over by the host: nodes, links and presentation hints.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FlowData {
    #[serde(default)]
    pub nodes: Vec<FlowNode>,
    #[serde(default)]
    pub links: Vec<FlowLink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days: Option<f64>,
    #[serde(default)]
    pub align: NodeAlign,
}

impl FlowData {
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_json_value(value: &serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(serde_json::Value::clone(value))?)
    }

    pub fn graph(&self) -> Result<FlowGraph> {
        FlowGraph::build(self)
    }
}

/// A link whose endpoints are resolved to node indices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexedLink {
    pub source: usize,
    pub target: usize,
    pub value: f64,
}

/// Validated, index-based view of [`FlowData`].
///
/// Construction fails fast on dangling references, duplicate ids and invalid values; everything
/// else (cycles, isolated nodes, zero weights) is accepted and handled by the layout.
#[derive(Debug, Clone)]
pub struct FlowGraph {
    nodes: Vec<FlowNode>,
    links: Vec<IndexedLink>,
}

impl FlowGraph {
    pub fn build(data: &FlowData) -> Result<Self> {
        let mut index_by_id: FxHashMap<&str, usize> = FxHashMap::default();
        for (i, n) in data.nodes.iter().enumerate() {
            if index_by_id.insert(n.id.as_str(), i).is_some() {
                return Err(Error::DuplicateNode { id: n.id.clone() });
            }
        }

        let resolve = |link: usize, id: &str| -> Result<usize> {
            index_by_id
                .get(id)
                .copied()
                .ok_or_else(|| Error::UnknownNode {
                    link,
                    id: id.to_string(),
                })
        };

        let mut links = Vec::with_capacity(data.links.len());
        for (i, l) in data.links.iter().enumerate() {
            let source = resolve(i, &l.source)?;
            let target = resolve(i, &l.target)?;
            if !l.value.is_finite() {
                return Err(Error::NonFiniteValue { link: i });
            }
            if l.value < 0.0 {
                return Err(Error::NegativeValue {
                    link: i,
                    value: l.value,
                });
            }
            links.push(IndexedLink {
                source,
                target,
                value: l.value,
            });
        }

        tracing::debug!(
            nodes = data.nodes.len(),
            links = links.len(),
            "flow graph validated"
        );

        Ok(Self {
            nodes: data.nodes.clone(),
            links,
        })
    }

    pub fn nodes(&self) -> &[FlowNode] {
        &self.nodes
    }

    pub fn links(&self) -> &[IndexedLink] {
        &self.links
    }

    pub fn node(&self, index: usize) -> &FlowNode {
        &self.nodes[index]
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
