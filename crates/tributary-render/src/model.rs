use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionedNode {
    pub id: String,
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Longest path from a source node.
    pub depth: usize,
    /// Longest path to a sink node.
    pub height: usize,
    /// Column after alignment.
    pub layer: usize,
    /// `max(value_in, value_out)`.
    pub value: f64,
    pub value_in: f64,
    pub value_out: f64,
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
    /// Outgoing link indices in band order (top to bottom).
    pub source_links: Vec<usize>,
    /// Incoming link indices in band order (top to bottom).
    pub target_links: Vec<usize>,
}

impl PositionedNode {
    pub fn color_key(&self) -> &str {
        self.category.as_deref().unwrap_or(&self.id)
    }

    /// Display name: the last `:`-separated segment, so `Expenses:Food` reads `Food`.
    pub fn label_name(&self) -> &str {
        self.id.rsplit(':').next().unwrap_or(&self.id)
    }

    pub fn center_y(&self) -> f64 {
        (self.y0 + self.y1) / 2.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionedLink {
    pub index: usize,
    /// Index into [`FlowLayout::nodes`].
    pub source: usize,
    /// Index into [`FlowLayout::nodes`].
    pub target: usize,
    pub value: f64,
    /// Band width, `value * ky`.
    pub width: f64,
    /// Band centre at the source node's right edge.
    pub y0: f64,
    /// Band centre at the target node's left edge.
    pub y1: f64,
    /// True when the link closes a cycle and was ignored for depth assignment.
    pub back_edge: bool,
}

impl PositionedLink {
    pub const MIN_STROKE_WIDTH: f64 = 1.0;

    /// Drawn (and hit-tested) width; never thinner than one pixel.
    pub fn stroke_width(&self) -> f64 {
        self.width.max(Self::MIN_STROKE_WIDTH)
    }

    pub fn source_band(&self) -> (f64, f64) {
        (self.y0 - self.width / 2.0, self.y0 + self.width / 2.0)
    }

    pub fn target_band(&self) -> (f64, f64) {
        (self.y1 - self.width / 2.0, self.y1 + self.width / 2.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowLayout {
    /// The drawing extent the layout was computed for.
    pub extent: Bounds,
    /// Overall surface size the extent was derived from.
    pub width: f64,
    pub height: f64,
    pub node_width: f64,
    /// Effective vertical gap between nodes of one column.
    pub node_padding: f64,
    /// Pixels per unit of link value.
    pub ky: f64,
    pub nodes: Vec<PositionedNode>,
    pub links: Vec<PositionedLink>,
}

impl FlowLayout {
    pub fn source_of(&self, link: &PositionedLink) -> &PositionedNode {
        &self.nodes[link.source]
    }

    pub fn target_of(&self, link: &PositionedLink) -> &PositionedNode {
        &self.nodes[link.target]
    }

    pub fn node_by_id(&self, id: &str) -> Option<&PositionedNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn column_count(&self) -> usize {
        self.nodes.iter().map(|n| n.layer + 1).max().unwrap_or(0)
    }
}
