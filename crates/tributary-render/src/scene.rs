//! Backend-agnostic drawing commands for a laid-out flow diagram.
//!
//! A [`Scene`] owns everything a backend needs: geometry, resolved paints, label text and the
//! tooltip/navigation payload of every element. Backends (SVG, raster, canvas) only translate.

use crate::color::{ColorAssigner, NEUTRAL_LINK_COLOR, Palette};
use crate::format::ValueFormatter;
use crate::interaction::{link_tooltip, node_tooltip};
use crate::model::FlowLayout;
use crate::{Error, Result};
use serde::Serialize;
use std::str::FromStr;
use tributary_core::FlowConfig;

/// How link strokes are colored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkColorMode {
    /// Linear gradient from the source node color to the target node color.
    #[default]
    Gradient,
    Source,
    Target,
    /// Neutral gray.
    None,
}

impl FromStr for LinkColorMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gradient" | "path" => Ok(Self::Gradient),
            "source" | "input" => Ok(Self::Source),
            "target" | "output" => Ok(Self::Target),
            "none" => Ok(Self::None),
            _ => Err(Error::UnknownOption {
                key: "linkColor",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneOptions {
    pub link_color: LinkColorMode,
    pub palette: Palette,
    /// Append the formatted node value to labels.
    pub show_values: bool,
    pub label_offset: f64,
    pub font_size: f64,
    pub link_opacity: f64,
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self {
            link_color: LinkColorMode::default(),
            palette: Palette::default(),
            show_values: true,
            label_offset: 6.0,
            font_size: 10.0,
            link_opacity: 0.5,
        }
    }
}

impl SceneOptions {
    /// Reads `sankey.linkColor`, `sankey.palette` and `sankey.showValues`.
    pub fn from_config(cfg: &FlowConfig) -> Result<Self> {
        let mut out = Self::default();
        if let Some(mode) = cfg.get_str("sankey.linkColor") {
            out.link_color = mode.parse()?;
        }
        if let Some(palette) = cfg.get_str("sankey.palette") {
            out.palette = palette.parse()?;
        }
        if let Some(show) = cfg.get_bool("sankey.showValues") {
            out.show_values = show;
        }
        Ok(out)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum Paint {
    Solid {
        color: String,
    },
    /// Horizontal gradient in user space between `x1` and `x2`.
    LinearGradient {
        id: String,
        x1: f64,
        x2: f64,
        from: String,
        to: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAnchor {
    Start,
    End,
}

impl TextAnchor {
    pub fn as_str(self) -> &'static str {
        match self {
            TextAnchor::Start => "start",
            TextAnchor::End => "end",
        }
    }
}

/// Which layout element a drawing command belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ElementRef {
    Node(usize),
    Link(usize),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeRect {
    pub node: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub fill: String,
    pub tooltip: String,
    pub href: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowPath {
    pub link: usize,
    /// Source node right edge.
    pub sx: f64,
    pub y0: f64,
    /// Target node left edge.
    pub tx: f64,
    pub y1: f64,
    pub stroke: Paint,
    pub stroke_width: f64,
    pub tooltip: String,
}

impl FlowPath {
    /// x of both control points of the horizontal cubic curve.
    pub fn control_x(&self) -> f64 {
        (self.sx + self.tx) / 2.0
    }

    /// Point on the curve `M sx,y0 C mx,y0 mx,y1 tx,y1` at parameter `t`.
    pub fn point_at(&self, t: f64) -> (f64, f64) {
        let mx = self.control_x();
        let u = 1.0 - t;
        let (b0, b1, b2, b3) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
        let x = b0 * self.sx + (b1 + b2) * mx + b3 * self.tx;
        let y = (b0 + b1) * self.y0 + (b2 + b3) * self.y1;
        (x, y)
    }

    /// Shortest distance from `(x, y)` to the centre line.
    ///
    /// Coarse sampling picks the closest segment, then a golden-section search refines `t`
    /// inside it.
    pub fn distance_to(&self, x: f64, y: f64) -> f64 {
        const SAMPLES: usize = 64;
        let dist2 = |t: f64| {
            let (px, py) = self.point_at(t);
            (px - x).powi(2) + (py - y).powi(2)
        };
        let best = (0..=SAMPLES)
            .map(|i| i as f64 / SAMPLES as f64)
            .min_by(|&a, &b| dist2(a).total_cmp(&dist2(b)))
            .unwrap_or(0.0);

        let step = 1.0 / SAMPLES as f64;
        let (mut lo, mut hi) = ((best - step).max(0.0), (best + step).min(1.0));
        let ratio = (5.0_f64.sqrt() - 1.0) / 2.0;
        for _ in 0..40 {
            let a = hi - ratio * (hi - lo);
            let b = lo + ratio * (hi - lo);
            if dist2(a) < dist2(b) {
                hi = b;
            } else {
                lo = a;
            }
        }
        dist2((lo + hi) / 2.0).sqrt()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Label {
    pub node: usize,
    pub x: f64,
    pub y: f64,
    pub anchor: TextAnchor,
    pub text: String,
    pub href: Option<String>,
}

/// Drawing commands in paint order: node rectangles, then links, then labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    pub width: f64,
    pub height: f64,
    pub font_size: f64,
    pub link_opacity: f64,
    pub nodes: Vec<NodeRect>,
    pub links: Vec<FlowPath>,
    pub labels: Vec<Label>,
}

pub fn build_scene(
    layout: &FlowLayout,
    colors: &mut ColorAssigner,
    formatter: &dyn ValueFormatter,
    options: &SceneOptions,
) -> Scene {
    // Palette slots follow node order, not link order.
    for n in &layout.nodes {
        let _ = colors.color_of(n.color_key());
    }

    let nodes = layout
        .nodes
        .iter()
        .map(|n| NodeRect {
            node: n.index,
            x: n.x0,
            y: n.y0,
            width: n.x1 - n.x0,
            height: n.y1 - n.y0,
            fill: colors.color_of(n.color_key()).to_string(),
            tooltip: node_tooltip(&n.id, &formatter.format(n.value)),
            href: n.link.clone(),
        })
        .collect();

    let links = layout
        .links
        .iter()
        .map(|l| {
            let source = layout.source_of(l);
            let target = layout.target_of(l);
            let stroke = match options.link_color {
                LinkColorMode::Gradient => Paint::LinearGradient {
                    id: format!("link-{}", l.index),
                    x1: source.x1,
                    x2: target.x0,
                    from: colors.color_of(source.color_key()).to_string(),
                    to: colors.color_of(target.color_key()).to_string(),
                },
                LinkColorMode::Source => Paint::Solid {
                    color: colors.color_of(source.color_key()).to_string(),
                },
                LinkColorMode::Target => Paint::Solid {
                    color: colors.color_of(target.color_key()).to_string(),
                },
                LinkColorMode::None => Paint::Solid {
                    color: NEUTRAL_LINK_COLOR.to_string(),
                },
            };
            FlowPath {
                link: l.index,
                sx: source.x1,
                y0: l.y0,
                tx: target.x0,
                y1: l.y1,
                stroke,
                stroke_width: l.stroke_width(),
                tooltip: link_tooltip(&source.id, &target.id, &formatter.format(l.value)),
            }
        })
        .collect();

    let labels = layout
        .nodes
        .iter()
        .map(|n| {
            let (x, anchor) = if n.x0 < layout.width / 2.0 {
                (n.x1 + options.label_offset, TextAnchor::Start)
            } else {
                (n.x0 - options.label_offset, TextAnchor::End)
            };
            let text = if options.show_values {
                format!("{}: {}", n.label_name(), formatter.format(n.value))
            } else {
                n.label_name().to_string()
            };
            Label {
                node: n.index,
                x,
                y: n.center_y(),
                anchor,
                text,
                href: n.link.clone(),
            }
        })
        .collect();

    Scene {
        width: layout.width,
        height: layout.height,
        font_size: options.font_size,
        link_opacity: options.link_opacity,
        nodes,
        links,
        labels,
    }
}
