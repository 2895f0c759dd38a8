//! Tooltips and click navigation over a built [`Scene`].
//!
//! The host forwards pointer coordinates (in scene units) and a [`Navigator`]; nothing here owns
//! an event loop.

use crate::model::Bounds;
use crate::scene::{ElementRef, FlowPath, Label, Scene, TextAnchor};
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Average glyph advance relative to the font size, used to size label hit boxes.
const LABEL_CHAR_WIDTH_EM: f64 = 0.6;

/// Stands in for `window.location.assign`.
pub trait Navigator {
    fn navigate(&mut self, url: &str);
}

/// Navigator that only remembers where it was sent.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecordingNavigator {
    pub visited: Vec<String>,
}

impl RecordingNavigator {
    pub fn last(&self) -> Option<&str> {
        self.visited.last().map(String::as_str)
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&mut self, url: &str) {
        self.visited.push(url.to_string());
    }
}

pub fn node_tooltip(name: &str, formatted_value: &str) -> String {
    format!("{name}: {formatted_value}")
}

pub fn link_tooltip(source: &str, target: &str, formatted_value: &str) -> String {
    format!("{source} → {target}: {formatted_value}")
}

#[derive(Debug, Clone, PartialEq)]
pub enum HitShape {
    Rect(Bounds),
    /// Stroked curve; a point hits when it lies within half the stroke width of the centre line
    /// and between the two butt caps.
    Band(FlowPath),
}

impl HitShape {
    pub fn contains(&self, x: f64, y: f64) -> bool {
        match self {
            HitShape::Rect(b) => b.contains(x, y),
            HitShape::Band(path) => {
                // Both end tangents are horizontal, so the caps are the vertical lines at the ends.
                let (lo, hi) = (path.sx.min(path.tx), path.sx.max(path.tx));
                (lo..=hi).contains(&x) && path.distance_to(x, y) <= path.stroke_width / 2.0
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HitRegion {
    pub element: ElementRef,
    pub shape: HitShape,
    /// Label boxes navigate but carry no tooltip.
    pub tooltip: Option<String>,
    pub href: Option<String>,
}

/// Hit regions in paint order; later regions sit on top.
#[derive(Debug, Clone, Default)]
pub struct InteractionMap {
    regions: Vec<HitRegion>,
}

impl InteractionMap {
    pub fn from_scene(scene: &Scene) -> Self {
        let mut regions = Vec::with_capacity(scene.nodes.len() * 2 + scene.links.len());
        for n in &scene.nodes {
            regions.push(HitRegion {
                element: ElementRef::Node(n.node),
                shape: HitShape::Rect(Bounds {
                    min_x: n.x,
                    min_y: n.y,
                    max_x: n.x + n.width,
                    max_y: n.y + n.height,
                }),
                tooltip: Some(n.tooltip.clone()),
                href: n.href.clone(),
            });
        }
        for l in &scene.links {
            regions.push(HitRegion {
                element: ElementRef::Link(l.link),
                shape: HitShape::Band(l.clone()),
                tooltip: Some(l.tooltip.clone()),
                href: None,
            });
        }
        for label in &scene.labels {
            regions.push(HitRegion {
                element: ElementRef::Node(label.node),
                shape: HitShape::Rect(label_box(label, scene.font_size)),
                tooltip: None,
                href: label.href.clone(),
            });
        }
        Self { regions }
    }

    pub fn regions(&self) -> &[HitRegion] {
        &self.regions
    }

    /// All regions under the point, topmost first.
    pub fn hits(&self, x: f64, y: f64) -> impl Iterator<Item = &HitRegion> {
        self.regions
            .iter()
            .rev()
            .filter(move |r| r.shape.contains(x, y))
    }

    pub fn hit_test(&self, x: f64, y: f64) -> Option<&HitRegion> {
        self.hits(x, y).next()
    }

    /// Tooltip of the topmost node or link under the point.
    pub fn hover(&self, x: f64, y: f64) -> Option<&str> {
        self.hits(x, y).find_map(|r| r.tooltip.as_deref())
    }

    /// Navigates to the `link` of the node under the point. Returns whether navigation happened.
    pub fn click(&self, x: f64, y: f64, navigator: &mut dyn Navigator) -> bool {
        let Some(href) = self.hits(x, y).find_map(|r| r.href.as_deref()) else {
            return false;
        };
        tracing::debug!(href, "node click");
        navigator.navigate(href);
        true
    }
}

fn label_box(label: &Label, font_size: f64) -> Bounds {
    let width = label.text.chars().count() as f64 * font_size * LABEL_CHAR_WIDTH_EM;
    let (min_x, max_x) = match label.anchor {
        TextAnchor::Start => (label.x, label.x + width),
        TextAnchor::End => (label.x - width, label.x),
    };
    Bounds {
        min_x,
        min_y: label.y - font_size / 2.0,
        max_x,
        max_y: label.y + font_size / 2.0,
    }
}

/// One named series of a bar chart and the page its bars link to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// A click on one bar: the series it belongs to and the period label of its x position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarClick {
    pub series: String,
    pub label: String,
}

/// `"MM/YYYY"` -> `"YYYY-MM"`.
pub fn period_from_label(label: &str) -> Result<String> {
    let invalid = || Error::InvalidPeriodLabel {
        label: label.to_string(),
    };
    let (month, year) = label.trim().split_once('/').ok_or_else(invalid)?;
    if month.len() != 2 || year.len() != 4 {
        return Err(invalid());
    }
    let date = NaiveDate::parse_from_str(&format!("{year}-{month}-01"), "%Y-%m-%d")
        .map_err(|_| invalid())?;
    Ok(date.format("%Y-%m").to_string())
}

pub fn bar_click_url(link: &str, label: &str) -> Result<String> {
    let period = period_from_label(label)?;
    let sep = if link.contains('?') { '&' } else { '?' };
    Ok(format!("{link}{sep}time={period}"))
}

/// Navigates for a bar click. Returns `Ok(false)` when the series is unknown or has no link.
pub fn navigate_bar_click(
    series: &[BarSeries],
    click: &BarClick,
    navigator: &mut dyn Navigator,
) -> Result<bool> {
    let Some(link) = series
        .iter()
        .find(|s| s.name == click.series)
        .and_then(|s| s.link.as_deref())
    else {
        return Ok(false);
    };
    let url = bar_click_url(link, &click.label)?;
    navigator.navigate(&url);
    Ok(true)
}
