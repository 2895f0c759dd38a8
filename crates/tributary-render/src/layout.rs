//! Layered flow layout.
//!
//! Pipeline: back-edge marking, depth/height ranks, column assignment, initial stacking,
//! iterative relaxation with collision resolution, and finally band partitioning.

use crate::model::{Bounds, FlowLayout, PositionedLink, PositionedNode};
use crate::{Error, Result};
use std::cmp::Ordering;
use tributary_core::{FlowConfig, FlowGraph, NodeAlign};

pub const DEFAULT_NODE_WIDTH: f64 = 15.0;
pub const DEFAULT_NODE_PADDING: f64 = 10.0;
pub const DEFAULT_ITERATIONS: usize = 6;
pub const DEFAULT_WIDTH: f64 = 600.0;
pub const DEFAULT_HEIGHT: f64 = 400.0;

const MIN_NODE_HEIGHT: f64 = 1.0;
/// Upper bound on `iterations`; each pass is a full sweep over every column.
pub const MAX_ITERATIONS: usize = 1_000;

/// Pixel rectangle nodes and links are laid out in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutExtent {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl LayoutExtent {
    /// Extent for a `width x height` surface, inset 1px horizontally and 5px vertically so
    /// strokes at the edges stay visible.
    pub fn for_surface(width: f64, height: f64) -> Self {
        let (x0, y0) = (1.0, 5.0);
        Self {
            x0,
            y0,
            x1: (width - 1.0).max(x0),
            y1: (height - 5.0).max(y0),
        }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutOptions {
    /// Surface width the extent was derived from.
    pub width: f64,
    /// Surface height the extent was derived from.
    pub height: f64,
    pub extent: LayoutExtent,
    pub node_width: f64,
    pub node_padding: f64,
    pub align: NodeAlign,
    pub iterations: usize,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self::for_surface(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

impl LayoutOptions {
    pub fn for_surface(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            extent: LayoutExtent::for_surface(width, height),
            node_width: DEFAULT_NODE_WIDTH,
            node_padding: DEFAULT_NODE_PADDING,
            align: NodeAlign::default(),
            iterations: DEFAULT_ITERATIONS,
        }
    }

    /// Reads `sankey.width`, `sankey.height`, `sankey.nodeWidth`, `sankey.nodePadding`,
    /// `sankey.nodeAlignment` and `sankey.iterations`.
    pub fn from_config(cfg: &FlowConfig) -> Result<Self> {
        let width = cfg.get_f64("sankey.width").unwrap_or(DEFAULT_WIDTH);
        let height = cfg.get_f64("sankey.height").unwrap_or(DEFAULT_HEIGHT);
        let align = match cfg.get_str("sankey.nodeAlignment") {
            Some(s) => s.parse::<NodeAlign>()?,
            None => NodeAlign::default(),
        };
        Ok(Self {
            node_width: cfg
                .get_f64("sankey.nodeWidth")
                .unwrap_or(DEFAULT_NODE_WIDTH),
            node_padding: cfg
                .get_f64("sankey.nodePadding")
                .unwrap_or(DEFAULT_NODE_PADDING),
            align,
            iterations: cfg
                .get_f64("sankey.iterations")
                .map(|v| v.max(0.0) as usize)
                .unwrap_or(DEFAULT_ITERATIONS),
            ..Self::for_surface(width, height)
        })
    }

    /// Re-targets the options at a new surface size, keeping everything else.
    pub fn with_surface(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self.extent = LayoutExtent::for_surface(width, height);
        self
    }

    pub fn with_align(mut self, align: NodeAlign) -> Self {
        self.align = align;
        self
    }

    fn validate(&self) -> Result<()> {
        let e = &self.extent;
        let finite = [e.x0, e.y0, e.x1, e.y1, self.node_width, self.node_padding]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(Error::InvalidLayout {
                message: "layout extent and node sizes must be finite".to_string(),
            });
        }
        if e.x1 < e.x0 || e.y1 < e.y0 {
            return Err(Error::InvalidLayout {
                message: format!(
                    "inverted extent [{}, {}] - [{}, {}]",
                    e.x0, e.y0, e.x1, e.y1
                ),
            });
        }
        if self.node_width < 0.0 || self.node_padding < 0.0 {
            return Err(Error::InvalidLayout {
                message: "node width and padding must be non-negative".to_string(),
            });
        }
        if self.iterations > MAX_ITERATIONS {
            return Err(Error::InvalidLayout {
                message: format!(
                    "{} relaxation iterations requested, at most {MAX_ITERATIONS} allowed",
                    self.iterations
                ),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct Node {
    index: usize,
    source_links: Vec<usize>,
    target_links: Vec<usize>,
    value: f64,
    value_in: f64,
    value_out: f64,
    depth: usize,
    height: usize,
    layer: usize,
    x0: f64,
    x1: f64,
    y0: f64,
    y1: f64,
}

#[derive(Debug, Clone)]
struct Link {
    index: usize,
    source: usize,
    target: usize,
    value: f64,
    width: f64,
    y0: f64,
    y1: f64,
    back_edge: bool,
}

/// Vertical frame shared by the relaxation passes.
#[derive(Debug, Clone, Copy)]
struct Frame {
    py: f64,
    y0: f64,
    y1: f64,
}

fn f64_cmp(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

pub fn layout_flow(graph: &FlowGraph, options: &LayoutOptions) -> Result<FlowLayout> {
    options.validate()?;
    let ext = options.extent;
    // A surface narrower than one node still keeps columns left to right.
    let dx = options.node_width.min(ext.width());
    let dy = options.node_padding;

    let mut nodes: Vec<Node> = (0..graph.nodes().len())
        .map(|index| Node {
            index,
            source_links: Vec::new(),
            target_links: Vec::new(),
            value: 0.0,
            value_in: 0.0,
            value_out: 0.0,
            depth: 0,
            height: 0,
            layer: 0,
            x0: 0.0,
            x1: 0.0,
            y0: 0.0,
            y1: 0.0,
        })
        .collect();

    let mut links: Vec<Link> = graph
        .links()
        .iter()
        .enumerate()
        .map(|(index, l)| Link {
            index,
            source: l.source,
            target: l.target,
            value: l.value,
            width: 0.0,
            y0: 0.0,
            y1: 0.0,
            back_edge: false,
        })
        .collect();

    for l in &links {
        nodes[l.source].source_links.push(l.index);
        nodes[l.target].target_links.push(l.index);
    }

    for n in &mut nodes {
        n.value_out = n.source_links.iter().map(|&li| links[li].value).sum();
        n.value_in = n.target_links.iter().map(|&li| links[li].value).sum();
        n.value = n.value_out.max(n.value_in);
    }

    let back_edges = mark_back_edges(&nodes, &mut links);
    if back_edges > 0 {
        tracing::warn!(
            back_edges,
            "flow graph contains cycles; cycle-closing links are ignored for layering"
        );
    }

    let depths = longest_path_ranks(&nodes, &links, true);
    let heights = longest_path_ranks(&nodes, &links, false);
    for (n, (depth, height)) in nodes.iter_mut().zip(depths.into_iter().zip(heights)) {
        n.depth = depth;
        n.height = height;
    }

    let columns = assign_layers(&mut nodes, &links, options.align);
    let column_count = columns.len();
    let kx = if column_count <= 1 {
        0.0
    } else {
        (ext.width() - dx) / (column_count as f64 - 1.0)
    };
    for n in &mut nodes {
        n.x0 = ext.x0 + n.layer as f64 * kx;
        n.x1 = n.x0 + dx;
    }

    let max_len = columns.iter().map(|c| c.len()).max().unwrap_or(0);
    let py = if max_len <= 1 {
        dy
    } else {
        dy.min(ext.height() / (max_len as f64 - 1.0))
    };

    let ky = columns
        .iter()
        .filter_map(|col| column_ky(&nodes, col, ext.height(), py))
        .fold(f64::INFINITY, f64::min);
    let ky = if ky.is_finite() { ky.max(0.0) } else { 0.0 };

    initialize_node_breadths(&mut nodes, &mut links, &columns, ext, py, ky);

    let frame = Frame {
        py,
        y0: ext.y0,
        y1: ext.y1,
    };
    let iterations = options.iterations;
    let mut columns_for_relax = columns.clone();
    for i in 0..iterations {
        let alpha = 0.99_f64.powi(i as i32);
        let beta = (1.0 - alpha).max((i as f64 + 1.0) / iterations as f64);
        relax_right_to_left(&mut nodes, &links, &mut columns_for_relax, frame, alpha, beta);
        relax_left_to_right(&mut nodes, &links, &mut columns_for_relax, frame, alpha, beta);
    }

    compute_link_breadths(&nodes, &mut links);

    tracing::debug!(
        nodes = nodes.len(),
        links = links.len(),
        columns = column_count,
        ky,
        "flow layout computed"
    );

    let layout_nodes = nodes
        .iter()
        .map(|n| {
            let src = graph.node(n.index);
            PositionedNode {
                id: src.id.clone(),
                index: n.index,
                category: src.category.clone(),
                link: src.link.clone(),
                depth: n.depth,
                height: n.height,
                layer: n.layer,
                value: n.value,
                value_in: n.value_in,
                value_out: n.value_out,
                x0: n.x0,
                x1: n.x1,
                y0: n.y0,
                y1: n.y1,
                source_links: n.source_links.clone(),
                target_links: n.target_links.clone(),
            }
        })
        .collect();

    let layout_links = links
        .iter()
        .map(|l| PositionedLink {
            index: l.index,
            source: l.source,
            target: l.target,
            value: l.value,
            width: l.width,
            y0: l.y0,
            y1: l.y1,
            back_edge: l.back_edge,
        })
        .collect();

    Ok(FlowLayout {
        extent: Bounds {
            min_x: ext.x0,
            min_y: ext.y0,
            max_x: ext.x1,
            max_y: ext.y1,
        },
        width: options.width,
        height: options.height,
        node_width: dx,
        node_padding: py,
        ky,
        nodes: layout_nodes,
        links: layout_links,
    })
}

/// Depth-first walk in input order (source-only nodes first); links pointing back into the
/// active path are marked as back edges. Returns the number of links marked.
fn mark_back_edges(nodes: &[Node], links: &mut [Link]) -> usize {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Mark {
        New,
        Active,
        Done,
    }

    let roots: Vec<usize> = nodes
        .iter()
        .filter(|n| n.target_links.is_empty())
        .map(|n| n.index)
        .chain(0..nodes.len())
        .collect();

    let mut mark = vec![Mark::New; nodes.len()];
    let mut stack: Vec<(usize, usize)> = Vec::new();
    let mut count = 0usize;
    for root in roots {
        if mark[root] != Mark::New {
            continue;
        }
        mark[root] = Mark::Active;
        stack.push((root, 0));
        while let Some(top) = stack.last_mut() {
            let node = top.0;
            let Some(&li) = nodes[node].source_links.get(top.1) else {
                mark[node] = Mark::Done;
                stack.pop();
                continue;
            };
            top.1 += 1;
            let target = links[li].target;
            match mark[target] {
                Mark::New => {
                    mark[target] = Mark::Active;
                    stack.push((target, 0));
                }
                Mark::Active => {
                    links[li].back_edge = true;
                    count += 1;
                }
                Mark::Done => {}
            }
        }
    }
    count
}

/// Longest-path rank of every node by breadth-first relaxation over forward links:
/// `downstream` ranks from sources (depth), otherwise from sinks (height).
fn longest_path_ranks(nodes: &[Node], links: &[Link], downstream: bool) -> Vec<usize> {
    let n = nodes.len();
    let mut rank = vec![0usize; n];
    let mut current: Vec<usize> = (0..n).collect();
    let mut next: Vec<usize> = Vec::new();
    let mut next_seen = vec![false; n];
    let mut x = 0usize;
    while !current.is_empty() && x <= n {
        for &node_idx in &current {
            rank[node_idx] = x;
            let adjacent = if downstream {
                &nodes[node_idx].source_links
            } else {
                &nodes[node_idx].target_links
            };
            for &li in adjacent {
                let link = &links[li];
                if link.back_edge {
                    continue;
                }
                let other = if downstream { link.target } else { link.source };
                if !next_seen[other] {
                    next_seen[other] = true;
                    next.push(other);
                }
            }
        }
        x += 1;
        current = std::mem::take(&mut next);
        next_seen.fill(false);
    }
    rank
}

fn assign_layers(nodes: &mut [Node], links: &[Link], align: NodeAlign) -> Vec<Vec<usize>> {
    let column_count = nodes.iter().map(|n| n.depth + 1).max().unwrap_or(1);
    let last = column_count as i64 - 1;
    let mut columns: Vec<Vec<usize>> = vec![Vec::new(); column_count];

    for i in 0..nodes.len() {
        let has_out = nodes[i].source_links.iter().any(|&li| !links[li].back_edge);
        let has_in = nodes[i].target_links.iter().any(|&li| !links[li].back_edge);
        let depth = nodes[i].depth as i64;
        let raw_layer = match align {
            NodeAlign::Left => depth,
            NodeAlign::Right => last - nodes[i].height as i64,
            NodeAlign::Justify => {
                if has_out {
                    depth
                } else {
                    last
                }
            }
            NodeAlign::Center => {
                if has_in {
                    depth
                } else if has_out {
                    let min_target_depth = nodes[i]
                        .source_links
                        .iter()
                        .filter(|&&li| !links[li].back_edge)
                        .map(|&li| nodes[links[li].target].depth)
                        .min()
                        .unwrap_or(0);
                    min_target_depth as i64 - 1
                } else {
                    0
                }
            }
        };
        let layer = raw_layer.clamp(0, last) as usize;
        nodes[i].layer = layer;
        columns[layer].push(i);
    }
    columns
}

/// Largest scale at which `col` fits in `height`, with every node whose scaled value falls
/// below `MIN_NODE_HEIGHT` drawn at that floor instead. `None` for a column without value.
fn column_ky(nodes: &[Node], col: &[usize], height: f64, py: f64) -> Option<f64> {
    let max_value = col.iter().map(|&ni| nodes[ni].value).fold(0.0, f64::max);
    if max_value <= 0.0 {
        return None;
    }
    let available = height - (col.len() as f64 - 1.0) * py;
    let mut floored: Vec<bool> = col.iter().map(|&ni| nodes[ni].value <= 0.0).collect();
    // Each round floors at least one more node, so this ends within `col.len()` rounds.
    loop {
        let floors = floored.iter().filter(|&&f| f).count() as f64 * MIN_NODE_HEIGHT;
        let scaled: f64 = col
            .iter()
            .zip(&floored)
            .filter(|&(_, &f)| !f)
            .map(|(&ni, _)| nodes[ni].value)
            .sum();
        if scaled <= 0.0 {
            // Everything sits on the floor; keep the largest node there too.
            return Some(MIN_NODE_HEIGHT / max_value);
        }
        let ky = ((available - floors) / scaled).max(0.0);
        let mut changed = false;
        for (&ni, f) in col.iter().zip(floored.iter_mut()) {
            if !*f && nodes[ni].value * ky < MIN_NODE_HEIGHT {
                *f = true;
                changed = true;
            }
        }
        if !changed {
            return Some(ky);
        }
    }
}

fn initialize_node_breadths(
    nodes: &mut [Node],
    links: &mut [Link],
    columns: &[Vec<usize>],
    ext: LayoutExtent,
    py: f64,
    ky: f64,
) {
    for col in columns {
        let mut y = ext.y0;
        for &ni in col {
            nodes[ni].y0 = y;
            nodes[ni].y1 = y + (nodes[ni].value * ky).max(MIN_NODE_HEIGHT);
            y = nodes[ni].y1 + py;
            for &li in &nodes[ni].source_links {
                links[li].width = links[li].value * ky;
            }
        }
        let n = col.len();
        if n > 0 {
            let offset = (ext.y1 - y + py) / (n as f64 + 1.0);
            for (i, &ni) in col.iter().enumerate() {
                let adj = offset * (i as f64 + 1.0);
                nodes[ni].y0 += adj;
                nodes[ni].y1 += adj;
            }
            reorder_links(nodes, links, col);
        }
    }
}

fn sort_source_links_by_target_y0(node_y0: &[f64], links: &[Link], link_indices: &mut [usize]) {
    link_indices.sort_by(|&a, &b| {
        let ta = node_y0[links[a].target];
        let tb = node_y0[links[b].target];
        f64_cmp(ta, tb).then_with(|| links[a].index.cmp(&links[b].index))
    });
}

fn sort_target_links_by_source_y0(node_y0: &[f64], links: &[Link], link_indices: &mut [usize]) {
    link_indices.sort_by(|&a, &b| {
        let sa = node_y0[links[a].source];
        let sb = node_y0[links[b].source];
        f64_cmp(sa, sb).then_with(|| links[a].index.cmp(&links[b].index))
    });
}

fn reorder_links(nodes: &mut [Node], links: &[Link], column: &[usize]) {
    let node_y0 = nodes.iter().map(|n| n.y0).collect::<Vec<_>>();
    for &ni in column {
        sort_source_links_by_target_y0(&node_y0, links, &mut nodes[ni].source_links);
        sort_target_links_by_source_y0(&node_y0, links, &mut nodes[ni].target_links);
    }
}

fn reorder_node_links(nodes: &mut [Node], links: &[Link], node_idx: usize) {
    let node_y0 = nodes.iter().map(|n| n.y0).collect::<Vec<_>>();

    let target_links = nodes[node_idx].target_links.clone();
    for li in target_links {
        let source = links[li].source;
        sort_source_links_by_target_y0(&node_y0, links, &mut nodes[source].source_links);
    }

    let source_links = nodes[node_idx].source_links.clone();
    for li in source_links {
        let target = links[li].target;
        sort_target_links_by_source_y0(&node_y0, links, &mut nodes[target].target_links);
    }
}

/// Where the band of `source -> target` would start at the target, seen from the source.
fn target_top(nodes: &[Node], links: &[Link], py: f64, source: usize, target: usize) -> f64 {
    let source_link_count = nodes[source].source_links.len() as f64;
    let mut y = nodes[source].y0 - (source_link_count - 1.0) * py / 2.0;
    for &li in &nodes[source].source_links {
        if links[li].target == target {
            break;
        }
        y += links[li].width + py;
    }
    for &li in &nodes[target].target_links {
        if links[li].source == source {
            break;
        }
        y -= links[li].width;
    }
    y
}

/// Where the band of `source -> target` would start at the source, seen from the target.
fn source_top(nodes: &[Node], links: &[Link], py: f64, source: usize, target: usize) -> f64 {
    let target_link_count = nodes[target].target_links.len() as f64;
    let mut y = nodes[target].y0 - (target_link_count - 1.0) * py / 2.0;
    for &li in &nodes[target].target_links {
        if links[li].source == source {
            break;
        }
        y += links[li].width + py;
    }
    for &li in &nodes[source].source_links {
        if links[li].target == target {
            break;
        }
        y -= links[li].width;
    }
    y
}

fn resolve_collisions_top_to_bottom(
    nodes: &mut [Node],
    column: &[usize],
    py: f64,
    mut y: f64,
    mut i: isize,
    alpha: f64,
) {
    while i < column.len() as isize {
        let ni = column[i as usize];
        let dy = (y - nodes[ni].y0) * alpha;
        if dy > 1e-6 {
            nodes[ni].y0 += dy;
            nodes[ni].y1 += dy;
        }
        y = nodes[ni].y1 + py;
        i += 1;
    }
}

fn resolve_collisions_bottom_to_top(
    nodes: &mut [Node],
    column: &[usize],
    py: f64,
    mut y: f64,
    mut i: isize,
    alpha: f64,
) {
    while i >= 0 {
        let ni = column[i as usize];
        let dy = (nodes[ni].y1 - y) * alpha;
        if dy > 1e-6 {
            nodes[ni].y0 -= dy;
            nodes[ni].y1 -= dy;
        }
        y = nodes[ni].y0 - py;
        i -= 1;
    }
}

/// Pushes overlapping nodes apart from the middle of the column outwards, then pulls the column
/// back inside the vertical extent.
fn resolve_collisions(nodes: &mut [Node], column: &[usize], frame: Frame, alpha: f64) {
    if column.is_empty() {
        return;
    }
    let py = frame.py;
    let i = column.len() >> 1;
    let subject = column[i];
    let (above, below) = (nodes[subject].y0 - py, nodes[subject].y1 + py);
    let last = column.len() as isize - 1;
    resolve_collisions_bottom_to_top(nodes, column, py, above, i as isize - 1, alpha);
    resolve_collisions_top_to_bottom(nodes, column, py, below, i as isize + 1, alpha);
    resolve_collisions_bottom_to_top(nodes, column, py, frame.y1, last, alpha);
    resolve_collisions_top_to_bottom(nodes, column, py, frame.y0, 0, alpha);
}

fn sort_column_by_y0(nodes: &[Node], column: &mut [usize]) {
    column.sort_by(|&a, &b| f64_cmp(nodes[a].y0, nodes[b].y0).then_with(|| a.cmp(&b)));
}

fn relax_left_to_right(
    nodes: &mut [Node],
    links: &[Link],
    columns: &mut [Vec<usize>],
    frame: Frame,
    alpha: f64,
    beta: f64,
) {
    for column in columns.iter_mut().skip(1) {
        for &target in column.iter() {
            let mut y = 0.0;
            let mut w = 0.0;
            for &li in &nodes[target].target_links {
                let link = &links[li];
                if link.back_edge {
                    continue;
                }
                let source = link.source;
                let v = link.value * (nodes[target].layer as f64 - nodes[source].layer as f64);
                y += target_top(nodes, links, frame.py, source, target) * v;
                w += v;
            }
            if w <= 0.0 {
                continue;
            }
            let dy = (y / w - nodes[target].y0) * alpha;
            nodes[target].y0 += dy;
            nodes[target].y1 += dy;
            reorder_node_links(nodes, links, target);
        }
        sort_column_by_y0(nodes, column);
        resolve_collisions(nodes, column, frame, beta);
    }
}

fn relax_right_to_left(
    nodes: &mut [Node],
    links: &[Link],
    columns: &mut [Vec<usize>],
    frame: Frame,
    alpha: f64,
    beta: f64,
) {
    if columns.len() < 2 {
        return;
    }
    let last = columns.len() - 1;
    for column in columns[..last].iter_mut().rev() {
        for &source in column.iter() {
            let mut y = 0.0;
            let mut w = 0.0;
            for &li in &nodes[source].source_links {
                let link = &links[li];
                if link.back_edge {
                    continue;
                }
                let target = link.target;
                let v = link.value * (nodes[target].layer as f64 - nodes[source].layer as f64);
                y += source_top(nodes, links, frame.py, source, target) * v;
                w += v;
            }
            if w <= 0.0 {
                continue;
            }
            let dy = (y / w - nodes[source].y0) * alpha;
            nodes[source].y0 += dy;
            nodes[source].y1 += dy;
            reorder_node_links(nodes, links, source);
        }
        sort_column_by_y0(nodes, column);
        resolve_collisions(nodes, column, frame, beta);
    }
}

/// Stacks each node's outgoing and incoming bands from its top edge in band order.
fn compute_link_breadths(nodes: &[Node], links: &mut [Link]) {
    for node in nodes {
        let mut y0 = node.y0;
        let mut y1 = node.y0;
        for &li in &node.source_links {
            links[li].y0 = y0 + links[li].width / 2.0;
            y0 += links[li].width;
        }
        for &li in &node.target_links {
            links[li].y1 = y1 + links[li].width / 2.0;
            y1 += links[li].width;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tributary_core::{FlowData, FlowLink, FlowNode};

    fn graph(nodes: &[&str], links: &[(&str, &str, f64)]) -> FlowGraph {
        FlowData {
            nodes: nodes.iter().map(|id| FlowNode::new(*id)).collect(),
            links: links
                .iter()
                .map(|(s, t, v)| FlowLink::new(*s, *t, *v))
                .collect(),
            ..Default::default()
        }
        .graph()
        .unwrap()
    }

    #[test]
    fn chain_gets_consecutive_depths_and_equal_heights() {
        let g = graph(&["A", "B", "C"], &[("A", "B", 10.0), ("B", "C", 10.0)]);
        let layout = layout_flow(&g, &LayoutOptions::default()).unwrap();

        let depths: Vec<usize> = layout.nodes.iter().map(|n| n.depth).collect();
        assert_eq!(depths, [0, 1, 2]);

        let heights: Vec<f64> = layout.nodes.iter().map(|n| n.y1 - n.y0).collect();
        for h in &heights {
            assert!((h - heights[0]).abs() < 1e-9);
            assert!((h - 10.0 * layout.ky).abs() < 1e-9);
        }
    }

    #[test]
    fn columns_span_the_extent() {
        let g = graph(&["A", "B", "C"], &[("A", "B", 10.0), ("B", "C", 10.0)]);
        let opts = LayoutOptions::for_surface(302.0, 110.0);
        let layout = layout_flow(&g, &opts).unwrap();
        assert_eq!(layout.nodes[0].x0, 1.0);
        assert!((layout.nodes[2].x1 - 301.0).abs() < 1e-9);
        assert!((layout.nodes[1].x0 - (1.0 + (300.0 - 15.0) / 2.0)).abs() < 1e-9);
        for n in &layout.nodes {
            assert!(n.y0 >= 5.0 - 1e-6 && n.y1 <= 105.0 + 1e-6);
        }
    }

    #[test]
    fn alignment_modes_place_sources_and_sinks() {
        // A -> B -> C, D -> C: D is a source one step before the sink.
        let g = graph(
            &["A", "B", "C", "D", "E"],
            &[("A", "B", 5.0), ("B", "C", 5.0), ("D", "C", 2.0), ("A", "E", 1.0)],
        );
        let layer_of = |align: NodeAlign| -> Vec<usize> {
            let opts = LayoutOptions::default().with_align(align);
            layout_flow(&g, &opts)
                .unwrap()
                .nodes
                .iter()
                .map(|n| n.layer)
                .collect()
        };

        assert_eq!(layer_of(NodeAlign::Left), [0, 1, 2, 0, 1]);
        assert_eq!(layer_of(NodeAlign::Right), [0, 1, 2, 1, 2]);
        assert_eq!(layer_of(NodeAlign::Justify), [0, 1, 2, 0, 2]);
        assert_eq!(layer_of(NodeAlign::Center), [0, 1, 2, 1, 1]);
    }

    #[test]
    fn cycles_are_tolerated_and_broken_in_input_order() {
        let g = graph(
            &["A", "B", "C"],
            &[("A", "B", 3.0), ("B", "C", 3.0), ("C", "B", 1.0)],
        );
        let layout = layout_flow(&g, &LayoutOptions::default()).unwrap();
        let depths: Vec<usize> = layout.nodes.iter().map(|n| n.depth).collect();
        assert_eq!(depths, [0, 1, 2]);
        assert!(!layout.links[0].back_edge);
        assert!(!layout.links[1].back_edge);
        assert!(layout.links[2].back_edge);
    }

    #[test]
    fn self_loop_is_a_back_edge() {
        let g = graph(&["A", "B"], &[("A", "A", 1.0), ("A", "B", 2.0)]);
        let layout = layout_flow(&g, &LayoutOptions::default()).unwrap();
        assert!(layout.links[0].back_edge);
        assert_eq!(layout.nodes[1].depth, 1);
    }

    #[test]
    fn pure_cycle_without_sources_still_lays_out() {
        let g = graph(&["A", "B"], &[("A", "B", 1.0), ("B", "A", 1.0)]);
        let layout = layout_flow(&g, &LayoutOptions::default()).unwrap();
        assert_eq!(layout.nodes[0].depth, 0);
        assert_eq!(layout.nodes[1].depth, 1);
        assert!(layout.links[1].back_edge);
    }

    #[test]
    fn empty_graph_yields_empty_layout() {
        let g = graph(&[], &[]);
        let layout = layout_flow(&g, &LayoutOptions::default()).unwrap();
        assert!(layout.nodes.is_empty());
        assert!(layout.links.is_empty());
        assert_eq!(layout.ky, 0.0);
    }

    #[test]
    fn zero_weight_node_keeps_a_one_pixel_rectangle() {
        let g = graph(&["A", "B", "Lonely"], &[("A", "B", 4.0)]);
        let layout = layout_flow(&g, &LayoutOptions::default()).unwrap();
        let lonely = layout.node_by_id("Lonely").unwrap();
        assert!((lonely.y1 - lonely.y0 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn inverted_extent_is_rejected() {
        let g = graph(&["A"], &[]);
        let mut opts = LayoutOptions::default();
        opts.extent.x1 = -10.0;
        assert!(matches!(
            layout_flow(&g, &opts),
            Err(Error::InvalidLayout { .. })
        ));
    }

    #[test]
    fn surface_narrower_than_a_node_keeps_column_order() {
        let g = graph(&["A", "B", "C"], &[("A", "B", 10.0), ("B", "C", 10.0)]);
        let layout = layout_flow(&g, &LayoutOptions::for_surface(12.0, 100.0)).unwrap();
        let e = layout.extent;
        for pair in layout.nodes.windows(2) {
            assert!(pair[0].x0 <= pair[1].x0, "{} -> {}", pair[0].id, pair[1].id);
        }
        for n in &layout.nodes {
            assert!(n.x0 >= e.min_x - 1e-9 && n.x1 <= e.max_x + 1e-9, "{}", n.id);
        }
    }

    #[test]
    fn runaway_iteration_count_is_rejected() {
        let g = graph(&["A", "B"], &[("A", "B", 1.0)]);
        let mut cfg = FlowConfig::defaults();
        cfg.set_value("sankey.iterations", serde_json::json!(1e18));
        let opts = LayoutOptions::from_config(&cfg).unwrap();
        assert!(matches!(
            layout_flow(&g, &opts),
            Err(Error::InvalidLayout { .. })
        ));

        let opts = LayoutOptions {
            iterations: MAX_ITERATIONS,
            ..LayoutOptions::default()
        };
        assert!(layout_flow(&g, &opts).is_ok());
    }

    #[test]
    fn options_read_from_config() {
        let mut cfg = FlowConfig::defaults();
        cfg.deep_merge(&serde_json::json!({
            "sankey": {"width": 800, "height": 300, "nodeAlignment": "right", "nodeWidth": 20}
        }));
        let opts = LayoutOptions::from_config(&cfg).unwrap();
        assert_eq!(opts.width, 800.0);
        assert_eq!(opts.extent, LayoutExtent::for_surface(800.0, 300.0));
        assert_eq!(opts.align, NodeAlign::Right);
        assert_eq!(opts.node_width, 20.0);
        assert_eq!(opts.iterations, DEFAULT_ITERATIONS);

        cfg.set_value("sankey.nodeAlignment", serde_json::json!("diagonal"));
        assert!(matches!(
            LayoutOptions::from_config(&cfg),
            Err(Error::Core(tributary_core::Error::UnknownAlignment { .. }))
        ));
    }
}
