use crate::scene::{FlowPath, Label, NodeRect, Paint, Scene};
use std::fmt::Write as _;

#[derive(Debug, Clone)]
pub struct SvgRenderOptions {
    /// Root element id; also prefixes gradient ids so several diagrams can share a page.
    pub diagram_id: Option<String>,
    pub background: Option<String>,
    pub font_family: String,
}

impl Default for SvgRenderOptions {
    fn default() -> Self {
        Self {
            diagram_id: None,
            background: None,
            font_family: "sans-serif".to_string(),
        }
    }
}

pub fn render_svg(scene: &Scene, options: &SvgRenderOptions) -> String {
    let diagram_id = options.diagram_id.as_deref().unwrap_or("sankey");
    let width = scene.width.max(1.0);
    let height = scene.height.max(1.0);

    let mut out = String::new();
    let style = match options.background.as_deref() {
        Some(bg) => format!(r#" style="background-color: {};""#, escape_xml(bg)),
        None => String::new(),
    };
    let _ = write!(
        &mut out,
        r#"<svg id="{id}" xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}"{style} role="graphics-document document" aria-roledescription="sankey">"#,
        id = escape_xml(diagram_id),
        w = fmt(width),
        h = fmt(height),
    );
    let _ = write!(&mut out, "<style>{}</style>", sankey_css(diagram_id));

    out.push_str(r##"<g class="nodes" stroke="#000">"##);
    for n in &scene.nodes {
        write_node(&mut out, n);
    }
    out.push_str("</g>");

    let _ = write!(
        &mut out,
        r#"<g class="links" fill="none" stroke-opacity="{}">"#,
        fmt(scene.link_opacity)
    );
    for l in &scene.links {
        write_link(&mut out, diagram_id, l);
    }
    out.push_str("</g>");

    let _ = write!(
        &mut out,
        r#"<g class="node-labels" font-family="{family}" font-size="{size}">"#,
        family = escape_xml(&options.font_family),
        size = fmt(scene.font_size),
    );
    for label in &scene.labels {
        write_label(&mut out, label);
    }
    out.push_str("</g>");

    out.push_str("</svg>");
    out
}

fn write_node(out: &mut String, n: &NodeRect) {
    let _ = write!(
        out,
        r#"<rect class="node" data-node="{idx}" x="{x}" y="{y}" height="{h}" width="{w}" fill="{fill}"><title>{title}</title></rect>"#,
        idx = n.node,
        x = fmt(n.x),
        y = fmt(n.y),
        h = fmt(n.height),
        w = fmt(n.width),
        fill = escape_xml(&n.fill),
        title = escape_xml(&n.tooltip),
    );
}

fn write_link(out: &mut String, diagram_id: &str, l: &FlowPath) {
    let mx = l.control_x();
    let d = format!(
        "M{sx},{y0}C{mx},{y0},{mx},{y1},{tx},{y1}",
        sx = fmt_path(l.sx),
        y0 = fmt_path(l.y0),
        mx = fmt_path(mx),
        y1 = fmt_path(l.y1),
        tx = fmt_path(l.tx),
    );

    out.push_str(r#"<g class="link" style="mix-blend-mode: multiply;">"#);
    let stroke = match &l.stroke {
        Paint::Solid { color } => color.clone(),
        Paint::LinearGradient {
            id,
            x1,
            x2,
            from,
            to,
        } => {
            let gradient_id = format!("{diagram_id}-{id}");
            let _ = write!(
                out,
                r#"<linearGradient id="{id}" gradientUnits="userSpaceOnUse" x1="{x1}" x2="{x2}"><stop offset="0%" stop-color="{c1}"/><stop offset="100%" stop-color="{c2}"/></linearGradient>"#,
                id = escape_xml(&gradient_id),
                x1 = fmt(*x1),
                x2 = fmt(*x2),
                c1 = escape_xml(from),
                c2 = escape_xml(to),
            );
            format!("url(#{gradient_id})")
        }
    };
    let _ = write!(
        out,
        r#"<path data-link="{idx}" d="{d}" stroke="{stroke}" stroke-width="{sw}"><title>{title}</title></path></g>"#,
        idx = l.link,
        d = d,
        stroke = escape_xml(&stroke),
        sw = fmt(l.stroke_width),
        title = escape_xml(&l.tooltip),
    );
}

fn write_label(out: &mut String, label: &Label) {
    let text = format!(
        r#"<text x="{x}" y="{y}" dy="0.35em" text-anchor="{anchor}">{text}</text>"#,
        x = fmt(label.x),
        y = fmt(label.y),
        anchor = label.anchor.as_str(),
        text = escape_xml(&label.text),
    );
    match label.href.as_deref() {
        Some(href) => {
            let _ = write!(
                out,
                r#"<a class="node-link" href="{href}">{text}</a>"#,
                href = escape_xml(href),
            );
        }
        None => out.push_str(&text),
    }
}

fn sankey_css(diagram_id: &str) -> String {
    let id = escape_xml(diagram_id);
    format!(
        "#{id} .node{{cursor:default;}}#{id} .link:hover path{{stroke-opacity:0.8;}}#{id} .node-link{{cursor:pointer;}}#{id} .node-link:hover text{{text-decoration:underline;}}"
    )
}

/// Attribute number: shortest round-trippable form, without float noise or `-0`.
pub(crate) fn fmt(v: f64) -> String {
    if !v.is_finite() {
        return "0".to_string();
    }

    let mut v = if v.abs() < 1e-9 { 0.0 } else { v };
    let nearest = v.round();
    if (v - nearest).abs() < 1e-6 {
        v = nearest;
    }
    let s = v.to_string();
    if s == "-0" { "0".to_string() } else { s }
}

/// Path command number: at most 3 fractional digits, ties rounded up.
pub(crate) fn fmt_path(v: f64) -> String {
    if !v.is_finite() || v.abs() < 0.0005 {
        return "0".to_string();
    }

    let r = ((v * 1000.0) + 0.5).floor() / 1000.0;
    let mut s = format!("{r:.3}");
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.pop();
    }
    if s == "-0" { "0".to_string() } else { s }
}

pub(crate) fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorAssigner;
    use crate::format::GroupedFormatter;
    use crate::layout::{LayoutOptions, layout_flow};
    use crate::scene::{LinkColorMode, SceneOptions, build_scene};
    use tributary_core::{FlowData, FlowLink, FlowNode};

    fn scene(mode: LinkColorMode) -> Scene {
        let data = FlowData {
            nodes: vec![
                FlowNode::new("Salary"),
                FlowNode::new("Budget"),
                FlowNode::new("Rent & Bills").with_link("/a?b=1&c=2"),
            ],
            links: vec![
                FlowLink::new("Salary", "Budget", 100.0),
                FlowLink::new("Budget", "Rent & Bills", 60.0),
            ],
            ..Default::default()
        };
        let layout = layout_flow(&data.graph().unwrap(), &LayoutOptions::default()).unwrap();
        build_scene(
            &layout,
            &mut ColorAssigner::default(),
            &GroupedFormatter::default(),
            &SceneOptions {
                link_color: mode,
                ..Default::default()
            },
        )
    }

    #[test]
    fn output_is_well_formed_and_escaped() {
        let svg = render_svg(&scene(LinkColorMode::Gradient), &SvgRenderOptions::default());
        let doc = roxmltree::Document::parse(&svg).unwrap();
        let root = doc.root_element();
        assert_eq!(root.attribute("id"), Some("sankey"));
        assert_eq!(root.attribute("viewBox"), Some("0 0 600 400"));

        let rects: Vec<_> = doc
            .descendants()
            .filter(|n| n.has_tag_name("rect"))
            .collect();
        assert_eq!(rects.len(), 3);

        let anchor = doc
            .descendants()
            .find(|n| n.has_tag_name("a"))
            .unwrap();
        assert_eq!(anchor.attribute("href"), Some("/a?b=1&c=2"));
        let label = anchor.first_element_child().unwrap();
        assert_eq!(label.text(), Some("Rent & Bills: 60"));
    }

    #[test]
    fn gradients_are_scoped_by_diagram_id() {
        let svg = render_svg(
            &scene(LinkColorMode::Gradient),
            &SvgRenderOptions {
                diagram_id: Some("budget".to_string()),
                ..Default::default()
            },
        );
        let doc = roxmltree::Document::parse(&svg).unwrap();
        let ids: Vec<_> = doc
            .descendants()
            .filter(|n| n.has_tag_name("linearGradient"))
            .filter_map(|n| n.attribute("id"))
            .collect();
        assert_eq!(ids, ["budget-link-0", "budget-link-1"]);
        let path = doc
            .descendants()
            .find(|n| n.has_tag_name("path"))
            .unwrap();
        assert_eq!(path.attribute("stroke"), Some("url(#budget-link-0)"));
    }

    #[test]
    fn neutral_links_have_no_gradients() {
        let svg = render_svg(&scene(LinkColorMode::None), &SvgRenderOptions::default());
        assert!(!svg.contains("linearGradient"));
        assert!(svg.contains(r##"stroke="#aaa""##));
    }

    #[test]
    fn number_formatting() {
        assert_eq!(fmt(-0.0), "0");
        assert_eq!(fmt(2.0000001), "2");
        assert_eq!(fmt(1.5), "1.5");
        assert_eq!(fmt_path(1.23456), "1.235");
        assert_eq!(fmt_path(10.0), "10");
        assert_eq!(fmt_path(-0.0001), "0");
    }
}
