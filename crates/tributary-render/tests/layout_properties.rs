use tributary_core::{FlowData, FlowLink, FlowNode, NodeAlign};
use tributary_render::{
    ColorAssigner, FlowLayout, GroupedFormatter, LayoutOptions, SceneOptions, SvgRenderOptions,
    build_scene, layout_flow, render_svg,
};

const EPS: f64 = 1e-6;

fn flow(nodes: &[&str], links: &[(&str, &str, f64)]) -> FlowData {
    FlowData {
        nodes: nodes.iter().map(|id| FlowNode::new(*id)).collect(),
        links: links
            .iter()
            .map(|(s, t, v)| FlowLink::new(*s, *t, *v))
            .collect(),
        ..Default::default()
    }
}

fn household() -> FlowData {
    flow(
        &[
            "Income:Salary",
            "Income:Freelance",
            "Budget",
            "Expenses:Rent",
            "Expenses:Food",
            "Expenses:Fun",
            "Savings",
            "Savings:Pension",
        ],
        &[
            ("Income:Salary", "Budget", 3200.0),
            ("Income:Freelance", "Budget", 800.0),
            ("Budget", "Expenses:Rent", 1300.0),
            ("Budget", "Expenses:Food", 500.0),
            ("Budget", "Expenses:Fun", 0.0),
            ("Budget", "Savings", 2200.0),
            ("Savings", "Savings:Pension", 900.0),
            ("Income:Freelance", "Savings", 50.0),
        ],
    )
}

fn lay_out(data: &FlowData, align: NodeAlign) -> FlowLayout {
    let options = LayoutOptions::for_surface(900.0, 500.0).with_align(align);
    layout_flow(&data.graph().unwrap(), &options).unwrap()
}

#[test]
fn bands_partition_node_edges() {
    for align in [
        NodeAlign::Left,
        NodeAlign::Right,
        NodeAlign::Justify,
        NodeAlign::Center,
    ] {
        let layout = lay_out(&household(), align);
        for node in &layout.nodes {
            let out: f64 = node
                .source_links
                .iter()
                .map(|&i| layout.links[i].width)
                .sum();
            assert!((out - node.value_out * layout.ky).abs() < EPS, "{}", node.id);

            let incoming: f64 = node
                .target_links
                .iter()
                .map(|&i| layout.links[i].width)
                .sum();
            assert!((incoming - node.value_in * layout.ky).abs() < EPS, "{}", node.id);

            // Bands are contiguous from the node top, in band order.
            let mut y = node.y0;
            for &i in &node.source_links {
                let (top, bottom) = layout.links[i].source_band();
                assert!((top - y).abs() < EPS, "{} outgoing band {i}", node.id);
                y = bottom;
            }
            let mut y = node.y0;
            for &i in &node.target_links {
                let (top, bottom) = layout.links[i].target_band();
                assert!((top - y).abs() < EPS, "{} incoming band {i}", node.id);
                y = bottom;
            }
        }
    }
}

#[test]
fn drawn_strokes_are_at_least_one_pixel() {
    let layout = lay_out(&household(), NodeAlign::Justify);
    assert!(layout.links.iter().all(|l| l.stroke_width() >= 1.0));

    let scene = build_scene(
        &layout,
        &mut ColorAssigner::default(),
        &GroupedFormatter::default(),
        &SceneOptions::default(),
    );
    let fun = scene
        .links
        .iter()
        .find(|l| l.tooltip.starts_with("Budget → Expenses:Fun"))
        .unwrap();
    assert_eq!(fun.stroke_width, 1.0);
    assert_eq!(fun.tooltip, "Budget → Expenses:Fun: 0");
}

#[test]
fn depths_respect_link_direction() {
    let layout = lay_out(&household(), NodeAlign::Justify);
    for link in &layout.links {
        let (s, t) = (layout.source_of(link), layout.target_of(link));
        assert!(s.depth < t.depth, "{} -> {}", s.id, t.id);
        assert!(s.layer < t.layer, "{} -> {}", s.id, t.id);
        assert!(s.x1 <= t.x0);
    }
    let depth = |id: &str| layout.node_by_id(id).unwrap().depth;
    assert_eq!(depth("Income:Freelance"), 0);
    assert_eq!(depth("Savings"), 2);
    assert_eq!(depth("Savings:Pension"), 3);
}

#[test]
fn chain_of_equal_flows() {
    let data = flow(
        &["A", "B", "C"],
        &[("A", "B", 10.0), ("B", "C", 10.0)],
    );
    let layout = lay_out(&data, NodeAlign::Justify);
    let depths: Vec<_> = layout.nodes.iter().map(|n| n.depth).collect();
    assert_eq!(depths, [0, 1, 2]);

    let heights: Vec<_> = layout.nodes.iter().map(|n| n.y1 - n.y0).collect();
    assert!((heights[0] - 10.0 * layout.ky).abs() < EPS);
    assert!((heights[0] - heights[1]).abs() < EPS);
    assert!((heights[1] - heights[2]).abs() < EPS);
}

#[test]
fn nodes_stay_inside_extent() {
    let layout = lay_out(&household(), NodeAlign::Center);
    let e = layout.extent;
    for n in &layout.nodes {
        assert!(n.x0 >= e.min_x - EPS && n.x1 <= e.max_x + EPS, "{}", n.id);
        assert!(n.y0 >= e.min_y - EPS && n.y1 <= e.max_y + EPS, "{}", n.id);
        assert!(n.y1 - n.y0 >= 1.0 - EPS, "{}", n.id);
    }
}

#[test]
fn tiny_flows_on_the_floor_stay_inside_extent() {
    let trickles: Vec<String> = (0..19).map(|i| format!("Interest:{i}")).collect();
    let mut ids: Vec<&str> = vec!["Salary", "Budget"];
    ids.extend(trickles.iter().map(String::as_str));
    let mut links = vec![("Salary", "Budget", 1000.0)];
    links.extend(trickles.iter().map(|t| (t.as_str(), "Budget", 0.001)));
    let data = flow(&ids, &links);

    let options = LayoutOptions::for_surface(600.0, 400.0);
    let layout = layout_flow(&data.graph().unwrap(), &options).unwrap();
    let e = layout.extent;
    let first_column = layout.nodes.iter().filter(|n| n.layer == 0).count();
    assert_eq!(first_column, 20);
    for n in &layout.nodes {
        assert!(n.y0 >= e.min_y - EPS && n.y1 <= e.max_y + EPS, "{} {}..{}", n.id, n.y0, n.y1);
        assert!(n.y1 - n.y0 >= 1.0 - EPS, "{}", n.id);
    }
}

#[test]
fn same_input_renders_identically() {
    let render = || {
        let layout = lay_out(&household(), NodeAlign::Justify);
        let scene = build_scene(
            &layout,
            &mut ColorAssigner::default(),
            &GroupedFormatter::new(Some("EUR".to_string())),
            &SceneOptions::default(),
        );
        render_svg(&scene, &SvgRenderOptions::default())
    };
    assert_eq!(render(), render());
}

#[test]
fn cycle_back_edges_are_drawn() {
    let data = flow(
        &["Checking", "Savings", "Brokerage"],
        &[
            ("Checking", "Savings", 500.0),
            ("Savings", "Brokerage", 200.0),
            ("Brokerage", "Checking", 50.0),
        ],
    );
    let layout = lay_out(&data, NodeAlign::Justify);
    let back: Vec<_> = layout.links.iter().filter(|l| l.back_edge).collect();
    assert_eq!(back.len(), 1);
    assert_eq!(layout.source_of(back[0]).id, "Brokerage");

    let scene = build_scene(
        &layout,
        &mut ColorAssigner::default(),
        &GroupedFormatter::default(),
        &SceneOptions::default(),
    );
    let svg = render_svg(&scene, &SvgRenderOptions::default());
    let doc = roxmltree::Document::parse(&svg).unwrap();
    assert_eq!(
        doc.descendants().filter(|n| n.has_tag_name("path")).count(),
        3
    );
}
