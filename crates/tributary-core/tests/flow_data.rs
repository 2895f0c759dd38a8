use tributary_core::{
    DAYS_PER_MONTH, Error, FlowData, Interval, NodeAlign, NormalizeOptions, csv, normalize,
};

#[test]
fn thirty_one_day_totals_become_a_monthly_average() {
    let data = FlowData::from_json_str(
        r#"{
            "nodes": [{"id": "Salary"}, {"id": "Budget"}],
            "links": [{"source": "Salary", "target": "Budget", "value": 31}],
            "days": 31
        }"#,
    )
    .unwrap();

    let options = NormalizeOptions::DailyAverageOverPeriod {
        period_length_days: 31.0,
    };
    let monthly = normalize(&data, &options).unwrap();
    assert!((monthly.links[0].value - 365.0 / 12.0).abs() < 1e-12);
    assert!((monthly.links[0].value - 30.4167).abs() < 1e-4);

    // Input untouched; nothing but link values changes.
    assert_eq!(data.links[0].value, 31.0);
    assert_eq!(monthly.nodes, data.nodes);
    assert_eq!(monthly.days, Some(31.0));
}

#[test]
fn as_given_is_a_deep_copy() {
    let data = csv::parse_flow_csv("Salary,Budget,2500\nBudget,Rent,1100.5\n").unwrap();
    let copy = normalize(&data, &NormalizeOptions::AsGiven).unwrap();
    assert_eq!(copy, data);
}

#[test]
fn interval_names_resolve_against_data() {
    let data = FlowData {
        days: Some(DAYS_PER_MONTH),
        ..Default::default()
    };
    let interval: Interval = "monthly".parse().unwrap();
    assert_eq!(
        NormalizeOptions::from_interval(interval, &data).unwrap(),
        NormalizeOptions::DailyAverageOverPeriod {
            period_length_days: DAYS_PER_MONTH
        }
    );
    assert!(matches!(
        NormalizeOptions::from_interval(interval, &FlowData::default()),
        Err(Error::MissingPeriod)
    ));
    assert!(matches!(
        "weekly".parse::<Interval>(),
        Err(Error::UnknownInterval { .. })
    ));
}

#[test]
fn host_payload_with_name_fields_builds_a_graph() {
    let data = FlowData::from_json_str(
        r#"{
            "nodes": [
                {"name": "Income:Salary", "category": "income"},
                {"name": "Budget", "link": "/budget/"}
            ],
            "links": [{"source": "Income:Salary", "target": "Budget", "value": 0}],
            "units": "USD",
            "align": "center"
        }"#,
    )
    .unwrap();
    assert_eq!(data.align, NodeAlign::Center);
    assert_eq!(data.units.as_deref(), Some("USD"));

    let graph = data.graph().unwrap();
    assert_eq!(graph.nodes().len(), 2);
    assert_eq!(graph.links()[0].source, 0);
    assert_eq!(graph.links()[0].target, 1);
    assert_eq!(graph.node(1).link.as_deref(), Some("/budget/"));
}

#[test]
fn invalid_payloads_are_rejected() {
    let dangling = FlowData::from_json_str(
        r#"{"nodes": [{"id": "A"}], "links": [{"source": "A", "target": "B", "value": 1}]}"#,
    )
    .unwrap();
    assert!(matches!(
        dangling.graph(),
        Err(Error::UnknownNode { link: 0, ref id }) if id == "B"
    ));

    let negative = FlowData::from_json_str(
        r#"{"nodes": [{"id": "A"}, {"id": "B"}], "links": [{"source": "A", "target": "B", "value": -2}]}"#,
    )
    .unwrap();
    assert!(matches!(
        negative.graph(),
        Err(Error::NegativeValue { link: 0, .. })
    ));

    assert!(matches!(
        FlowData::from_json_str(r#"{"nodes": [{"category": "x"}]}"#),
        Err(Error::Json(_))
    ));
}
