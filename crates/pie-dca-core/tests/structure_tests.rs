use pie_dca_core::structure::{merge, merge_batch, parse_classifier_response};
use pie_dca_core::{NodeKind, Pie, PieError, Ticker};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use serde_json::json;

// ===========================================================================
// Structure merge
// ===========================================================================

#[test]
fn test_merge_overwrite_scenario() {
    let mut pie = Pie::new("p")
        .with_child(Ticker::new("A", dec!(50)))
        .with_child(Ticker::new("B", dec!(50)));
    pie.normalize();
    assert_eq!(pie.children.get("A").unwrap().weight(), Some(dec!(0.5)));

    let incoming = json!({"A": {"type": "ticker", "value": 100}});
    let report = merge(&mut pie, incoming.as_object().unwrap());
    assert!(report.is_clean());

    let a = pie.children.get("A").unwrap();
    assert_eq!(a.value(), dec!(100));
    assert_eq!(a.weight(), None);
    let serialized = serde_json::to_value(a).unwrap();
    assert!(serialized.get("weight").is_none());

    pie.normalize();
    let a = pie.children.get("A").unwrap();
    let expected = dec!(100) / dec!(150);
    assert_eq!(a.weight(), Some(expected));
}

#[test]
fn test_classifier_response_end_to_end() {
    let raw = r#"```json
{
  "Dividends": {"type": "pie", "value": 1845.07},
  "VTI": {"type": "ticker", "value": "404.93"},
  "Broken": {"type": "ticker", "value": null}
}
```"#;
    let batch = parse_classifier_response(raw).unwrap();
    let mut pie = Pie::new("main");
    let report = merge(&mut pie, &batch);

    assert_eq!(report.applied.len(), 2);
    assert_eq!(report.skipped_count(), 1);
    assert_eq!(report.skipped[0].name, "Broken");

    let dividends = pie.children.get("Dividends").unwrap();
    assert_eq!(dividends.kind(), NodeKind::Pie);
    assert_eq!(dividends.value(), dec!(1845.07));

    pie.normalize();
    assert_eq!(pie.value, dec!(2250.00));
}

#[test]
fn test_classifier_entries_keep_response_order() {
    let raw = r#"{
  "VXUS": {"type": "ticker", "value": 10},
  "Bonds": {"type": "pie", "value": 20},
  "AAPL": {"type": "ticker", "value": 30}
}"#;
    let batch = parse_classifier_response(raw).unwrap();
    let mut pie = Pie::new("main").with_child(Ticker::new("MSFT", dec!(5)));
    let report = merge(&mut pie, &batch);

    assert_eq!(report.applied, vec!["VXUS", "Bonds", "AAPL"]);
    assert_eq!(pie.children.names(), vec!["MSFT", "VXUS", "Bonds", "AAPL"]);
}

#[test]
fn test_invalid_batch_is_all_or_nothing() {
    let mut pie = Pie::new("main").with_child(Ticker::new("VTI", dec!(10)));
    let before = pie.clone();
    let batch = json!({
        "AAPL": {"type": "ticker", "value": 5},
        "MSFT": "ticker"
    });
    let err = merge_batch(&mut pie, &batch).unwrap_err();
    assert!(matches!(err, PieError::InvalidStructure(_)));
    assert_eq!(pie, before);
}

#[test]
fn test_non_mapping_response_is_rejected() {
    assert!(matches!(
        parse_classifier_response("null"),
        Err(PieError::InvalidStructure(_))
    ));
    assert!(matches!(
        merge_batch(&mut Pie::new("p"), &json!(["AAPL"])),
        Err(PieError::InvalidStructure(_))
    ));
}
