//! End-to-end tests for the screener query flow.
//!
//! Exercises the full pipeline through the public façade:
//! text → tokens → plan → refinement resolution → execution →
//! interpretation, including the contextual `+N` refinement protocol.

use natscreen::universe::sample_universe;
use natscreen::{FieldKey, ResponseType, Screener, Sector, Security};

// ============================================================================
// Test Data Generators
// ============================================================================

/// Minimal three-security universe with known screening outcomes.
fn tiny_universe() -> Vec<Security> {
    fn sec(symbol: &str, sector: Sector, pe: f64) -> Security {
        Security {
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            sector,
            price: 100.0,
            change_pct: 0.0,
            mcap: 1e12,
            volume: 1e6,
            pe: Some(pe),
            pb: Some(2.0),
            roe: Some(0.15),
            roce: Some(0.15),
            dividend_yield: Some(0.01),
            debt_to_equity: Some(0.5),
            eps: Some(10.0),
            profit_growth: Some(0.10),
            sales_growth: Some(0.10),
        }
    }

    vec![
        sec("A", Sector::It, 10.0),
        sec("B", Sector::It, 20.0),
        sec("C", Sector::Pharma, 8.0),
    ]
}

// ============================================================================
// Fresh Screens
// ============================================================================

// Spec'd concrete scenario: {A: pe=10, IT}, {B: pe=20, IT},
// {C: pe=8, Pharma}; "IT sector PE < 15" → [A].
#[test]
fn test_concrete_sector_and_comparison_scenario() {
    let mut screener = Screener::new(tiny_universe);
    let resp = screener.query("IT sector PE < 15");

    assert_eq!(resp.response_type, ResponseType::Screener);
    assert_eq!(resp.total, 1);
    assert_eq!(resp.data.len(), 1);
    assert_eq!(resp.data[0].symbol, "A");
    assert!(resp.interpretation.contains("PE < 15.00"));
    assert!(resp.interpretation.contains("IT"));
}

#[test]
fn test_currency_units_in_query() {
    let mut screener = Screener::new(sample_universe);
    let resp = screener.query("energy sector Mcap > $5B");

    assert_eq!(resp.response_type, ResponseType::Screener);
    assert!(resp.data.iter().all(|s| s.sector == Sector::Energy && s.mcap > 5e9));
    assert!(!resp.data.is_empty());
    assert!(resp.interpretation.contains("Mcap > 5.00B"));
}

// "please show me cheap IT stocks with good ROE": prose filler plus
// qualitative heuristics must yield a real screen, not an error.
#[test]
fn test_graceful_degradation_on_prose() {
    let mut screener = Screener::new(sample_universe);
    let resp = screener.query("please show me cheap IT stocks with good ROE");

    assert_eq!(resp.response_type, ResponseType::Screener);
    // WIPRO: IT, PE 14.6 < 15, ROE 0.16 > 0.15.
    assert_eq!(resp.data.len(), 1);
    assert_eq!(resp.data[0].symbol, "WIPRO");
    assert!(!resp.suggestions.is_empty());
}

#[test]
fn test_and_or_precedence_end_to_end() {
    let mut screener = Screener::new(tiny_universe);
    // (pe < 9 and roe > 90%) or sector = Pharma → only C (via sector arm).
    let resp = screener.query("PE < 9 and ROE > 90 or sector = pharma");
    assert_eq!(resp.total, 1);
    assert_eq!(resp.data[0].symbol, "C");
}

#[test]
fn test_exclude_wins_over_include() {
    let mut screener = Screener::new(tiny_universe);
    let resp = screener.query("IT and pharma stocks exclude pharma");
    assert!(!resp.data.is_empty());
    assert!(resp.data.iter().all(|s| s.sector != Sector::Pharma));
}

#[test]
fn test_sort_nulls_last_through_facade() {
    let mut screener = Screener::new(sample_universe);
    let resp = screener.query("descending dividend yield");

    let nulls_started = resp
        .data
        .iter()
        .position(|s| s.dividend_yield.is_none())
        .expect("sample universe contains null dividend yields");
    assert!(resp.data[nulls_started..].iter().all(|s| s.dividend_yield.is_none()));
    // Non-null prefix is descending.
    let values: Vec<f64> = resp.data[..nulls_started]
        .iter()
        .filter_map(|s| s.dividend_yield)
        .collect();
    assert!(values.windows(2).all(|w| w[0] >= w[1]));
}

// ============================================================================
// Refinement Protocol
// ============================================================================

#[test]
fn test_refinement_narrows_previous_screen() {
    let mut screener = Screener::new(tiny_universe);
    let first = screener.query("PE < 15");
    assert_eq!(first.total, 2); // A and C

    let refined = screener.query("+1 exclude pharma");
    assert_eq!(refined.response_type, ResponseType::Screener);
    assert_eq!(refined.total, 1);
    assert_eq!(refined.data[0].symbol, "A");
    // The index shows up in the interpretation.
    assert!(refined.interpretation.starts_with("Refinement +1"));
    assert!(refined.interpretation.contains("excluding Pharma sector"));
}

#[test]
fn test_refinement_limit_replaces_not_stacks() {
    let mut screener = Screener::new(sample_universe);
    let first = screener.query("roe > 5% top 10");
    assert_eq!(first.data.len(), 10);

    let refined = screener.query("+1 top 5");
    assert_eq!(refined.data.len(), 5);
    // The filter carried over; only the limit changed.
    assert_eq!(refined.total, first.total);
}

#[test]
fn test_refinement_chains_keep_composing() {
    let mut screener = Screener::new(sample_universe);
    screener.query("roe > 10%");
    let step2 = screener.query("+1 exclude it");
    assert!(step2.data.iter().all(|s| s.sector != Sector::It));

    let step3 = screener.query("+1 pe < 20");
    assert!(step3
        .data
        .iter()
        .all(|s| s.sector != Sector::It && s.pe.unwrap() < 20.0 && s.roe.unwrap() > 0.10));
}

#[test]
fn test_refinement_index_is_single_lineage() {
    let mut screener = Screener::new(tiny_universe);
    screener.query("PE < 15");
    // Any index refines the latest plan.
    let resp = screener.query("+7 exclude pharma");
    assert_eq!(resp.total, 1);
    assert!(resp.interpretation.starts_with("Refinement +7"));
}

#[test]
fn test_refinement_without_context() {
    let mut screener = Screener::new(tiny_universe);
    let resp = screener.query("+1 top 5");
    assert_eq!(resp.response_type, ResponseType::Error);
    assert!(resp.interpretation.contains("no previous screen"));
}

#[test]
fn test_clear_context_between_refinements() {
    let mut screener = Screener::new(tiny_universe);
    screener.query("PE < 15");
    screener.clear_context();
    let resp = screener.query("+1 exclude pharma");
    assert_eq!(resp.response_type, ResponseType::Error);
}

// ============================================================================
// Response Contract
// ============================================================================

#[test]
fn test_every_path_yields_a_valid_response() {
    let mut screener = Screener::new(sample_universe);
    for text in [
        "PE < 15",
        "+1 top 3",
        "gibberish nonsense",
        "help",
        "clear",
        "+1 exclude pharma",
    ] {
        let resp = screener.query(text);
        assert!(!resp.interpretation.is_empty(), "empty interpretation for {:?}", text);
        assert!(!resp.columns.is_empty(), "empty columns for {:?}", text);
        assert!(resp.execution_time_ms >= 0.0);
    }
}

#[test]
fn test_default_column_contract() {
    let mut screener = Screener::new(sample_universe);
    let resp = screener.query("pharma stocks");
    assert_eq!(
        resp.columns,
        vec![
            FieldKey::Symbol,
            FieldKey::Name,
            FieldKey::Sector,
            FieldKey::Price,
            FieldKey::ChangePct,
            FieldKey::Mcap,
            FieldKey::Pe,
        ]
    );
}

// Feeding an interpretation back in must select the same rows, even
// for literals finer than the display magnitude (a rounded "1.52K"
// would re-admit the security priced at exactly 1520.50).
#[test]
fn test_interpretation_reparses_without_rounding() {
    let mut screener = Screener::new(sample_universe);
    let first = screener.query("price > 1520.5");
    let again = screener.query(&first.interpretation);
    assert_eq!(again.total, first.total);
    assert_eq!(again.data, first.data);
}

#[test]
fn test_zero_result_screen_suggests_loosening() {
    let mut screener = Screener::new(tiny_universe);
    let resp = screener.query("PE < 1");
    assert_eq!(resp.response_type, ResponseType::Screener);
    assert_eq!(resp.total, 0);
    assert!(resp.suggestions.iter().any(|s| s.contains("loosening")));
}
