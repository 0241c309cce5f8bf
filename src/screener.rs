//! Screener façade: the public query/clear-context surface.
//!
//! Owns the `SessionContext` lifecycle and wires tokenizer → parser →
//! refinement resolver → execution engine → interpretation. Every call
//! returns a well-formed `ScreenerResponse`, including all user-input
//! error paths — the UI's "always render something" contract.

use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};

use crate::catalog::FieldKey;
use crate::engine;
use crate::error::EngineError;
use crate::explain;
use crate::query::lexer::tokenize;
use crate::query::parser::parse;
use crate::query::plan::{QueryIntent, QueryPlan};
use crate::refine::{self, SessionContext};
use crate::universe::Security;

/// Fixed default column set, extended with any plan-referenced fields.
/// The UI depends on exactly this order.
const DEFAULT_COLUMNS: [FieldKey; 7] = [
    FieldKey::Symbol,
    FieldKey::Name,
    FieldKey::Sector,
    FieldKey::Price,
    FieldKey::ChangePct,
    FieldKey::Mcap,
    FieldKey::Pe,
];

/// Response category rendered by the command bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    Screener,
    Help,
    Error,
}

/// Derived output of one query. Not persisted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenerResponse {
    pub data: Vec<Security>,
    pub columns: Vec<FieldKey>,
    pub interpretation: String,
    pub suggestions: Vec<String>,
    pub total: u32,
    pub execution_time_ms: f64,
    #[serde(rename = "type")]
    pub response_type: ResponseType,
}

/// The screener engine façade.
///
/// One instance per UI session: `SessionContext` is exclusively owned
/// and mutated here, so a multi-session host must create one `Screener`
/// per session (one context, one thread).
pub struct Screener {
    provider: Box<dyn Fn() -> Vec<Security> + Send>,
    ctx: SessionContext,
}

impl Screener {
    /// Create a screener over an injected universe provider. The
    /// universe is re-fetched per query and treated as an immutable
    /// snapshot for that call.
    pub fn new(provider: impl Fn() -> Vec<Security> + Send + 'static) -> Self {
        Self {
            provider: Box::new(provider),
            ctx: SessionContext::new(),
        }
    }

    /// Run one query: parse, resolve against context, execute, explain.
    pub fn query(&mut self, text: &str) -> ScreenerResponse {
        let started = Instant::now();
        let parsed = parse(&tokenize(text));

        match parsed.intent {
            QueryIntent::Help => {
                return self.finish(help_response(), started);
            }
            QueryIntent::ClearContext => {
                self.ctx.clear();
                return self.finish(clear_response(), started);
            }
            QueryIntent::NewScreen if parsed.plan.is_empty() => {
                // Zero clauses parsed: the one case that degrades to an
                // error-typed response, still help-style.
                warn!(query = text, "no recognizable criteria");
                return self.finish(unrecognized_response(&parsed.skipped), started);
            }
            _ => {}
        }

        let resolved = match refine::resolve(&parsed, &self.ctx) {
            Ok(plan) => plan,
            Err(err @ EngineError::NoContextToRefine) => {
                // User-visible, non-fatal; standing context untouched.
                warn!("refinement without context");
                return self.finish(no_context_response(&err), started);
            }
        };

        let universe = (self.provider)();
        let execution = engine::execute(&universe, &resolved);
        let interpretation = explain::interpret(&resolved, parsed.intent);
        let suggestions = explain::suggest(
            &resolved,
            &parsed.skipped,
            &execution.rows,
            execution.total,
            &universe,
        );
        let columns = columns_for(&resolved);

        self.ctx.remember(resolved, execution.rows.clone());

        info!(
            total = execution.total,
            kept = execution.rows.len(),
            intent = ?parsed.intent,
            "query complete"
        );

        self.finish(
            ScreenerResponse {
                total: execution.total as u32,
                data: execution.rows,
                columns,
                interpretation,
                suggestions,
                execution_time_ms: 0.0,
                response_type: ResponseType::Screener,
            },
            started,
        )
    }

    /// Drop the standing refinement context.
    pub fn clear_context(&mut self) {
        self.ctx.clear();
    }

    /// Whether a refinement currently has something to refine.
    pub fn has_context(&self) -> bool {
        !self.ctx.is_empty()
    }

    fn finish(&self, mut response: ScreenerResponse, started: Instant) -> ScreenerResponse {
        response.execution_time_ms = started.elapsed().as_secs_f64() * 1000.0;
        response
    }
}

/// Default columns plus plan-referenced fields, deduped, catalog order
/// for the extras.
fn columns_for(plan: &QueryPlan) -> Vec<FieldKey> {
    let mut referenced = Vec::new();
    plan.predicate.referenced_fields(&mut referenced);
    if let Some(sort) = plan.sort {
        if !referenced.contains(&sort.field) {
            referenced.push(sort.field);
        }
    }

    let mut columns: Vec<FieldKey> = DEFAULT_COLUMNS.to_vec();
    for key in FieldKey::ALL {
        if referenced.contains(&key) && !columns.contains(&key) {
            columns.push(key);
        }
    }
    columns
}

fn help_response() -> ScreenerResponse {
    ScreenerResponse {
        data: Vec::new(),
        columns: DEFAULT_COLUMNS.to_vec(),
        interpretation: "Try queries like: 'PE < 15 and ROE > 20%' · 'energy sector Mcap > $5B' \
                         · 'low PE good ROE top 10' · '+1 exclude pharma' · '+1 top 5'"
            .to_string(),
        suggestions: vec![
            "fields: symbol, name, sector, price, change %, Mcap, volume, PE, PB, ROE, ROCE, \
             dividend yield, debt to equity, EPS, profit growth, sales growth"
                .to_string(),
            "sectors: IT, Banking, Pharma, Energy, FMCG, Auto, Metal, Realty, Infra, Telecom"
                .to_string(),
            "refine the last screen with '+1 …'; 'clear' resets the context".to_string(),
        ],
        total: 0,
        execution_time_ms: 0.0,
        response_type: ResponseType::Help,
    }
}

fn clear_response() -> ScreenerResponse {
    ScreenerResponse {
        data: Vec::new(),
        columns: DEFAULT_COLUMNS.to_vec(),
        interpretation: "Context cleared — the next query starts a fresh screen.".to_string(),
        suggestions: vec!["try 'PE < 15 and ROE > 20%', or 'help' for examples".to_string()],
        total: 0,
        execution_time_ms: 0.0,
        response_type: ResponseType::Screener,
    }
}

fn unrecognized_response(skipped: &[String]) -> ScreenerResponse {
    let mut suggestions: Vec<String> = skipped
        .iter()
        .map(|term| format!("ignored: {}", term))
        .collect();
    suggestions.push("type 'help' for query examples".to_string());
    ScreenerResponse {
        data: Vec::new(),
        columns: DEFAULT_COLUMNS.to_vec(),
        interpretation: "I couldn't understand that — try something like 'PE < 15 and ROE > 20%'."
            .to_string(),
        suggestions,
        total: 0,
        execution_time_ms: 0.0,
        response_type: ResponseType::Error,
    }
}

fn no_context_response(err: &EngineError) -> ScreenerResponse {
    ScreenerResponse {
        data: Vec::new(),
        columns: DEFAULT_COLUMNS.to_vec(),
        interpretation: err.to_string(),
        suggestions: vec!["run a screen first, e.g. 'PE < 15'".to_string()],
        total: 0,
        execution_time_ms: 0.0,
        response_type: ResponseType::Error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::universe::sample_universe;

    fn screener() -> Screener {
        Screener::new(sample_universe)
    }

    #[test]
    fn test_default_columns_exact_order() {
        let mut s = screener();
        let resp = s.query("PE < 20");
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

    #[test]
    fn test_referenced_fields_extend_columns() {
        let mut s = screener();
        let resp = s.query("roe > 15% descending dividend yield");
        assert_eq!(
            &resp.columns[..7],
            &DEFAULT_COLUMNS[..],
        );
        assert!(resp.columns.contains(&FieldKey::Roe));
        assert!(resp.columns.contains(&FieldKey::DividendYield));
        // Extras in catalog order: ROE before dividend yield.
        let roe = resp.columns.iter().position(|k| *k == FieldKey::Roe).unwrap();
        let dy = resp.columns.iter().position(|k| *k == FieldKey::DividendYield).unwrap();
        assert!(roe < dy);
    }

    #[test]
    fn test_help_query() {
        let mut s = screener();
        let resp = s.query("help");
        assert_eq!(resp.response_type, ResponseType::Help);
        assert!(resp.interpretation.contains("PE < 15"));
        assert!(!resp.suggestions.is_empty());
    }

    #[test]
    fn test_unrecognized_input_is_error_typed_but_valid() {
        let mut s = screener();
        let resp = s.query("sing me a song");
        assert_eq!(resp.response_type, ResponseType::Error);
        assert!(resp.data.is_empty());
        assert!(!resp.interpretation.is_empty());
        assert!(resp.suggestions.iter().any(|sug| sug.contains("ignored:")));
    }

    #[test]
    fn test_refinement_without_context_is_user_error() {
        let mut s = screener();
        let resp = s.query("+1 exclude pharma");
        assert_eq!(resp.response_type, ResponseType::Error);
        assert!(resp.interpretation.contains("no previous screen"));
        // And the (empty) context is untouched: a real screen still works.
        let resp = s.query("PE < 20");
        assert_eq!(resp.response_type, ResponseType::Screener);
    }

    #[test]
    fn test_clear_query_resets_context() {
        let mut s = screener();
        s.query("PE < 20");
        assert!(s.has_context());
        let resp = s.query("clear");
        assert_eq!(resp.response_type, ResponseType::Screener);
        assert!(!s.has_context());
        // Refining now fails again.
        let resp = s.query("+1 top 5");
        assert_eq!(resp.response_type, ResponseType::Error);
    }

    #[test]
    fn test_response_serializes_with_ui_field_names() {
        let mut s = screener();
        let resp = s.query("IT sector PE < 30");
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("executionTimeMs").is_some());
        assert_eq!(json.get("type").unwrap(), "screener");
        assert!(json.get("columns").unwrap().as_array().unwrap().contains(
            &serde_json::Value::String("changePct".to_string())
        ));
    }

    #[test]
    fn test_total_counts_prelimit_matches() {
        let mut s = screener();
        let all = s.query("roe > 10%");
        let limited = s.query("roe > 10% top 3");
        assert_eq!(limited.data.len(), 3);
        assert_eq!(limited.total, all.total);
    }
}
