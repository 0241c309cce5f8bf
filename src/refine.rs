//! Session context and refinement resolution.
//!
//! `SessionContext` is the per-session state behind the `+N` refinement
//! protocol: the last executed plan, its result set, and a bounded
//! most-recent-first plan history. It is exclusively owned by one
//! `Screener` façade — one context, one thread. Callers hosting
//! concurrent sessions must give each session its own façade.

use tracing::debug;

use crate::error::EngineError;
use crate::query::plan::{ParsedQuery, Predicate, QueryIntent, QueryPlan};
use crate::universe::Security;

/// Plans remembered for a session, most recent first.
const HISTORY_LIMIT: usize = 16;

/// Per-session state supporting incremental refinement.
///
/// Created empty on first use, updated after every successful screen or
/// refinement, cleared only by an explicit `clear` — it lives for the
/// UI session, with no TTL.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    last_plan: Option<QueryPlan>,
    last_results: Option<Vec<Security>>,
    history: Vec<QueryPlan>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_plan(&self) -> Option<&QueryPlan> {
        self.last_plan.as_ref()
    }

    pub fn last_results(&self) -> Option<&[Security]> {
        self.last_results.as_deref()
    }

    /// Record a successfully executed plan and its result set.
    pub fn remember(&mut self, plan: QueryPlan, results: Vec<Security>) {
        self.history.insert(0, plan.clone());
        self.history.truncate(HISTORY_LIMIT);
        self.last_plan = Some(plan);
        self.last_results = Some(results);
    }

    /// Drop all standing state.
    pub fn clear(&mut self) {
        debug!("session context cleared");
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.last_plan.is_none()
    }
}

/// Resolve a parsed query against the standing context.
///
/// - `NewScreen` ignores the context entirely.
/// - `Refinement(n)` requires a previous plan and merges into it:
///   new clauses conjoin via `And` (sector exclusions included, so an
///   exclusion always wins), a new sort replaces the previous one, and
///   a new limit replaces rather than stacks onto a prior limit.
///   The index `n` always targets the latest plan (single-lineage);
///   multi-branch refinement is a documented non-goal.
pub fn resolve(parsed: &ParsedQuery, ctx: &SessionContext) -> Result<QueryPlan, EngineError> {
    match parsed.intent {
        QueryIntent::NewScreen => Ok(parsed.plan.clone()),
        QueryIntent::Refinement(n) => {
            let previous = ctx.last_plan().ok_or(EngineError::NoContextToRefine)?;
            debug!(index = n, "refining previous plan");
            Ok(QueryPlan {
                predicate: Predicate::and_merge(
                    previous.predicate.clone(),
                    parsed.plan.predicate.clone(),
                ),
                sort: parsed.plan.sort.or(previous.sort),
                limit: parsed.plan.limit.or(previous.limit),
            })
        }
        // Help and ClearContext never reach plan resolution; the façade
        // answers them directly. Resolving them is a no-op plan.
        QueryIntent::Help | QueryIntent::ClearContext => Ok(QueryPlan::empty()),
    }
}
