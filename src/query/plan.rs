//! Query plan model: predicate tree, sort/limit directives, intents.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::catalog::{FieldKey, Op, Sector};

/// Predicate tree over a security.
///
/// Invariant: `value` in a `Comparison` is already coerced to the
/// field's canonical unit at parse time; execution never re-parses text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    /// Matches everything. Identity for `and_merge`.
    True,
    Comparison {
        field: FieldKey,
        op: Op,
        value: f64,
    },
    SectorIn(BTreeSet<Sector>),
    SectorExclude(BTreeSet<Sector>),
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
}

impl Predicate {
    /// Conjoin two predicates, dropping `True` identities.
    pub fn and_merge(a: Predicate, b: Predicate) -> Predicate {
        match (a, b) {
            (Predicate::True, b) => b,
            (a, Predicate::True) => a,
            (a, b) => Predicate::And(Box::new(a), Box::new(b)),
        }
    }

    /// Disjoin two predicates, dropping `True` identities.
    pub fn or_merge(a: Predicate, b: Predicate) -> Predicate {
        match (a, b) {
            (Predicate::True, b) => b,
            (a, Predicate::True) => a,
            (a, b) => Predicate::Or(Box::new(a), Box::new(b)),
        }
    }

    /// Fields referenced by comparison clauses, in traversal order.
    pub fn referenced_fields(&self, out: &mut Vec<FieldKey>) {
        match self {
            Predicate::Comparison { field, .. } => {
                if !out.contains(field) {
                    out.push(*field);
                }
            }
            Predicate::And(a, b) | Predicate::Or(a, b) => {
                a.referenced_fields(out);
                b.referenced_fields(out);
            }
            _ => {}
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Optional sort directive of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: FieldKey,
    pub direction: SortDirection,
}

/// Limit directive: keep the first or last N after sorting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LimitSpec {
    pub count: u32,
    /// `bottom N` keeps the last N instead of the first N.
    pub from_bottom: bool,
}

/// The structured, executable representation of a parsed query.
/// Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPlan {
    pub predicate: Predicate,
    pub sort: Option<SortSpec>,
    pub limit: Option<LimitSpec>,
}

impl QueryPlan {
    pub fn empty() -> Self {
        Self {
            predicate: Predicate::True,
            sort: None,
            limit: None,
        }
    }

    /// True when the plan carries no filter, sort or limit at all.
    pub fn is_empty(&self) -> bool {
        matches!(self.predicate, Predicate::True) && self.sort.is_none() && self.limit.is_none()
    }
}

/// What the user is asking for, decided at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryIntent {
    /// A fresh screen; ignores any standing context.
    NewScreen,
    /// `+N` prefix: refine the previous result set. The index is
    /// accepted for forward compatibility but always targets the
    /// latest plan (single-lineage refinement).
    Refinement(u32),
    Help,
    ClearContext,
}

/// Parser output: intent, plan, and the clauses that could not be
/// resolved (surfaced later as "ignored" suggestions, never as errors).
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedQuery {
    pub intent: QueryIntent,
    pub plan: QueryPlan,
    pub skipped: Vec<String>,
}
