//! Execution engine: applies a resolved plan to the security universe.
//!
//! Pure and synchronous — a single O(U) filter pass followed by an
//! O(U log U) stable sort. No indexes or caches; the universe is an
//! immutable snapshot of a few thousand securities per call.

use std::cmp::Ordering;

use tracing::debug;

use crate::query::plan::{Predicate, QueryPlan, SortDirection};
use crate::universe::Security;

/// Outcome of executing a plan.
#[derive(Debug, Clone)]
pub struct Execution {
    /// Filtered, sorted and limited rows.
    pub rows: Vec<Security>,
    /// Match count before the limit was applied.
    pub total: usize,
}

/// Filter, sort and limit the universe per the plan.
///
/// Default order with no `SortSpec` is relevance-neutral: the original
/// universe order. `top N` keeps the first N after sorting, `bottom N`
/// the last N.
pub fn execute(universe: &[Security], plan: &QueryPlan) -> Execution {
    let mut rows: Vec<Security> = universe
        .iter()
        .filter(|sec| eval(&plan.predicate, sec))
        .cloned()
        .collect();

    if let Some(sort) = plan.sort {
        // Stable sort; missing values go last regardless of direction.
        rows.sort_by(|a, b| {
            match (a.metric(sort.field), b.metric(sort.field)) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(x), Some(y)) => {
                    let ord = x.partial_cmp(&y).unwrap_or(Ordering::Equal);
                    match sort.direction {
                        SortDirection::Asc => ord,
                        SortDirection::Desc => ord.reverse(),
                    }
                }
            }
        });
    }

    let total = rows.len();
    if let Some(limit) = plan.limit {
        let n = limit.count as usize;
        if rows.len() > n {
            if limit.from_bottom {
                rows.drain(..rows.len() - n);
            } else {
                rows.truncate(n);
            }
        }
    }

    debug!(total, kept = rows.len(), "plan executed");
    Execution { rows, total }
}

/// Short-circuiting predicate evaluation. Missing metric values fail
/// any comparison clause.
fn eval(pred: &Predicate, sec: &Security) -> bool {
    match pred {
        Predicate::True => true,
        Predicate::Comparison { field, op, value } => match sec.metric(*field) {
            Some(v) => op.holds(v, *value),
            None => false,
        },
        Predicate::SectorIn(set) => set.contains(&sec.sector),
        Predicate::SectorExclude(set) => !set.contains(&sec.sector),
        Predicate::And(a, b) => eval(a, sec) && eval(b, sec),
        Predicate::Or(a, b) => eval(a, sec) || eval(b, sec),
    }
}
