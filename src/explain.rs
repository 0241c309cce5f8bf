//! Interpretation and suggestion generation.
//!
//! Renders a resolved plan back into a deterministic sentence
//! ("Screening for: PE < 15.00 and ROE > 20.0%, excluding Pharma
//! sector, sorted by Mcap descending, limited to top 5") and proposes
//! rule-based follow-ups from result cardinality and parse leftovers.
//!
//! The sentence is re-parseable: feeding it back through the lexer and
//! parser reproduces an equivalent plan for any plan built from
//! supported clause types. Clause ordering is canonical (catalog field
//! order within a conjunct) so interpretations are stable for tests.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::catalog::{FieldKey, Op, Sector, CATALOG};
use crate::query::plan::{Predicate, QueryIntent, QueryPlan, SortDirection};
use crate::universe::Security;

/// Render the resolved plan as a human-readable sentence.
pub fn interpret(plan: &QueryPlan, intent: QueryIntent) -> String {
    let prefix = match intent {
        QueryIntent::Refinement(n) => format!("Refinement +{} of previous screen: ", n),
        _ => "Screening for: ".to_string(),
    };

    let (body, excludes) = render_predicate(&plan.predicate);
    let mut sentence = prefix;
    sentence.push_str(body.as_deref().unwrap_or("all securities"));

    if !excludes.is_empty() {
        sentence.push_str(&format!(
            ", excluding {} {}",
            join_sectors(&excludes),
            plural_sector(excludes.len())
        ));
    }
    if let Some(sort) = plan.sort {
        let dir = match sort.direction {
            SortDirection::Asc => "ascending",
            SortDirection::Desc => "descending",
        };
        sentence.push_str(&format!(
            ", sorted by {} {}",
            CATALOG.descriptor(sort.field).display,
            dir
        ));
    }
    if let Some(limit) = plan.limit {
        let end = if limit.from_bottom { "bottom" } else { "top" };
        sentence.push_str(&format!(", limited to {} {}", end, limit.count));
    }
    sentence
}

/// Rule-based follow-up suggestions. Deterministic; never learned.
pub fn suggest(
    plan: &QueryPlan,
    skipped: &[String],
    rows: &[Security],
    total: usize,
    universe: &[Security],
) -> Vec<String> {
    let mut out = Vec::new();

    // Surface what the parser could not place.
    let mut seen = BTreeSet::new();
    for term in skipped {
        if seen.insert(term.clone()) {
            out.push(format!("ignored: {}", term));
        }
    }

    if total == 0 {
        match tightest_clause(&plan.predicate, universe) {
            Some(clause) => out.push(format!("no matches — try loosening {}", clause)),
            None => out.push("no matches — try removing a sector filter".to_string()),
        }
    } else if total > 50 {
        out.push(
            "large result set — add a sort and limit, e.g. 'descending Mcap top 10'".to_string(),
        );
    } else {
        let sectors: BTreeMap<Sector, usize> =
            rows.iter().fold(BTreeMap::new(), |mut acc, sec| {
                *acc.entry(sec.sector).or_insert(0) += 1;
                acc
            });
        if sectors.len() >= 2 {
            // Dominant sector; ties break toward catalog order.
            let dominant = sectors
                .iter()
                .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
                .map(|(sector, _)| *sector)
                .expect("non-empty sector map");
            out.push(format!("refine with '+1 exclude {}'", dominant));
        }
        if plan.limit.is_none() && total > 5 {
            out.push("refine with '+1 top 5'".to_string());
        }
    }

    if out.is_empty() {
        out.push("refine with '+1 <more criteria>' or 'clear' to start over".to_string());
    }
    out
}

// ============================================================================
// Predicate rendering
// ============================================================================

/// Render the predicate body and collect hoisted sector exclusions.
///
/// Exclusions are always top-level conjuncts by construction (parser
/// hoisting, refinement merging), which is what lets them render as a
/// trailing ", excluding …" segment.
fn render_predicate(pred: &Predicate) -> (Option<String>, BTreeSet<Sector>) {
    let mut leaves = Vec::new();
    flatten_and(pred, &mut leaves);

    let mut excludes = BTreeSet::new();
    let mut others = Vec::new();
    for leaf in leaves {
        match leaf {
            Predicate::SectorExclude(set) => excludes.extend(set.iter().copied()),
            Predicate::True => {}
            other => others.push(other),
        }
    }

    if others.is_empty() {
        return (None, excludes);
    }

    // A pure disjunction renders without parentheses.
    if others.len() == 1 {
        if let Predicate::Or(_, _) = others[0] {
            return (Some(render_or(others[0])), excludes);
        }
    }

    (Some(render_conjuncts(&others, true)), excludes)
}

/// Render an and-connected set of leaves in canonical order:
/// comparisons by catalog field order, then sector membership, then
/// any nested disjunctions.
fn render_conjuncts(leaves: &[&Predicate], parenthesize_or: bool) -> String {
    let mut comparisons: Vec<(FieldKey, Op, f64)> = Vec::new();
    let mut sector_ins: Vec<&BTreeSet<Sector>> = Vec::new();
    let mut ors: Vec<&Predicate> = Vec::new();

    for leaf in leaves {
        match leaf {
            Predicate::Comparison { field, op, value } => {
                comparisons.push((*field, *op, *value))
            }
            Predicate::SectorIn(set) => sector_ins.push(set),
            Predicate::Or(_, _) => ors.push(leaf),
            // True contributes nothing; SectorExclude is hoisted above.
            _ => {}
        }
    }

    comparisons.sort_by(|a, b| {
        (a.0.ordinal(), a.1.rank())
            .cmp(&(b.0.ordinal(), b.1.rank()))
            .then(a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut parts: Vec<String> = comparisons
        .iter()
        .map(|(field, op, value)| {
            format!(
                "{} {} {}",
                CATALOG.descriptor(*field).display,
                op,
                CATALOG.format_value(*field, *value)
            )
        })
        .collect();

    for set in sector_ins {
        parts.push(format!(
            "in {} {}",
            join_sectors(set),
            plural_sector(set.len())
        ));
    }

    for or_tree in ors {
        let rendered = render_or(or_tree);
        if parenthesize_or {
            parts.push(format!("({})", rendered));
        } else {
            parts.push(rendered);
        }
    }

    parts.join(" and ")
}

/// Render a disjunction as or-joined conjunct groups.
fn render_or(pred: &Predicate) -> String {
    let mut groups = Vec::new();
    flatten_or(pred, &mut groups);
    groups
        .into_iter()
        .map(|group| {
            let mut leaves = Vec::new();
            flatten_and(group, &mut leaves);
            render_conjuncts(&leaves, true)
        })
        .collect::<Vec<_>>()
        .join(" or ")
}

fn flatten_and<'a>(pred: &'a Predicate, out: &mut Vec<&'a Predicate>) {
    match pred {
        Predicate::And(a, b) => {
            flatten_and(a, out);
            flatten_and(b, out);
        }
        other => out.push(other),
    }
}

fn flatten_or<'a>(pred: &'a Predicate, out: &mut Vec<&'a Predicate>) {
    match pred {
        Predicate::Or(a, b) => {
            flatten_or(a, out);
            flatten_or(b, out);
        }
        other => out.push(other),
    }
}

fn join_sectors(set: &BTreeSet<Sector>) -> String {
    set.iter()
        .map(|s| s.name())
        .collect::<Vec<_>>()
        .join(", ")
}

fn plural_sector(n: usize) -> &'static str {
    if n == 1 {
        "sector"
    } else {
        "sectors"
    }
}

// ============================================================================
// Loosening heuristics
// ============================================================================

/// The comparison clause that passes the smallest share of the
/// universe, rendered for a loosening suggestion. Ties break toward
/// catalog order.
fn tightest_clause(pred: &Predicate, universe: &[Security]) -> Option<String> {
    let mut comparisons = Vec::new();
    collect_comparisons(pred, &mut comparisons);
    if comparisons.is_empty() || universe.is_empty() {
        return None;
    }

    comparisons.sort_by_key(|(field, op, _)| (field.ordinal(), op.rank()));

    let mut tightest: Option<((FieldKey, Op, f64), usize)> = None;
    for clause in comparisons {
        let (field, op, value) = clause;
        let passing = universe
            .iter()
            .filter(|sec| sec.metric(field).map(|v| op.holds(v, value)).unwrap_or(false))
            .count();
        match &tightest {
            Some((_, best)) if passing >= *best => {}
            _ => tightest = Some((clause, passing)),
        }
    }

    tightest.map(|((field, op, value), _)| {
        format!(
            "{} {} {}",
            CATALOG.descriptor(field).display,
            op,
            CATALOG.format_value(field, value)
        )
    })
}

fn collect_comparisons(pred: &Predicate, out: &mut Vec<(FieldKey, Op, f64)>) {
    match pred {
        Predicate::Comparison { field, op, value } => out.push((*field, *op, *value)),
        Predicate::And(a, b) | Predicate::Or(a, b) => {
            collect_comparisons(a, out);
            collect_comparisons(b, out);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::lexer::tokenize;
    use crate::query::parser::parse;
    use crate::query::plan::{LimitSpec, SortSpec};
    use crate::universe::sample_universe;

    fn plan_of(text: &str) -> QueryPlan {
        parse(&tokenize(text)).plan
    }

    #[test]
    fn test_interpret_full_sentence() {
        let mut plan = plan_of("PE < 15 and ROE > 20% exclude pharma");
        plan.sort = Some(SortSpec {
            field: FieldKey::Mcap,
            direction: SortDirection::Desc,
        });
        plan.limit = Some(LimitSpec { count: 5, from_bottom: false });

        assert_eq!(
            interpret(&plan, QueryIntent::NewScreen),
            "Screening for: PE < 15.00 and ROE > 20.0%, excluding Pharma sector, \
             sorted by Mcap descending, limited to top 5"
        );
    }

    #[test]
    fn test_interpret_clause_order_is_canonical() {
        // Same clauses, either writing order, same sentence.
        let a = interpret(&plan_of("ROE > 20% and PE < 15"), QueryIntent::NewScreen);
        let b = interpret(&plan_of("PE < 15 and ROE > 20%"), QueryIntent::NewScreen);
        assert_eq!(a, b);
        assert_eq!(a, "Screening for: PE < 15.00 and ROE > 20.0%");
    }

    #[test]
    fn test_interpret_refinement_carries_index() {
        let plan = plan_of("+2 top 5");
        let text = interpret(&plan, QueryIntent::Refinement(2));
        assert!(text.starts_with("Refinement +2 of previous screen:"));
        assert!(text.ends_with("limited to top 5"));
    }

    #[test]
    fn test_interpret_or_groups() {
        let text = interpret(
            &plan_of("PE < 15 and ROE > 20 or sector = IT"),
            QueryIntent::NewScreen,
        );
        assert_eq!(
            text,
            "Screening for: PE < 15.00 and ROE > 20.0% or in IT sector"
        );
    }

    // Re-parse property: the sentence reproduces an equivalent plan.
    // Equivalence is checked two ways: the re-parsed plan renders to the
    // same sentence (clause order is canonical), and it selects the same
    // rows from the sample universe.
    #[test]
    fn test_interpretation_reparses_to_equivalent_plan() {
        let universe = sample_universe();
        for query in [
            "PE < 15 and ROE > 20%",
            "PE < 15 and ROE > 20 or sector = IT",
            "energy sector Mcap > $5B",
            "PE between 10 and 20 exclude pharma",
            "roe > 15% descending Mcap top 5",
            "dividend yield > 2% bottom 3",
            "price > 1520.5",
        ] {
            let original = plan_of(query);
            let sentence = interpret(&original, QueryIntent::NewScreen);
            let reparsed = parse(&tokenize(&sentence));
            assert!(
                reparsed.skipped.is_empty(),
                "leftovers for {:?}: {:?}",
                query,
                reparsed.skipped
            );
            assert_eq!(
                interpret(&reparsed.plan, QueryIntent::NewScreen),
                sentence,
                "render fixed-point failed for {:?}",
                query
            );
            assert_eq!(
                crate::engine::execute(&universe, &reparsed.plan).rows,
                crate::engine::execute(&universe, &original).rows,
                "execution differs for {:?}",
                query
            );
        }
    }

    // A literal with more precision than the magnitude suffix carries
    // must come back unchanged, not rounded ("1.52K" would re-parse to
    // 1520.0).
    #[test]
    fn test_interpretation_preserves_nonround_values() {
        let original = plan_of("price > 1520.5");
        let sentence = interpret(&original, QueryIntent::NewScreen);
        assert_eq!(sentence, "Screening for: Price > 1520.50");
        let reparsed = parse(&tokenize(&sentence));
        assert_eq!(reparsed.plan, original);
    }

    #[test]
    fn test_suggest_reports_ignored_terms() {
        let plan = plan_of("PE < 15");
        let universe = sample_universe();
        let skipped = vec!["quantum".to_string(), "quantum".to_string()];
        let suggestions = suggest(&plan, &skipped, &universe, universe.len(), &universe);
        assert_eq!(
            suggestions.iter().filter(|s| s.contains("ignored: quantum")).count(),
            1
        );
    }

    #[test]
    fn test_suggest_loosening_on_empty_result() {
        let plan = plan_of("PE < 1 and ROE > 5%");
        let universe = sample_universe();
        let suggestions = suggest(&plan, &[], &[], 0, &universe);
        // PE < 1 passes nothing; ROE > 5% passes most of the universe.
        assert!(suggestions.iter().any(|s| s.contains("loosening PE < 1.00")));
    }

    #[test]
    fn test_suggest_refinements_on_mixed_sectors() {
        let plan = plan_of("roe > 10%");
        let universe = sample_universe();
        let exec = crate::engine::execute(&universe, &plan);
        let suggestions = suggest(&plan, &[], &exec.rows, exec.total, &universe);
        assert!(suggestions.iter().any(|s| s.contains("+1 exclude")));
        assert!(suggestions.iter().any(|s| s.contains("+1 top 5")));
    }

    #[test]
    fn test_suggest_never_empty() {
        let plan = plan_of("realty stocks");
        let universe = sample_universe();
        let exec = crate::engine::execute(&universe, &plan);
        let suggestions = suggest(&plan, &[], &exec.rows, exec.total, &universe);
        assert!(!suggestions.is_empty());
    }
}
