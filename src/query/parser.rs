//! Best-effort query parser.
//!
//! Consumes a token stream and produces an intent plus a `QueryPlan`.
//! Parsing is deliberately forgiving: clauses that cannot be resolved
//! (unknown field, malformed number, unit mismatch) are collected as
//! skipped terms and the rest of the query still executes. This is
//! intentional product behavior, not error swallowing — prose filler
//! must never break a screen.
//!
//! Connective policy: clauses default to conjunction; an explicit `or`
//! starts a new disjunct, with `and` binding tighter than `or`.
//! Sector exclusions are hoisted to a top-level conjunct so that an
//! `or` branch can never re-admit an excluded sector.

use std::collections::BTreeSet;

use tracing::debug;

use crate::catalog::{FieldKey, FieldKind, Op, QualBand, Sector, Unit, CATALOG};
use crate::query::lexer::{Keyword, Token};
use crate::query::plan::{
    LimitSpec, ParsedQuery, Predicate, QueryIntent, QueryPlan, SortDirection, SortSpec,
};

/// Prose filler dropped without comment. Everything else that fails to
/// resolve is reported back as an ignored term.
const STOPWORDS: &[&str] = &[
    "stocks", "stock", "shares", "share", "companies", "company", "scrips",
    "with", "show", "me", "please", "find", "list", "give", "get", "display",
    "the", "a", "an", "of", "for", "that", "which", "have", "having", "has",
    "is", "are", "than", "to", "by", "sorted", "sort", "screen", "screening",
    "refinement", "refined", "previous", "limited", "where", "all", "only",
    "whose", "want", "i", "at",
];

/// Parse a token stream. Infallible: unresolvable input lands in
/// `skipped`, and a query where nothing resolved comes back with an
/// empty plan for the façade to answer with a help-style error.
pub fn parse(tokens: &[Token]) -> ParsedQuery {
    Parser::new(tokens).run()
}

struct Atom {
    or_before: bool,
    pred: Predicate,
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    atoms: Vec<Atom>,
    excludes: BTreeSet<Sector>,
    sort: Option<SortSpec>,
    limit: Option<LimitSpec>,
    skipped: Vec<String>,
    pending_or: bool,
    last_field: Option<FieldKey>,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            atoms: Vec::new(),
            excludes: BTreeSet::new(),
            sort: None,
            limit: None,
            skipped: Vec::new(),
            pending_or: false,
            last_field: None,
        }
    }

    fn run(mut self) -> ParsedQuery {
        let intent = match self.tokens.first() {
            Some(Token::RefinePrefix(n)) => {
                self.pos = 1;
                QueryIntent::Refinement(*n)
            }
            Some(Token::Keyword(Keyword::Help)) => {
                return ParsedQuery {
                    intent: QueryIntent::Help,
                    plan: QueryPlan::empty(),
                    skipped: Vec::new(),
                };
            }
            Some(Token::Keyword(Keyword::Clear)) => {
                return ParsedQuery {
                    intent: QueryIntent::ClearContext,
                    plan: QueryPlan::empty(),
                    skipped: Vec::new(),
                };
            }
            _ => QueryIntent::NewScreen,
        };

        while self.pos < self.tokens.len() {
            let token = self.tokens[self.pos].clone();
            match token {
                Token::Keyword(Keyword::And) => self.advance(),
                Token::Keyword(Keyword::Or) => {
                    self.pending_or = true;
                    self.advance();
                }
                Token::Keyword(Keyword::Exclude) | Token::Keyword(Keyword::Not) => {
                    self.advance();
                    let set = self.take_sector_list();
                    // "not"/"exclude" with no sector named carries no
                    // information; drop it quietly.
                    self.excludes.extend(set);
                }
                Token::Keyword(Keyword::In) => {
                    self.advance();
                    let set = self.take_sector_list();
                    if !set.is_empty() {
                        self.push_sector_in(set);
                    }
                }
                Token::Keyword(Keyword::Sector) => {
                    self.advance();
                    // "sector = IT" form; a stray "sector" word is noise
                    if matches!(self.peek(), Some(Token::CompareOp(Op::Eq))) {
                        self.advance();
                        let set = self.take_sector_list();
                        if !set.is_empty() {
                            self.push_sector_in(set);
                        }
                    }
                }
                Token::Keyword(Keyword::Top) | Token::Keyword(Keyword::Bottom) => {
                    let from_bottom = matches!(token, Token::Keyword(Keyword::Bottom));
                    self.advance();
                    match self.take_number() {
                        Some((value, _, _)) if value >= 1.0 => {
                            // Last limit wins.
                            self.limit = Some(LimitSpec {
                                count: value as u32,
                                from_bottom,
                            });
                        }
                        _ => self
                            .skipped
                            .push(if from_bottom { "bottom" } else { "top" }.to_string()),
                    }
                }
                Token::Keyword(Keyword::Ascending) | Token::Keyword(Keyword::Descending) => {
                    let direction = if matches!(token, Token::Keyword(Keyword::Ascending)) {
                        SortDirection::Asc
                    } else {
                        SortDirection::Desc
                    };
                    self.advance();
                    // "descending Mcap" or trailing "Mcap descending"
                    if let Some(field) = self.try_field() {
                        self.sort = Some(SortSpec { field, direction });
                    } else if let Some(field) = self.last_field {
                        self.sort = Some(SortSpec { field, direction });
                    } else {
                        self.skipped.push(
                            match direction {
                                SortDirection::Asc => "ascending",
                                SortDirection::Desc => "descending",
                            }
                            .to_string(),
                        );
                    }
                }
                // Stray grammar words with nothing to attach to
                Token::Keyword(Keyword::Between)
                | Token::Keyword(Keyword::Help)
                | Token::Keyword(Keyword::Clear) => self.advance(),
                // `+N` is an intent prefix; elsewhere it is noise
                Token::RefinePrefix(_) => self.advance(),
                Token::CompareOp(op) => {
                    // Operator with no field on its left.
                    self.advance();
                    match self.take_number() {
                        Some((_, _, raw)) => self.skipped.push(format!("{} {}", op, raw)),
                        None => self.skipped.push(op.to_string()),
                    }
                }
                Token::Number { value, .. } => {
                    self.advance();
                    self.skipped.push(format!("{}", value));
                }
                Token::Phrase(phrase) => {
                    self.advance();
                    if let Some(field) = CATALOG.resolve(&phrase) {
                        self.handle_field(field);
                    } else if let Some(sector) = CATALOG.resolve_sector(&phrase) {
                        let mut set = BTreeSet::new();
                        set.insert(sector);
                        self.push_sector_in(set);
                        self.consume_sector_word();
                    } else {
                        self.skipped.push(phrase);
                    }
                }
                Token::Ident(word) => self.handle_ident(&word),
            }
        }

        let mut predicate = fold_atoms(self.atoms);
        if !self.excludes.is_empty() {
            predicate = Predicate::and_merge(predicate, Predicate::SectorExclude(self.excludes));
        }

        let plan = QueryPlan {
            predicate,
            sort: self.sort,
            limit: self.limit,
        };

        if !self.skipped.is_empty() {
            debug!(skipped = ?self.skipped, "unresolved query terms");
        }

        ParsedQuery {
            intent,
            plan,
            skipped: self.skipped,
        }
    }

    // ========================================================================
    // Clause handlers
    // ========================================================================

    fn handle_ident(&mut self, word: &str) {
        if let Some(field) = self.try_field() {
            self.handle_field(field);
            return;
        }
        if let Some(sector) = self.try_sector() {
            let mut set = BTreeSet::new();
            set.insert(sector);
            self.push_sector_in(set);
            self.consume_sector_word();
            return;
        }

        let lower = word.to_lowercase();
        if let Some(band) = QualBand::from_word(&lower) {
            self.advance();
            self.handle_qualifier(&lower, band);
            return;
        }

        self.advance();
        if !STOPWORDS.contains(&lower.as_str()) {
            self.skipped.push(word.to_string());
        }
    }

    /// A recognized field name was consumed; decide what clause it heads.
    fn handle_field(&mut self, field: FieldKey) {
        let desc = CATALOG.descriptor(field);
        // "industry = IT" compares by membership, not numerically.
        if desc.kind == FieldKind::EnumSector {
            if matches!(self.peek(), Some(Token::CompareOp(Op::Eq))) {
                self.advance();
            }
            let set = self.take_sector_list();
            if !set.is_empty() {
                self.push_sector_in(set);
            }
            return;
        }
        match self.peek().cloned() {
            Some(Token::CompareOp(op)) => {
                self.advance();
                match self.take_number() {
                    Some((value, unit, raw)) => match CATALOG.coerce(field, value, unit) {
                        Ok(value) => self.push_atom(Predicate::Comparison { field, op, value }),
                        Err(_) => self.skipped.push(format!("{} {} {}", desc.display, op, raw)),
                    },
                    None => self.skipped.push(format!("{} {}", desc.display, op)),
                }
            }
            Some(Token::Keyword(Keyword::Between)) => {
                self.advance();
                let low = self.take_number();
                if matches!(self.peek(), Some(Token::Keyword(Keyword::And))) {
                    self.advance();
                }
                let high = self.take_number();
                match (low, high) {
                    (Some((lo, lo_unit, _)), Some((hi, hi_unit, _))) => {
                        match (
                            CATALOG.coerce(field, lo, lo_unit),
                            CATALOG.coerce(field, hi, hi_unit),
                        ) {
                            (Ok(lo), Ok(hi)) => {
                                // Inclusive on both bounds.
                                self.push_atom(Predicate::And(
                                    Box::new(Predicate::Comparison {
                                        field,
                                        op: Op::Ge,
                                        value: lo,
                                    }),
                                    Box::new(Predicate::Comparison {
                                        field,
                                        op: Op::Le,
                                        value: hi,
                                    }),
                                ));
                            }
                            _ => self.skipped.push(format!("{} between", desc.display)),
                        }
                    }
                    _ => self.skipped.push(format!("{} between", desc.display)),
                }
            }
            Some(Token::Keyword(Keyword::Ascending)) => {
                self.advance();
                self.sort = Some(SortSpec {
                    field,
                    direction: SortDirection::Asc,
                });
            }
            Some(Token::Keyword(Keyword::Descending)) => {
                self.advance();
                self.sort = Some(SortSpec {
                    field,
                    direction: SortDirection::Desc,
                });
            }
            // Bare field mention; remembered in case a sort keyword follows.
            _ => self.last_field = Some(field),
        }
    }

    /// "low PE" / "good ROE" style clause via the catalog's
    /// qualitative-threshold table.
    fn handle_qualifier(&mut self, word: &str, band: QualBand) {
        if let Some(field) = self.try_field() {
            match CATALOG.qualitative(field, band) {
                Some((op, value)) => self.push_atom(Predicate::Comparison { field, op, value }),
                None => self
                    .skipped
                    .push(format!("{} {}", word, CATALOG.descriptor(field).display)),
            }
        } else if word == "cheap" || word == "undervalued" {
            // Standalone valuation words mean cheap on earnings.
            let (op, value) = CATALOG
                .qualitative(FieldKey::Pe, QualBand::Low)
                .expect("PE has a qualitative entry");
            self.push_atom(Predicate::Comparison {
                field: FieldKey::Pe,
                op,
                value,
            });
        }
        // A bare "high"/"low" with no field is treated as filler.
    }

    // ========================================================================
    // Atom assembly
    // ========================================================================

    fn push_atom(&mut self, pred: Predicate) {
        let or_before = std::mem::take(&mut self.pending_or);
        self.atoms.push(Atom { or_before, pred });
    }

    /// And-adjacent bare sectors union into one `SectorIn` ("IT and
    /// pharma stocks" means either sector, not an empty intersection).
    fn push_sector_in(&mut self, set: BTreeSet<Sector>) {
        if !self.pending_or {
            if let Some(last) = self.atoms.last_mut() {
                if let Predicate::SectorIn(existing) = &mut last.pred {
                    existing.extend(set);
                    return;
                }
            }
        }
        self.push_atom(Predicate::SectorIn(set));
    }

    // ========================================================================
    // Token-level helpers
    // ========================================================================

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    /// Longest catalog match over up to three consecutive ident tokens
    /// ("debt to equity", "market cap", "pe"). Advances past the match.
    fn try_field(&mut self) -> Option<FieldKey> {
        for n in (1..=3).rev() {
            if let Some(joined) = self.joined_idents(n) {
                if let Some(field) = CATALOG.resolve(&joined) {
                    self.pos += n;
                    return Some(field);
                }
            }
        }
        None
    }

    /// Sector lookup over up to two consecutive ident tokens
    /// ("real estate", "pharma"). Advances past the match.
    fn try_sector(&mut self) -> Option<Sector> {
        for n in (1..=2).rev() {
            if let Some(joined) = self.joined_idents(n) {
                if let Some(sector) = CATALOG.resolve_sector(&joined) {
                    self.pos += n;
                    return Some(sector);
                }
            }
        }
        None
    }

    fn joined_idents(&self, n: usize) -> Option<String> {
        if self.pos + n > self.tokens.len() {
            return None;
        }
        let words: Option<Vec<&str>> = self.tokens[self.pos..self.pos + n]
            .iter()
            .map(|t| match t {
                Token::Ident(w) => Some(w.as_str()),
                _ => None,
            })
            .collect();
        words.map(|ws| ws.join(" "))
    }

    /// Consume a trailing "sector"/"sectors" word after a bare sector name.
    fn consume_sector_word(&mut self) {
        if matches!(self.peek(), Some(Token::Keyword(Keyword::Sector))) {
            self.advance();
        }
    }

    /// One or more sector names, optionally joined by "and" (commas are
    /// whitespace to the lexer), with a trailing "sector(s)" consumed.
    fn take_sector_list(&mut self) -> BTreeSet<Sector> {
        let mut set = BTreeSet::new();
        loop {
            if let Some(sector) = self.try_sector() {
                set.insert(sector);
                continue;
            }
            // Consume the connective only when a sector actually follows.
            if matches!(self.peek(), Some(Token::Keyword(Keyword::And))) {
                let save = self.pos;
                self.advance();
                if let Some(sector) = self.try_sector() {
                    set.insert(sector);
                    continue;
                }
                self.pos = save;
            }
            break;
        }
        self.consume_sector_word();
        set
    }

    /// Read a number, merging a following unit word ("5 crores") and
    /// tolerating the "than" filler of worded operators.
    fn take_number(&mut self) -> Option<(f64, Option<Unit>, String)> {
        if let Some(Token::Ident(w)) = self.peek() {
            if w.eq_ignore_ascii_case("than") {
                self.advance();
            }
        }
        match self.peek() {
            Some(Token::Number { value, unit }) => {
                let (value, mut unit) = (*value, *unit);
                self.advance();
                if unit.is_none() {
                    if let Some(Token::Ident(w)) = self.peek() {
                        if let Some(u) = Unit::from_suffix(&w.to_lowercase()) {
                            unit = Some(u);
                            self.advance();
                        }
                    }
                }
                let raw = match unit {
                    Some(u) => format!("{}{}", value, u),
                    None => format!("{}", value),
                };
                Some((value, unit, raw))
            }
            _ => None,
        }
    }
}

/// Fold the atom list with `and` binding tighter than `or`: consecutive
/// and-connected atoms form a conjunct group; `or` starts a new group;
/// groups are disjoined.
fn fold_atoms(atoms: Vec<Atom>) -> Predicate {
    let mut groups: Vec<Predicate> = Vec::new();
    let mut current = Predicate::True;
    for atom in atoms {
        if atom.or_before && !matches!(current, Predicate::True) {
            groups.push(current);
            current = Predicate::True;
        }
        current = Predicate::and_merge(current, atom.pred);
    }
    if !matches!(current, Predicate::True) {
        groups.push(current);
    }
    groups.into_iter().fold(Predicate::True, Predicate::or_merge)
}
