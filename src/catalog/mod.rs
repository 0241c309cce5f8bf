//! Field catalog: the static registry of queryable fields.
//!
//! Maps human-usable field names and aliases ("Mcap", "market cap",
//! "marketcap") to typed descriptors, normalizes sector names, and coerces
//! user-facing literals into canonical units at parse time so execution
//! never re-parses text.
//!
//! Canonical units:
//! - Currency: rupees (`$5B` / `₹5B` → 5_000_000_000)
//! - Percentage: fraction (`20%` → 0.20; a bare `20` on a percentage
//!   field also means 20%)
//! - Ratio / Numeric: pass through unchanged

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// The global field catalog, built once at startup.
pub static CATALOG: Lazy<FieldCatalog> = Lazy::new(FieldCatalog::new);

// ============================================================================
// Field Keys and Kinds
// ============================================================================

/// Closed set of queryable fields.
///
/// Declaration order is the canonical catalog order used for column
/// layout and deterministic interpretation rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKey {
    Symbol,
    Name,
    Sector,
    Price,
    ChangePct,
    Mcap,
    Volume,
    Pe,
    Pb,
    Roe,
    Roce,
    DividendYield,
    DebtToEquity,
    Eps,
    ProfitGrowth,
    SalesGrowth,
}

impl FieldKey {
    /// All fields in canonical catalog order.
    pub const ALL: [FieldKey; 16] = [
        FieldKey::Symbol,
        FieldKey::Name,
        FieldKey::Sector,
        FieldKey::Price,
        FieldKey::ChangePct,
        FieldKey::Mcap,
        FieldKey::Volume,
        FieldKey::Pe,
        FieldKey::Pb,
        FieldKey::Roe,
        FieldKey::Roce,
        FieldKey::DividendYield,
        FieldKey::DebtToEquity,
        FieldKey::Eps,
        FieldKey::ProfitGrowth,
        FieldKey::SalesGrowth,
    ];

    /// Position in canonical catalog order.
    pub fn ordinal(self) -> usize {
        FieldKey::ALL.iter().position(|k| *k == self).unwrap_or(usize::MAX)
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", CATALOG.descriptor(*self).display)
    }
}

/// Value kind of a field, determining comparison and unit semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    /// Plain count (e.g. volume). Magnitude suffixes apply.
    Numeric,
    /// Stored as a fraction (0.20 == 20%). `%` and bare numbers apply.
    Percentage,
    /// Rupee amount in base units. Magnitude suffixes apply.
    Currency,
    /// Dimensionless ratio (PE, PB). No unit suffixes.
    Ratio,
    /// Sector membership; compared via sector clauses, not numerically.
    EnumSector,
    /// Identity text (symbol, name); not comparable.
    Text,
}

impl FieldKind {
    /// Whether the kind supports numeric comparison operators.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            FieldKind::Numeric | FieldKind::Percentage | FieldKind::Currency | FieldKind::Ratio
        )
    }
}

// ============================================================================
// Comparison Operators
// ============================================================================

/// Comparison operators supported by the grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Op {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
}

impl Op {
    /// Evaluate the operator over canonicalized values.
    ///
    /// Exact, epsilon-free comparison: inputs are pre-rounded by the data
    /// provider and unit-coerced at parse time, so no rounding tolerance
    /// is introduced here.
    pub fn holds(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Op::Lt => lhs < rhs,
            Op::Le => lhs <= rhs,
            Op::Gt => lhs > rhs,
            Op::Ge => lhs >= rhs,
            Op::Eq => lhs == rhs,
        }
    }

    /// Rendering rank for deterministic clause ordering.
    pub fn rank(self) -> u8 {
        match self {
            Op::Gt => 0,
            Op::Ge => 1,
            Op::Lt => 2,
            Op::Le => 3,
            Op::Eq => 4,
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Op::Lt => "<",
            Op::Le => "<=",
            Op::Gt => ">",
            Op::Ge => ">=",
            Op::Eq => "=",
        };
        write!(f, "{}", s)
    }
}

// ============================================================================
// Sectors
// ============================================================================

/// Closed set of sectors in the universe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Sector {
    #[serde(rename = "IT")]
    It,
    Banking,
    Pharma,
    Energy,
    #[serde(rename = "FMCG")]
    Fmcg,
    Auto,
    Metal,
    Realty,
    Infra,
    Telecom,
}

impl Sector {
    pub const ALL: [Sector; 10] = [
        Sector::It,
        Sector::Banking,
        Sector::Pharma,
        Sector::Energy,
        Sector::Fmcg,
        Sector::Auto,
        Sector::Metal,
        Sector::Realty,
        Sector::Infra,
        Sector::Telecom,
    ];

    /// Canonical display name.
    pub fn name(self) -> &'static str {
        match self {
            Sector::It => "IT",
            Sector::Banking => "Banking",
            Sector::Pharma => "Pharma",
            Sector::Energy => "Energy",
            Sector::Fmcg => "FMCG",
            Sector::Auto => "Auto",
            Sector::Metal => "Metal",
            Sector::Realty => "Realty",
            Sector::Infra => "Infra",
            Sector::Telecom => "Telecom",
        }
    }

    /// Lowercased aliases accepted in query text.
    fn aliases(self) -> &'static [&'static str] {
        match self {
            Sector::It => &["it", "tech", "technology", "software", "infotech"],
            Sector::Banking => &["banking", "bank", "banks", "financials", "finance", "nbfc"],
            Sector::Pharma => &["pharma", "pharmaceutical", "pharmaceuticals", "healthcare"],
            Sector::Energy => &["energy", "oil", "gas", "power", "utilities"],
            Sector::Fmcg => &["fmcg", "consumer", "staples"],
            Sector::Auto => &["auto", "automobile", "automobiles", "automotive"],
            Sector::Metal => &["metal", "metals", "steel", "mining"],
            Sector::Realty => &["realty", "real estate", "realestate", "property"],
            Sector::Infra => &["infra", "infrastructure", "construction", "cement"],
            Sector::Telecom => &["telecom", "telecommunications", "telco"],
        }
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// Units
// ============================================================================

/// Unit suffixes accepted on numeric literals.
///
/// Mixes Indian (`L` lakh, `Cr` crore) and Western (`K`, `M`, `B`)
/// conventions, since both appear in user queries over Indian equities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unit {
    Thousand,
    Lakh,
    Million,
    Crore,
    Billion,
    Percent,
}

impl Unit {
    /// Resolve a lowercased suffix or unit word.
    pub fn from_suffix(s: &str) -> Option<Unit> {
        match s {
            "k" => Some(Unit::Thousand),
            "l" | "lakh" | "lakhs" | "lac" | "lacs" => Some(Unit::Lakh),
            "m" | "mn" | "million" | "millions" => Some(Unit::Million),
            "cr" | "crore" | "crores" => Some(Unit::Crore),
            "b" | "bn" | "billion" | "billions" => Some(Unit::Billion),
            "%" | "percent" | "pct" => Some(Unit::Percent),
            _ => None,
        }
    }

    /// Multiplier into base units. Not meaningful for `Percent`.
    pub fn multiplier(self) -> f64 {
        match self {
            Unit::Thousand => 1e3,
            Unit::Lakh => 1e5,
            Unit::Million => 1e6,
            Unit::Crore => 1e7,
            Unit::Billion => 1e9,
            Unit::Percent => 1.0,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Unit::Thousand => "K",
            Unit::Lakh => "L",
            Unit::Million => "M",
            Unit::Crore => "Cr",
            Unit::Billion => "B",
            Unit::Percent => "%",
        };
        write!(f, "{}", s)
    }
}

// ============================================================================
// Qualitative Thresholds
// ============================================================================

/// Direction band for qualitative words ("low PE", "good ROE").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualBand {
    Low,
    High,
}

impl QualBand {
    /// Map a qualifier word to a band. Unlisted words are not qualifiers.
    pub fn from_word(word: &str) -> Option<QualBand> {
        match word {
            "low" | "cheap" | "small" | "undervalued" | "weak" => Some(QualBand::Low),
            "high" | "good" | "strong" | "healthy" | "large" => Some(QualBand::High),
            _ => None,
        }
    }
}

// ============================================================================
// Field Descriptor and Catalog
// ============================================================================

/// Immutable descriptor for one queryable field.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub key: FieldKey,
    /// Display name used in interpretations and column headers.
    pub display: &'static str,
    /// Lowercased aliases accepted in query text.
    pub aliases: &'static [&'static str],
    pub kind: FieldKind,
}

impl FieldDescriptor {
    /// Operators this field can appear with in a comparison clause.
    pub fn comparable_ops(&self) -> &'static [Op] {
        if self.kind.is_numeric() {
            &[Op::Lt, Op::Le, Op::Gt, Op::Ge, Op::Eq]
        } else if self.kind == FieldKind::EnumSector {
            &[Op::Eq]
        } else {
            &[]
        }
    }
}

/// Static registry of queryable fields and sectors.
///
/// Built once at startup; alias uniqueness is asserted during
/// construction since a duplicate alias is a configuration error.
pub struct FieldCatalog {
    descriptors: Vec<FieldDescriptor>,
    field_index: HashMap<&'static str, FieldKey>,
    sector_index: HashMap<&'static str, Sector>,
}

impl FieldCatalog {
    fn new() -> Self {
        let descriptors = vec![
            FieldDescriptor {
                key: FieldKey::Symbol,
                display: "Symbol",
                aliases: &["symbol", "ticker", "scrip"],
                kind: FieldKind::Text,
            },
            FieldDescriptor {
                key: FieldKey::Name,
                display: "Name",
                aliases: &["name", "company name"],
                kind: FieldKind::Text,
            },
            FieldDescriptor {
                key: FieldKey::Sector,
                display: "Sector",
                aliases: &["industry"],
                kind: FieldKind::EnumSector,
            },
            FieldDescriptor {
                key: FieldKey::Price,
                display: "Price",
                aliases: &["price", "ltp", "cmp", "last price"],
                kind: FieldKind::Currency,
            },
            FieldDescriptor {
                key: FieldKey::ChangePct,
                display: "Change",
                aliases: &["change", "changepct", "change percent", "change pct", "day change"],
                kind: FieldKind::Percentage,
            },
            FieldDescriptor {
                key: FieldKey::Mcap,
                display: "Mcap",
                aliases: &[
                    "mcap",
                    "marketcap",
                    "market cap",
                    "market capitalisation",
                    "market capitalization",
                ],
                kind: FieldKind::Currency,
            },
            FieldDescriptor {
                key: FieldKey::Volume,
                display: "Volume",
                aliases: &["volume", "vol", "traded volume"],
                kind: FieldKind::Numeric,
            },
            FieldDescriptor {
                key: FieldKey::Pe,
                display: "PE",
                aliases: &["pe", "p/e", "pe ratio", "price to earnings"],
                kind: FieldKind::Ratio,
            },
            FieldDescriptor {
                key: FieldKey::Pb,
                display: "PB",
                aliases: &["pb", "p/b", "pb ratio", "price to book"],
                kind: FieldKind::Ratio,
            },
            FieldDescriptor {
                key: FieldKey::Roe,
                display: "ROE",
                aliases: &["roe", "return on equity"],
                kind: FieldKind::Percentage,
            },
            FieldDescriptor {
                key: FieldKey::Roce,
                display: "ROCE",
                aliases: &["roce", "return on capital employed"],
                kind: FieldKind::Percentage,
            },
            FieldDescriptor {
                key: FieldKey::DividendYield,
                display: "Dividend Yield",
                aliases: &["dividend yield", "dividendyield", "div yield", "yield", "dividend"],
                kind: FieldKind::Percentage,
            },
            FieldDescriptor {
                key: FieldKey::DebtToEquity,
                display: "Debt to Equity",
                aliases: &["debt to equity", "debttoequity", "de ratio", "d/e", "debt equity", "leverage"],
                kind: FieldKind::Ratio,
            },
            FieldDescriptor {
                key: FieldKey::Eps,
                display: "EPS",
                aliases: &["eps", "earnings per share"],
                kind: FieldKind::Currency,
            },
            FieldDescriptor {
                key: FieldKey::ProfitGrowth,
                display: "Profit Growth",
                aliases: &["profit growth", "profitgrowth", "earnings growth", "pat growth"],
                kind: FieldKind::Percentage,
            },
            FieldDescriptor {
                key: FieldKey::SalesGrowth,
                display: "Sales Growth",
                aliases: &["sales growth", "salesgrowth", "revenue growth", "topline growth"],
                kind: FieldKind::Percentage,
            },
        ];

        let mut field_index = HashMap::new();
        for desc in &descriptors {
            for alias in desc.aliases {
                let prev = field_index.insert(*alias, desc.key);
                assert!(
                    prev.is_none(),
                    "duplicate field alias in catalog: {}",
                    alias
                );
            }
        }

        let mut sector_index = HashMap::new();
        for sector in Sector::ALL {
            for alias in sector.aliases() {
                let prev = sector_index.insert(*alias, sector);
                assert!(
                    prev.is_none(),
                    "duplicate sector alias in catalog: {}",
                    alias
                );
            }
        }

        Self {
            descriptors,
            field_index,
            sector_index,
        }
    }

    /// Descriptor for a field key.
    pub fn descriptor(&self, key: FieldKey) -> &FieldDescriptor {
        self.descriptors
            .iter()
            .find(|d| d.key == key)
            .expect("every FieldKey has a descriptor")
    }

    /// Case-insensitive, alias-aware field lookup.
    pub fn resolve(&self, token: &str) -> Option<FieldKey> {
        self.field_index.get(normalize(token).as_str()).copied()
    }

    /// Case-insensitive, alias-aware sector lookup.
    pub fn resolve_sector(&self, token: &str) -> Option<Sector> {
        self.sector_index.get(normalize(token).as_str()).copied()
    }

    /// Convert a user-facing literal into the field's canonical unit.
    ///
    /// `$5B` on a currency field → 5_000_000_000; `20%` (or a bare `20`)
    /// on a percentage field → 0.20; ratios pass through unchanged.
    pub fn coerce(
        &self,
        field: FieldKey,
        value: f64,
        unit: Option<Unit>,
    ) -> Result<f64, ParseError> {
        let desc = self.descriptor(field);
        let mismatch = |unit: Unit| ParseError::UnitMismatch {
            field: desc.display.to_string(),
            unit: unit.to_string(),
        };

        match desc.kind {
            FieldKind::Percentage => match unit {
                None | Some(Unit::Percent) => Ok(value / 100.0),
                Some(u) => Err(mismatch(u)),
            },
            FieldKind::Currency | FieldKind::Numeric => match unit {
                None => Ok(value),
                Some(Unit::Percent) => Err(mismatch(Unit::Percent)),
                Some(u) => Ok(value * u.multiplier()),
            },
            FieldKind::Ratio => match unit {
                None => Ok(value),
                Some(u) => Err(mismatch(u)),
            },
            FieldKind::EnumSector | FieldKind::Text => {
                Err(ParseError::NotComparable(desc.display.to_string()))
            }
        }
    }

    /// Qualitative-to-threshold table (spec'd heuristic, not inferred).
    ///
    /// Resolves "low PE" / "good ROE" style clauses to a concrete
    /// comparison in canonical units. Fields without an entry make the
    /// qualitative clause unresolvable (it is then reported as ignored).
    pub fn qualitative(&self, field: FieldKey, band: QualBand) -> Option<(Op, f64)> {
        let (low, high): (f64, f64) = match field {
            FieldKey::Pe => (15.0, 40.0),
            FieldKey::Pb => (1.5, 8.0),
            FieldKey::Roe => (0.08, 0.15),
            FieldKey::Roce => (0.10, 0.15),
            FieldKey::DividendYield => (0.01, 0.03),
            FieldKey::DebtToEquity => (0.5, 2.0),
            // ₹5,000 Cr / ₹20,000 Cr
            FieldKey::Mcap => (5e10, 2e11),
            FieldKey::ProfitGrowth => (0.0, 0.15),
            FieldKey::SalesGrowth => (0.0, 0.10),
            _ => return None,
        };
        Some(match band {
            QualBand::Low => (Op::Lt, low),
            QualBand::High => (Op::Gt, high),
        })
    }

    /// Format a canonical value back into user-facing text.
    ///
    /// The output must re-tokenize to the same canonical value, which is
    /// what makes interpretations re-parseable.
    pub fn format_value(&self, field: FieldKey, value: f64) -> String {
        match self.descriptor(field).kind {
            FieldKind::Percentage => {
                let pct = value * 100.0;
                if (pct * 10.0).round() / 10.0 == pct {
                    format!("{:.1}%", pct)
                } else {
                    format!("{}%", pct)
                }
            }
            FieldKind::Currency | FieldKind::Numeric => {
                // Suffixed only when two decimals at that magnitude lose
                // nothing, so the text re-tokenizes to the same value.
                for (mult, suffix) in [(1e9, "B"), (1e7, "Cr"), (1e5, "L"), (1e3, "K")] {
                    if value.abs() >= mult {
                        let scaled = value / mult;
                        if (scaled * 100.0).round() / 100.0 == scaled {
                            return format!("{:.2}{}", scaled, suffix);
                        }
                    }
                }
                plain_number(value)
            }
            _ => plain_number(value),
        }
    }
}

/// Two decimals when that is exact, full precision otherwise.
fn plain_number(value: f64) -> String {
    if (value * 100.0).round() / 100.0 == value {
        format!("{:.2}", value)
    } else {
        format!("{}", value)
    }
}

/// Lowercase and collapse inner whitespace so that "Market  Cap"
/// matches the "market cap" alias.
fn normalize(token: &str) -> String {
    token
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_resolve_aliases() {
        assert_eq!(CATALOG.resolve("Mcap"), Some(FieldKey::Mcap));
        assert_eq!(CATALOG.resolve("market cap"), Some(FieldKey::Mcap));
        assert_eq!(CATALOG.resolve("MARKETCAP"), Some(FieldKey::Mcap));
        assert_eq!(CATALOG.resolve("debt to equity"), Some(FieldKey::DebtToEquity));
        assert_eq!(CATALOG.resolve("nonexistent"), None);
    }

    #[test]
    fn test_resolve_sector_aliases() {
        assert_eq!(CATALOG.resolve_sector("IT"), Some(Sector::It));
        assert_eq!(CATALOG.resolve_sector("technology"), Some(Sector::It));
        assert_eq!(CATALOG.resolve_sector("Pharmaceutical"), Some(Sector::Pharma));
        assert_eq!(CATALOG.resolve_sector("real estate"), Some(Sector::Realty));
        assert_eq!(CATALOG.resolve_sector("widgets"), None);
    }

    // Full suffix table over a currency field (spec'd conventions:
    // Indian L/Cr alongside Western K/M/B).
    #[test_case(5.0, Some(Unit::Billion), 5_000_000_000.0 ; "five billion")]
    #[test_case(10.0, Some(Unit::Crore), 100_000_000.0 ; "ten crore")]
    #[test_case(2.0, Some(Unit::Lakh), 200_000.0 ; "two lakh")]
    #[test_case(3.0, Some(Unit::Million), 3_000_000.0 ; "three million")]
    #[test_case(7.0, Some(Unit::Thousand), 7_000.0 ; "seven thousand")]
    #[test_case(1520.5, None, 1520.5 ; "bare rupees")]
    fn test_coerce_currency(value: f64, unit: Option<Unit>, expected: f64) {
        assert_eq!(CATALOG.coerce(FieldKey::Mcap, value, unit).unwrap(), expected);
    }

    #[test]
    fn test_coerce_percentage() {
        assert_eq!(CATALOG.coerce(FieldKey::Roe, 20.0, Some(Unit::Percent)).unwrap(), 0.20);
        // A bare number on a percentage field still means percent.
        assert_eq!(CATALOG.coerce(FieldKey::Roe, 20.0, None).unwrap(), 0.20);
    }

    #[test]
    fn test_coerce_unit_mismatch() {
        let err = CATALOG.coerce(FieldKey::Roe, 5.0, Some(Unit::Billion)).unwrap_err();
        assert!(matches!(err, ParseError::UnitMismatch { .. }));

        let err = CATALOG.coerce(FieldKey::Mcap, 5.0, Some(Unit::Percent)).unwrap_err();
        assert!(matches!(err, ParseError::UnitMismatch { .. }));

        let err = CATALOG.coerce(FieldKey::Pe, 15.0, Some(Unit::Crore)).unwrap_err();
        assert!(matches!(err, ParseError::UnitMismatch { .. }));
    }

    #[test]
    fn test_coerce_ratio_passthrough() {
        assert_eq!(CATALOG.coerce(FieldKey::Pe, 15.0, None).unwrap(), 15.0);
    }

    #[test]
    fn test_qualitative_table() {
        assert_eq!(CATALOG.qualitative(FieldKey::Pe, QualBand::Low), Some((Op::Lt, 15.0)));
        assert_eq!(CATALOG.qualitative(FieldKey::Roe, QualBand::High), Some((Op::Gt, 0.15)));
        assert_eq!(CATALOG.qualitative(FieldKey::Price, QualBand::Low), None);
    }

    #[test]
    fn test_format_value_round_trips_units() {
        assert_eq!(CATALOG.format_value(FieldKey::Mcap, 5_000_000_000.0), "5.00B");
        assert_eq!(CATALOG.format_value(FieldKey::Mcap, 100_000_000.0), "10.00Cr");
        assert_eq!(CATALOG.format_value(FieldKey::Roe, 0.20), "20.0%");
        assert_eq!(CATALOG.format_value(FieldKey::Pe, 15.0), "15.00");
    }

    // A suffix that would round the value away is not applied: the
    // rendered text must re-tokenize to the same canonical value.
    #[test]
    fn test_format_value_keeps_precision_over_suffix() {
        assert_eq!(CATALOG.format_value(FieldKey::Price, 1520.5), "1520.50");
        // Lossy at B, exact one magnitude down.
        assert_eq!(CATALOG.format_value(FieldKey::Mcap, 1.234e9), "123.40Cr");
    }

    #[test]
    fn test_comparable_ops() {
        assert!(!CATALOG.descriptor(FieldKey::Symbol).comparable_ops().contains(&Op::Lt));
        assert!(CATALOG.descriptor(FieldKey::Pe).comparable_ops().contains(&Op::Lt));
        assert_eq!(CATALOG.descriptor(FieldKey::Sector).comparable_ops(), &[Op::Eq]);
    }
}
