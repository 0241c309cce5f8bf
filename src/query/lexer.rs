//! Tokenizer for screener query text.
//!
//! Lexing never fails: unrecognized words come out as `Ident` tokens and
//! are dealt with (or reported as ignored) by the parser, so prose filler
//! like "please show me" cannot break a query. Unrecognized punctuation
//! is dropped. Commas act as whitespace between clauses; inside a number
//! they are thousands separators.

use crate::catalog::{Op, Unit};

/// Lexical token kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A word that is not a keyword; may name a field, a sector, a
    /// qualitative qualifier, or nothing at all.
    Ident(String),
    /// Number literal with an optional attached unit suffix (`5B`, `20%`).
    Number { value: f64, unit: Option<Unit> },
    /// Comparison operator, symbolic (`<=`) or worded ("above", "under").
    CompareOp(Op),
    Keyword(Keyword),
    /// Quoted phrase, used for multi-word field or sector names.
    Phrase(String),
    /// Refinement prefix `+N`.
    RefinePrefix(u32),
}

/// Connective and directive keywords, matched case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    And,
    Or,
    In,
    Exclude,
    Not,
    Between,
    Top,
    Bottom,
    Ascending,
    Descending,
    Sector,
    Help,
    Clear,
}

fn keyword(word: &str) -> Option<Keyword> {
    match word {
        "and" => Some(Keyword::And),
        "or" => Some(Keyword::Or),
        "in" => Some(Keyword::In),
        "exclude" | "excluding" | "without" | "except" => Some(Keyword::Exclude),
        "not" => Some(Keyword::Not),
        "between" => Some(Keyword::Between),
        "top" => Some(Keyword::Top),
        "bottom" => Some(Keyword::Bottom),
        "ascending" | "asc" => Some(Keyword::Ascending),
        "descending" | "desc" => Some(Keyword::Descending),
        "sector" | "sectors" => Some(Keyword::Sector),
        "help" => Some(Keyword::Help),
        "clear" | "reset" => Some(Keyword::Clear),
        _ => None,
    }
}

/// Worded comparison operators ("Mcap above 5B", "PE under 15").
fn word_op(word: &str) -> Option<Op> {
    match word {
        "above" | "over" | "greater" | "more" => Some(Op::Gt),
        "below" | "under" | "less" => Some(Op::Lt),
        _ => None,
    }
}

/// Tokenize query text. Infallible by design.
pub fn tokenize(text: &str) -> Vec<Token> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        // Whitespace and clause commas
        if c.is_whitespace() || c == ',' {
            i += 1;
            continue;
        }

        // Currency signs are a display convention, not information:
        // the field's kind decides the unit.
        if c == '$' || c == '₹' {
            i += 1;
            continue;
        }

        // Quoted phrase. An apostrophe inside a word ("aren't") is a
        // contraction, not a quote; only a boundary position opens one.
        if (c == '"' || c == '\'') && (i == 0 || !chars[i - 1].is_ascii_alphanumeric()) {
            let quote = c;
            i += 1;
            let start = i;
            while i < chars.len() && chars[i] != quote {
                i += 1;
            }
            let phrase: String = chars[start..i].iter().collect();
            if !phrase.is_empty() {
                tokens.push(Token::Phrase(phrase));
            }
            if i < chars.len() {
                i += 1; // closing quote
            }
            continue;
        }

        // Refinement prefix +N
        if c == '+' && i + 1 < chars.len() && chars[i + 1].is_ascii_digit() {
            i += 1;
            let start = i;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            let digits: String = chars[start..i].iter().collect();
            if let Ok(n) = digits.parse::<u32>() {
                tokens.push(Token::RefinePrefix(n));
            }
            continue;
        }

        // Numbers: digits with comma separators, optional decimal part,
        // optional attached suffix (5B, 10Cr, 20%). A leading minus is
        // part of the number only when a digit follows.
        let starts_number = c.is_ascii_digit()
            || (c == '.' && i + 1 < chars.len() && chars[i + 1].is_ascii_digit())
            || (c == '-' && i + 1 < chars.len() && chars[i + 1].is_ascii_digit());
        if starts_number {
            let start = i;
            if c == '-' {
                i += 1;
            }
            while i < chars.len()
                && (chars[i].is_ascii_digit()
                    || chars[i] == '.'
                    || (chars[i] == ',' && i + 1 < chars.len() && chars[i + 1].is_ascii_digit()))
            {
                i += 1;
            }
            let raw: String = chars[start..i].iter().collect();
            let cleaned: String = raw.chars().filter(|ch| *ch != ',').collect();

            match cleaned.parse::<f64>() {
                Ok(value) => {
                    // Attached percent sign
                    if i < chars.len() && chars[i] == '%' {
                        i += 1;
                        tokens.push(Token::Number {
                            value,
                            unit: Some(Unit::Percent),
                        });
                        continue;
                    }
                    // Attached alpha suffix; backtrack if it is not a unit
                    let alpha_start = i;
                    while i < chars.len() && chars[i].is_ascii_alphabetic() {
                        i += 1;
                    }
                    let suffix: String = chars[alpha_start..i].iter().collect();
                    if suffix.is_empty() {
                        tokens.push(Token::Number { value, unit: None });
                    } else if let Some(unit) = Unit::from_suffix(&suffix.to_lowercase()) {
                        tokens.push(Token::Number {
                            value,
                            unit: Some(unit),
                        });
                    } else {
                        tokens.push(Token::Number { value, unit: None });
                        i = alpha_start;
                    }
                }
                // "1.2.3" and friends become idents for the parser to report
                Err(_) => tokens.push(Token::Ident(raw)),
            }
            continue;
        }

        // Symbolic comparison operators
        if c == '<' || c == '>' || c == '=' {
            let eq_follows = i + 1 < chars.len() && chars[i + 1] == '=';
            let op = match (c, eq_follows) {
                ('<', true) => Op::Le,
                ('<', false) => Op::Lt,
                ('>', true) => Op::Ge,
                ('>', false) => Op::Gt,
                // "=" and "==" both mean equality
                (_, _) => Op::Eq,
            };
            i += if eq_follows { 2 } else { 1 };
            tokens.push(Token::CompareOp(op));
            continue;
        }

        // Words: letters plus a few symbol-name characters (M&M, p/e)
        if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len()
                && (chars[i].is_ascii_alphanumeric()
                    || chars[i] == '_'
                    || chars[i] == '&'
                    || chars[i] == '/')
            {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            let lower = word.to_lowercase();
            if let Some(kw) = keyword(&lower) {
                tokens.push(Token::Keyword(kw));
            } else if let Some(op) = word_op(&lower) {
                tokens.push(Token::CompareOp(op));
            } else {
                tokens.push(Token::Ident(word));
            }
            continue;
        }

        // Anything else (stray punctuation) is dropped silently.
        i += 1;
    }

    tokens
}
