//! Query front end: tokenizer, plan model and best-effort parser.

pub mod lexer;
pub mod parser;
pub mod plan;

pub use lexer::{tokenize, Keyword, Token};
pub use parser::parse;
pub use plan::{
    LimitSpec, ParsedQuery, Predicate, QueryIntent, QueryPlan, SortDirection, SortSpec,
};
