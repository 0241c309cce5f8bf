//! Natscreen: a natural-language-flavored stock screener query engine.
//!
//! Parses loosely structured text ("stocks with PE < 15 and ROE > 20%",
//! "energy sector Mcap > $5B") into a structured filter/sort plan,
//! executes it against an in-memory universe of securities, and supports
//! stateful refinement of the previous result set ("+1 exclude pharma",
//! "+2 top 5").
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Screener façade                          │
//! │                 query(text) / clear_context()                   │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌──────────┐   ┌──────────┐   ┌────────────┐   ┌───────────┐  │
//! │  │  Lexer   │──▶│  Parser  │──▶│ Refinement │──▶│ Execution │  │
//! │  │ tokenize │   │   plan   │   │  Resolver  │   │  Engine   │  │
//! │  └──────────┘   └────┬─────┘   └─────┬──────┘   └─────┬─────┘  │
//! │                      │               │                │        │
//! │                ┌─────▼─────┐   ┌─────▼──────┐   ┌─────▼─────┐  │
//! │                │   Field   │   │  Session   │   │ Interpret │  │
//! │                │  Catalog  │   │  Context   │   │ + Suggest │  │
//! │                └───────────┘   └────────────┘   └───────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Design invariants
//!
//! - Parsing is best-effort: prose filler degrades to ignored terms,
//!   never to a failed query.
//! - Comparison values are coerced to canonical units at parse time;
//!   execution compares exactly (inputs are provider-pre-rounded).
//! - One `Screener` owns one `SessionContext`: one context, one thread.
//!   Hosts with concurrent sessions create one façade per session.
//!
//! # Usage
//!
//! ```
//! use natscreen::{Screener, universe::sample_universe};
//!
//! let mut screener = Screener::new(sample_universe);
//! let response = screener.query("IT sector PE < 30 top 2");
//! assert_eq!(response.data.len(), 2);
//!
//! // Refine the previous result set.
//! let refined = screener.query("+1 exclude it");
//! assert_eq!(refined.total, 0);
//! screener.clear_context();
//! ```

#![warn(clippy::all)]

pub mod catalog;
pub mod engine;
pub mod error;
pub mod explain;
pub mod query;
pub mod refine;
pub mod screener;
pub mod universe;

pub use catalog::{FieldCatalog, FieldKey, FieldKind, Op, Sector, Unit, CATALOG};
pub use error::{EngineError, ParseError};
pub use query::{ParsedQuery, Predicate, QueryIntent, QueryPlan, SortDirection, SortSpec};
pub use refine::SessionContext;
pub use screener::{ResponseType, Screener, ScreenerResponse};
pub use universe::Security;
