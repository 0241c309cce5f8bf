//! Error types for the screener engine.

use thiserror::Error;

/// Errors raised while turning query text into a plan.
///
/// These are user-input errors. The parser recovers from them clause by
/// clause (skip-and-continue), so they normally surface as "ignored"
/// suggestions rather than failed queries. Only a query where *nothing*
/// parsed produces an error-typed response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A unit suffix that does not apply to the field's kind,
    /// e.g. `%` on a currency field or `Cr` on a percentage field.
    #[error("unit {unit} does not apply to {field}")]
    UnitMismatch { field: String, unit: String },

    /// The field exists but has no numeric comparison semantics.
    #[error("field {0} cannot be compared numerically")]
    NotComparable(String),
}

/// Errors raised while resolving a plan against session context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A refinement (`+N …`) arrived with no previous screen in context.
    /// Surfaced as a user-visible message; existing context is untouched.
    #[error("no previous screen to refine; run a screen first")]
    NoContextToRefine,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ParseError::UnitMismatch {
            field: "ROE".to_string(),
            unit: "Cr".to_string(),
        };
        assert_eq!(err.to_string(), "unit Cr does not apply to ROE");

        let err = EngineError::NoContextToRefine;
        assert!(err.to_string().contains("no previous screen"));
    }
}
