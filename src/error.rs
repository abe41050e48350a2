use thiserror::Error;

/// Fatal faults raised while parsing OBJ or MTL text.
///
/// Skippable conditions (unknown keywords, malformed lines) never surface
/// here; the parsers log them and continue. Lines are reported 1-based.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// A material property keyword appeared before any `newmtl`.
    #[error("line {line}: '{keyword}' appears before any newmtl")]
    MissingMaterialContext { line: usize, keyword: String },

    /// A face vertex referenced an index with no entry in its attribute pool.
    #[error("line {line}: {kind} index {index} is outside the {count} stored entries")]
    InvalidVertexReference {
        line: usize,
        kind: &'static str,
        index: i32,
        count: usize,
    },

    /// A numeric field failed to parse.
    #[error("line {line}: invalid {what} '{token}'")]
    InvalidNumber {
        line: usize,
        what: &'static str,
        token: String,
    },

    /// A required numeric field was missing.
    #[error("line {line}: missing {what}")]
    MissingValue { line: usize, what: &'static str },
}
