use editor_document::DocumentError;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = HighlightError> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Errors produced while building highlighting definitions or highlighting a document.
pub enum HighlightError {
    #[error("regex compile error for pattern '{pattern}': {message}")]
    /// A rule, keyword list or span delimiter failed to compile.
    InvalidRegex {
        /// The regex pattern string.
        pattern: String,
        /// The compiler error message.
        message: String,
    },

    #[error("unknown rule set '{0}'")]
    /// A span or import referenced a rule set that does not exist.
    UnknownRuleSet(String),

    #[error("unknown color '{0}'")]
    /// A named color reference could not be resolved.
    UnknownColor(String),

    #[error("unknown highlighting definition '{0}'")]
    /// A `Lang/...` reference named a definition missing from the registry.
    UnknownDefinition(String),

    #[error("duplicate rule set '{0}'")]
    /// Two rule sets share a name.
    DuplicateRuleSet(String),

    #[error("definition '{0}' has no main rule set")]
    /// No unnamed top-level rule set exists.
    MissingMainRuleSet(String),

    #[error("import cycle detected involving rule set '{0}'")]
    /// Rule set imports form a cycle.
    ImportCycle(String),

    #[error("invalid color value '{0}'")]
    /// A color value is not `#rrggbb` or `#rrggbbaa`.
    InvalidColorValue(String),

    #[error("highlighting rule '{pattern}' matched 0 characters, which would loop forever")]
    /// A plain rule matched empty text.
    ZeroLengthRule {
        /// The offending pattern.
        pattern: String,
    },

    #[error(
        "highlighting span matched 0 characters, which would loop forever (start '{start}', end '{end}')"
    )]
    /// A span opened and closed without consuming text.
    ZeroLengthSpan {
        /// Start pattern of the span.
        start: String,
        /// End pattern of the span.
        end: String,
    },

    #[error("the highlighter was called while a highlighting pass is running")]
    /// The highlighter was re-entered from one of its own callbacks.
    Reentrancy,

    #[error("the highlighter has been disposed")]
    /// The highlighter was used after [`dispose`](crate::DocumentHighlighter::dispose).
    Disposed,

    #[error("document {actual} is not the document this highlighter was created for ({expected})")]
    /// A different document was passed to the highlighter.
    DocumentMismatch {
        /// Id of the highlighted document.
        expected: u64,
        /// Id of the document passed in.
        actual: u64,
    },

    #[error(transparent)]
    /// A document query failed.
    Document(#[from] DocumentError),
}
