use thiserror::Error;

/// Failure to turn bytes into a [`Document`](crate::Document).
///
/// Everything except [`ParseError::Empty`], [`ParseError::UnknownEncoding`]
/// and [`ParseError::Decode`] is a form of malformed markup; use
/// [`ParseError::is_malformed`] to test for that family as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The input is empty or contains only whitespace.
    #[error("document is empty")]
    Empty,
    /// The declared encoding label is not known.
    #[error("unknown encoding: {0}")]
    UnknownEncoding(String),
    /// The bytes are not valid in the encoding used to decode them.
    #[error("input is not valid {0}")]
    Decode(&'static str),
    /// The tokenizer rejected the input.
    #[error("syntax error at {position}: {message}")]
    Syntax { message: String, position: usize },
    /// A close tag does not match the open element.
    #[error("expected </{expected}>, found </{found}> at {position}")]
    InvalidCloseTag {
        expected: String,
        found: String,
        position: usize,
    },
    /// The input ended while this element was still open.
    #[error("unclosed tag: {0}")]
    UnclosedTag(String),
    /// An entity reference without the closing `;`.
    #[error("unclosed entity: &{0}")]
    UnclosedEntity(String),
    /// An entity that is not one of the predefined XML entities.
    #[error("invalid entity: &{0};")]
    InvalidEntity(String),
    /// A numeric character reference that names no valid character.
    #[error("invalid character reference: &{0};")]
    InvalidCharacterReference(String),
    /// The same attribute appears twice on an element.
    #[error("duplicate attribute: {0}")]
    DuplicateAttribute(String),
    /// The document has no element at all.
    #[error("no element at top level")]
    NoElementAtTopLevel,
    /// A second element appears after the document element.
    #[error("multiple elements at top level: {0}")]
    MultipleElementsAtTopLevel(String),
    /// Non-whitespace text outside the document element.
    #[error("text at top level")]
    TextAtTopLevel,
}

impl ParseError {
    /// True if this error describes markup that is not well-formed.
    pub fn is_malformed(&self) -> bool {
        !matches!(
            self,
            ParseError::Empty | ParseError::UnknownEncoding(_) | ParseError::Decode(_)
        )
    }
}

/// Failure to compile or evaluate an XPath expression.
///
/// A valid query that matches nothing is not an error; it yields an empty
/// sequence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum XPathError {
    /// The expression is not valid XPath; `position` is a byte offset.
    #[error("XPath syntax error at {position}: {message}")]
    Syntax { message: String, position: usize },
    /// A prefix in the expression has no namespace binding.
    #[error("unknown namespace prefix: {0}")]
    UnknownPrefix(String),
    /// A function call names a function that is not supported.
    #[error("unknown function: {0}()")]
    UnknownFunction(String),
    /// A function was called with the wrong number of arguments.
    #[error("{function}() takes {expected} argument(s)")]
    WrongArgumentCount {
        function: &'static str,
        expected: &'static str,
    },
    /// A node query whose last step selects attributes.
    #[error("expression does not select nodes")]
    NotANodePath,
}

/// Any failure of the crate, including loading input from a URL.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    XPath(#[from] XPathError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("unsupported url scheme: {0}")]
    UnsupportedScheme(String),
}

impl Error {
    /// The parse error, if this is one.
    pub fn parse_error(&self) -> Option<&ParseError> {
        match self {
            Error::Parse(e) => Some(e),
            _ => None,
        }
    }
}
