//! Template variable descriptors.
//!
//! A variable describes which characters a template slot accepts and how the
//! captured value is post-processed.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

/// Characters left untouched when encoding a variable value.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

// Character classes, as regex fragments.
const ALPHA: &str = "a-zA-Z";
const DIGIT: &str = "0-9";
const UNRESERVED_CLASS: &str = r"a-zA-Z0-9\-._~";
const SUB_DELIMS: &str = r"!$&'()*+,;=";
const GEN_DELIMS: &str = r":/?#\[\]@";
const PCT_ENCODED: &str = "%[0-9A-Fa-f]{2}";
const QUERY_PARAM_DELIMS: &str = r"!$'()*+,;";
const TOKEN_SEPARATORS: &str = r#"()<>@,;:\\"/\[\]?={} \t"#;

/// The set of characters a variable accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VariableType {
    /// Any character.
    All,
    Alpha,
    Digit,
    AlphaDigit,
    /// Regex word characters.
    Word,
    /// Reserved and unreserved URI characters, percent-encoded octets.
    UriAll,
    UriUnreserved,
    /// One path segment: never crosses a `/`.
    #[default]
    UriSegment,
    /// Segments and the slashes between them.
    UriPath,
    UriQuery,
    UriQueryParam,
    UriFragment,
    /// An HTTP token (no separators).
    Token,
    /// Anything but `;`, `(` and `)`.
    CommentAttribute,
}

impl VariableType {
    /// Regex fragment matching a single unit of this type.
    fn unit(self) -> String {
        let pchar = format!("[{UNRESERVED_CLASS}{SUB_DELIMS}:@]|{PCT_ENCODED}");
        match self {
            VariableType::All => ".".to_string(),
            VariableType::Alpha => format!("[{ALPHA}]"),
            VariableType::Digit => format!("[{DIGIT}]"),
            VariableType::AlphaDigit => format!("[{ALPHA}{DIGIT}]"),
            VariableType::Word => r"\w".to_string(),
            VariableType::UriAll => {
                format!("[{GEN_DELIMS}{SUB_DELIMS}{UNRESERVED_CLASS}]|{PCT_ENCODED}")
            }
            VariableType::UriUnreserved => format!("[{UNRESERVED_CLASS}]"),
            VariableType::UriSegment => pchar,
            VariableType::UriPath => format!("{pchar}|/"),
            VariableType::UriQuery | VariableType::UriFragment => format!("{pchar}|/|\\?"),
            VariableType::UriQueryParam => {
                format!("[{UNRESERVED_CLASS}{QUERY_PARAM_DELIMS}:@]|{PCT_ENCODED}|/|\\?")
            }
            VariableType::Token => format!("[^{TOKEN_SEPARATORS}]"),
            VariableType::CommentAttribute => r"[^;()]".to_string(),
        }
    }
}

/// Describes one template variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub kind: VariableType,
    /// Value used when formatting without a resolved value, and the only
    /// accepted value of a fixed variable.
    pub default_value: String,
    /// Whether at least one character must match.
    pub required: bool,
    /// Whether only `default_value` matches.
    pub fixed: bool,
    /// Percent-decode captured values.
    pub decoding_on_parse: bool,
    /// Percent-encode values when formatting.
    pub encoding_on_format: bool,
}

impl Default for Variable {
    fn default() -> Self {
        Self::new(VariableType::UriSegment)
    }
}

impl Variable {
    /// A required variable of the given type with no default value.
    pub fn new(kind: VariableType) -> Self {
        Self {
            kind,
            default_value: String::new(),
            required: true,
            fixed: false,
            decoding_on_parse: false,
            encoding_on_format: false,
        }
    }

    /// A variable that only matches `value`.
    pub fn fixed(value: impl Into<String>) -> Self {
        Self {
            default_value: value.into(),
            fixed: true,
            ..Self::default()
        }
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = value.into();
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn decoding(mut self) -> Self {
        self.decoding_on_parse = true;
        self
    }

    pub fn encoding(mut self) -> Self {
        self.encoding_on_format = true;
        self
    }

    /// Capturing regex group for this variable.
    pub(crate) fn regex(&self) -> String {
        if self.fixed {
            return format!("({})", regex::escape(&self.default_value));
        }
        let quantifier = if self.required { '+' } else { '*' };
        format!("((?:{}){})", self.kind.unit(), quantifier)
    }

    /// Post-process a captured value.
    pub(crate) fn decode(&self, value: &str) -> String {
        if self.decoding_on_parse {
            percent_decode_str(value).decode_utf8_lossy().into_owned()
        } else {
            value.to_string()
        }
    }

    /// Pre-process a value before formatting.
    pub(crate) fn encode(&self, value: &str) -> String {
        if self.encoding_on_format {
            utf8_percent_encode(value, UNRESERVED).to_string()
        } else {
            value.to_string()
        }
    }
}
