// Shared contract model passed between tokenizer, merger, and codegen.
// No parser internals here.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One locale variant of one logical string resource, as loaded.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawResource {
    /// Resource key: the stable identifier shared by every locale variant.
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Raw ICU message pattern text.
    pub text: String,
    pub locale: String,
}

/// Semantic kind of one argument value. Codegen maps each kind to a concrete
/// host type; the engine never needs more than the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Generic,
    DateTime,
    Numeric,
    Integer,
    Text,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValueType::Generic => "generic",
            ValueType::DateTime => "datetime",
            ValueType::Numeric => "numeric",
            ValueType::Integer => "integer",
            ValueType::Text => "text",
        };
        f.write_str(s)
    }
}

/// One distinct argument placeholder found in a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Argument addressed by identifier, e.g. `{name}`.
    Named { name: String, ty: ValueType },
    /// Argument addressed by position, e.g. `{0}`.
    Numbered { number: u32, ty: ValueType },
}

impl Token {
    /// Identity key: the name, or the decimal string of the number.
    /// Unique within one `TokenizedResource` after dedup.
    pub fn key(&self) -> String {
        match self {
            Token::Named { name, .. } => name.clone(),
            Token::Numbered { number, .. } => number.to_string(),
        }
    }

    pub fn ty(&self) -> ValueType {
        match self {
            Token::Named { ty, .. } | Token::Numbered { ty, .. } => *ty,
        }
    }
}

/// Tokenizer output for one (resource key, locale) pair. Tokens are in
/// encounter order, first occurrence wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedResource {
    pub name: String,
    pub description: Option<String>,
    pub tokens: Vec<Token>,
}

/// Generated-accessor visibility. Totally ordered so merging can take the
/// most permissive declaration.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Private,
    #[default]
    Public,
}

/// The merger's normalized view of one token: a display name usable as a
/// generated parameter, plus the addressing key used at the formatting
/// boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Argument {
    pub name: String,
    pub key: String,
    #[serde(rename = "type")]
    pub ty: ValueType,
}

/// The per-resource-key contract handed to codegen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergedResource {
    pub name: String,
    pub description: Option<String>,
    pub visibility: Visibility,
    /// First-seen order across variants, deterministic for a fixed variant order.
    pub arguments: Vec<Argument>,
    /// True iff every argument is positional and the numbers are exactly
    /// 0..n with no gaps. Governs positional-array vs keyed-map addressing.
    pub has_contiguous_numbered_tokens: bool,
}
