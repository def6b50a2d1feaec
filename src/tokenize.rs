//! Pattern tokenizer: one locale variant's message pattern → ordered,
//! deduplicated, typed argument tokens.
//!
//! Parse failure is not an error here: a pattern that does not parse is a
//! plain string as far as the contract is concerned, so it degrades to a
//! zero-argument resource. The only fatal case is a parser output that
//! violates the part grammar (an `ArgStart` without an identifier part),
//! which cannot happen with the in-crate parser and would mean version skew
//! with the parsing dependency.

use indexmap::IndexMap;
use thiserror::Error;

use crate::model::{RawResource, Token, TokenizedResource, ValueType};
use crate::pattern::{ArgType, MessagePattern, Part};

/// Internal grammar violations. Unreachable with a conformant parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenizeError {
    #[error("resource `{resource}`: argument at part {index} has no identifier part")]
    MissingIdentifier { resource: String, index: usize },
    #[error("resource `{resource}`: simple argument at part {index} has no keyword part")]
    MissingKeyword { resource: String, index: usize },
}

pub fn tokenize(raw: &RawResource) -> Result<TokenizedResource, TokenizeError> {
    let pattern = match MessagePattern::parse(&raw.text) {
        Ok(pattern) => pattern,
        // degraded parse: malformed or plain text → zero-argument accessor
        Err(_) => return Ok(without_tokens(raw)),
    };

    if !pattern.has_named_arguments() && !pattern.has_numbered_arguments() {
        return Ok(without_tokens(raw));
    }

    let parts = pattern.parts();
    // first-wins dedup by token key, drained in insertion order
    let mut deduplicated: IndexMap<String, Token> = IndexMap::new();

    for (index, part) in parts.iter().enumerate() {
        let Part::ArgStart(arg_type) = part else { continue };

        let ty = match arg_type {
            ArgType::None => ValueType::Generic,
            ArgType::Simple => match parts.get(index + 2) {
                Some(Part::ArgKeyword(keyword)) => match keyword.to_lowercase().as_str() {
                    "date" | "time" => ValueType::DateTime,
                    "number" => ValueType::Numeric,
                    _ => ValueType::Generic,
                },
                _ => {
                    return Err(TokenizeError::MissingKeyword {
                        resource: raw.name.clone(),
                        index,
                    });
                }
            },
            ArgType::Choice | ArgType::Plural | ArgType::SelectOrdinal => ValueType::Integer,
            ArgType::Select => ValueType::Text,
        };

        let token = match parts.get(index + 1) {
            Some(Part::ArgName(name)) => Token::Named { name: name.clone(), ty },
            Some(Part::ArgNumber(number)) => Token::Numbered { number: *number, ty },
            _ => {
                return Err(TokenizeError::MissingIdentifier {
                    resource: raw.name.clone(),
                    index,
                });
            }
        };

        // later references to the same key are ignored, type and all
        deduplicated.entry(token.key()).or_insert(token);
    }

    Ok(TokenizedResource {
        name: raw.name.clone(),
        description: raw.description.clone(),
        tokens: deduplicated.into_values().collect(),
    })
}

fn without_tokens(raw: &RawResource) -> TokenizedResource {
    TokenizedResource {
        name: raw.name.clone(),
        description: raw.description.clone(),
        tokens: Vec::new(),
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
