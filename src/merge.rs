//! Resource merger: reduce every locale variant of one resource key to a
//! single conflict-resolved contract.
//!
//! Variant order is the caller's declared locale-priority order and is the
//! only ordering that matters: argument order is first-seen across variants
//! in that order, so output is deterministic for a fixed input order.

use std::fmt;

use indexmap::IndexMap;
use rayon::prelude::*;

use crate::model::{
    Argument, MergedResource, Token, TokenizedResource, ValueType, Visibility,
};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// One locale's tokenized contribution to a resource key, with the
/// visibility that locale declared for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedVariant {
    pub locale: String,
    pub visibility: Visibility,
    pub resource: TokenizedResource,
}

/// Two locales disagree on the value type of one argument key. Never
/// resolved by picking a side; always surfaced to the author.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "resource `{resource}`: argument `{key}` is {first_type} in locale `{first_locale}` \
     but {second_type} in locale `{second_locale}`"
)]
pub struct TypeConflict {
    pub resource: String,
    pub key: String,
    pub first_locale: String,
    pub first_type: ValueType,
    pub second_locale: String,
    pub second_type: ValueType,
}

/// Every declaration conflict found across one whole merge pass, so a
/// single build run reports every problem instead of the first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictReport {
    pub conflicts: Vec<TypeConflict>,
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} declaration conflict(s):", self.conflicts.len())?;
        for conflict in &self.conflicts {
            writeln!(f, "  {conflict}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ConflictReport {}

// ————————————————————————————————————————————————————————————————————————————
// MERGE
// ————————————————————————————————————————————————————————————————————————————

/// Merges every variant of one resource key, in declared order.
///
/// Callers never pass an empty group; that is a contract violation, not a
/// recoverable input.
pub fn merge(variants: &[TokenizedVariant]) -> Result<MergedResource, Vec<TypeConflict>> {
    assert!(!variants.is_empty(), "merge requires at least one variant");

    let name = variants[0].resource.name.clone();
    // descriptions are documentation only: first one present wins
    let description = variants.iter().find_map(|v| v.resource.description.clone());
    // a resource is at least as accessible as its least restrictive locale
    let visibility = variants
        .iter()
        .map(|v| v.visibility)
        .fold(Visibility::Private, Ord::max);

    struct Slot {
        token: Token,
        locale: String,
    }

    let mut slots: IndexMap<String, Slot> = IndexMap::new();
    let mut conflicts: Vec<TypeConflict> = Vec::new();

    for variant in variants {
        for token in &variant.resource.tokens {
            let key = token.key();
            match slots.get(&key) {
                None => {
                    slots.insert(key, Slot { token: token.clone(), locale: variant.locale.clone() });
                }
                Some(slot) => {
                    if slot.token.ty() != token.ty() {
                        conflicts.push(TypeConflict {
                            resource: name.clone(),
                            key,
                            first_locale: slot.locale.clone(),
                            first_type: slot.token.ty(),
                            second_locale: variant.locale.clone(),
                            second_type: token.ty(),
                        });
                    }
                }
            }
        }
    }

    if !conflicts.is_empty() {
        return Err(conflicts);
    }

    let mut arguments = Vec::with_capacity(slots.len());
    let mut all_numbered = true;
    let mut numbers = Vec::new();
    for slot in slots.into_values() {
        match slot.token {
            Token::Named { name, ty } => {
                all_numbered = false;
                arguments.push(Argument { key: name.clone(), name, ty });
            }
            Token::Numbered { number, ty } => {
                numbers.push(number);
                arguments.push(Argument {
                    // positional tokens carry no author-given name
                    name: format!("arg{number}"),
                    key: number.to_string(),
                    ty,
                });
            }
        }
    }

    Ok(MergedResource {
        name,
        description,
        visibility,
        arguments,
        has_contiguous_numbered_tokens: all_numbered && is_contiguous(&numbers),
    })
}

/// True iff the numbers are exactly 0..n with no gaps or repeats.
/// Vacuously true for the empty set.
fn is_contiguous(numbers: &[u32]) -> bool {
    let mut sorted = numbers.to_vec();
    sorted.sort_unstable();
    sorted.iter().enumerate().all(|(i, &n)| n == i as u32)
}

/// Whole-batch merge: group variants by resource key (first-seen key order),
/// reduce each group independently, and either return every contract or
/// every conflict.
pub fn merge_all(variants: Vec<TokenizedVariant>) -> Result<Vec<MergedResource>, ConflictReport> {
    let mut groups: IndexMap<String, Vec<TokenizedVariant>> = IndexMap::new();
    for variant in variants {
        groups.entry(variant.resource.name.clone()).or_default().push(variant);
    }
    let groups: Vec<Vec<TokenizedVariant>> = groups.into_values().collect();

    // per-key merges are independent; collect preserves group order
    let results: Vec<Result<MergedResource, Vec<TypeConflict>>> =
        groups.par_iter().map(|group| merge(group)).collect();

    let mut merged = Vec::with_capacity(results.len());
    let mut conflicts = Vec::new();
    for result in results {
        match result {
            Ok(resource) => merged.push(resource),
            Err(found) => conflicts.extend(found),
        }
    }

    if conflicts.is_empty() {
        Ok(merged)
    } else {
        Err(ConflictReport { conflicts })
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(locale: &str, visibility: Visibility, tokens: Vec<Token>) -> TokenizedVariant {
        TokenizedVariant {
            locale: locale.into(),
            visibility,
            resource: TokenizedResource {
                name: "test_resource".into(),
                description: None,
                tokens,
            },
        }
    }

    fn named(name: &str, ty: ValueType) -> Token {
        Token::Named { name: name.into(), ty }
    }

    fn numbered(number: u32, ty: ValueType) -> Token {
        Token::Numbered { number, ty }
    }

    #[test]
    fn contiguous_numbered_tokens() {
        let m = merge(&[variant(
            "en",
            Visibility::Public,
            vec![
                numbered(0, ValueType::Generic),
                numbered(1, ValueType::Integer),
                numbered(2, ValueType::Text),
            ],
        )])
        .unwrap();
        assert!(m.has_contiguous_numbered_tokens);
        let names: Vec<&str> = m.arguments.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["arg0", "arg1", "arg2"]);
    }

    #[test]
    fn gap_breaks_contiguity() {
        let m = merge(&[variant(
            "en",
            Visibility::Public,
            vec![numbered(0, ValueType::Generic), numbered(2, ValueType::Generic)],
        )])
        .unwrap();
        assert!(!m.has_contiguous_numbered_tokens);
    }

    #[test]
    fn any_named_argument_breaks_contiguity() {
        let m = merge(&[variant(
            "en",
            Visibility::Public,
            vec![
                numbered(0, ValueType::Generic),
                numbered(1, ValueType::Generic),
                named("extra", ValueType::Text),
            ],
        )])
        .unwrap();
        assert!(!m.has_contiguous_numbered_tokens);
    }

    #[test]
    fn zero_arguments_is_a_valid_contract() {
        let m = merge(&[variant("en", Visibility::Public, vec![])]).unwrap();
        assert!(m.arguments.is_empty());
        assert!(m.has_contiguous_numbered_tokens);
    }

    #[test]
    fn visibility_takes_the_maximum() {
        let m = merge(&[
            variant("en", Visibility::Private, vec![]),
            variant("fr", Visibility::Public, vec![]),
            variant("de", Visibility::Private, vec![]),
        ])
        .unwrap();
        assert_eq!(m.visibility, Visibility::Public);
    }

    #[test]
    fn description_first_present_wins() {
        let mut a = variant("en", Visibility::Public, vec![]);
        let mut b = variant("fr", Visibility::Public, vec![]);
        b.resource.description = Some("from fr".into());
        let m = merge(&[a.clone(), b.clone()]).unwrap();
        assert_eq!(m.description.as_deref(), Some("from fr"));

        a.resource.description = Some("from en".into());
        let m = merge(&[a, b]).unwrap();
        assert_eq!(m.description.as_deref(), Some("from en"));
    }

    #[test]
    fn argument_order_is_first_seen_across_variants() {
        let m = merge(&[
            variant("localeA", Visibility::Public, vec![named("y", ValueType::Text)]),
            variant(
                "localeB",
                Visibility::Public,
                vec![named("x", ValueType::Text), named("y", ValueType::Text)],
            ),
        ])
        .unwrap();
        let keys: Vec<&str> = m.arguments.iter().map(|a| a.key.as_str()).collect();
        assert_eq!(keys, vec!["y", "x"]);
    }

    #[test]
    fn type_conflict_names_both_locales_and_types() {
        let err = merge(&[
            variant("en", Visibility::Public, vec![named("x", ValueType::Integer)]),
            variant("fr", Visibility::Public, vec![named("x", ValueType::Text)]),
        ])
        .unwrap_err();
        assert_eq!(err.len(), 1);
        let conflict = &err[0];
        assert_eq!(conflict.key, "x");
        assert_eq!(conflict.first_locale, "en");
        assert_eq!(conflict.first_type, ValueType::Integer);
        assert_eq!(conflict.second_locale, "fr");
        assert_eq!(conflict.second_type, ValueType::Text);
        let rendered = conflict.to_string();
        assert!(rendered.contains("integer"));
        assert!(rendered.contains("text"));
    }

    #[test]
    fn agreeing_variants_do_not_conflict() {
        let m = merge(&[
            variant("en", Visibility::Public, vec![named("x", ValueType::Numeric)]),
            variant("fr", Visibility::Public, vec![named("x", ValueType::Numeric)]),
        ])
        .unwrap();
        assert_eq!(m.arguments.len(), 1);
        assert_eq!(m.arguments[0].ty, ValueType::Numeric);
    }

    #[test]
    fn merge_all_aggregates_conflicts_across_keys() {
        let mut broken_a = variant("en", Visibility::Public, vec![named("x", ValueType::Integer)]);
        broken_a.resource.name = "res_a".into();
        let mut broken_a2 = variant("fr", Visibility::Public, vec![named("x", ValueType::Text)]);
        broken_a2.resource.name = "res_a".into();

        let mut broken_b = variant("en", Visibility::Public, vec![named("y", ValueType::DateTime)]);
        broken_b.resource.name = "res_b".into();
        let mut broken_b2 = variant("fr", Visibility::Public, vec![named("y", ValueType::Generic)]);
        broken_b2.resource.name = "res_b".into();

        let report = merge_all(vec![broken_a, broken_a2, broken_b, broken_b2]).unwrap_err();
        assert_eq!(report.conflicts.len(), 2);
        let resources: Vec<&str> =
            report.conflicts.iter().map(|c| c.resource.as_str()).collect();
        assert!(resources.contains(&"res_a"));
        assert!(resources.contains(&"res_b"));
    }

    #[test]
    fn merge_all_preserves_first_seen_key_order() {
        let mut zeta = variant("en", Visibility::Public, vec![]);
        zeta.resource.name = "zeta".into();
        let mut alpha = variant("en", Visibility::Public, vec![]);
        alpha.resource.name = "alpha".into();

        let merged = merge_all(vec![zeta, alpha]).unwrap();
        let names: Vec<&str> = merged.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }
}
