//! Rust accessor codegen: one `MergedResource` → one typed function.
//!
//! The generated file is self-contained: a small runtime prelude
//! (`FormattedResource`, the argument container, the epoch encoder) followed
//! by one accessor per resource in contract order. Output is deterministic
//! for a fixed contract list.

use crate::model::{Argument, MergedResource, ValueType, Visibility};

const HEADER: &str = "\
// Generated by msgfmt-gen. Do not edit this file directly; edit the locale\n\
// resource files and regenerate.\n\
#![allow(dead_code)]\n\n";

const PRELUDE: &str = r#"use std::time::{SystemTime, UNIX_EPOCH};

/// A resource id paired with its prepared format arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct FormattedResource {
    pub id: &'static str,
    pub args: FormatArgs,
}

/// Argument container: positional when the source placeholders are the
/// contiguous numbers 0..n, keyed otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum FormatArgs {
    Positional(Vec<FormatArg>),
    Named(Vec<(&'static str, FormatArg)>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormatArg {
    Any(String),
    Int(i64),
    Num(f64),
    Text(String),
    EpochMillis(i64),
}

fn epoch_millis(at: SystemTime) -> i64 {
    match at.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_millis() as i64,
        Err(e) => -(e.duration().as_millis() as i64),
    }
}
"#;

pub fn emit_rust(resources: &[MergedResource]) -> String {
    let mut out = String::new();
    out.push_str(HEADER);
    out.push_str(PRELUDE);
    for resource in resources {
        out.push('\n');
        emit_accessor(&mut out, resource);
    }
    out
}

fn emit_accessor(out: &mut String, resource: &MergedResource) {
    if let Some(description) = &resource.description {
        for line in description.lines() {
            out.push_str(&format!("/// {line}\n"));
        }
    }

    let vis = match resource.visibility {
        Visibility::Public => "pub",
        Visibility::Private => "pub(crate)",
    };
    let params = resource
        .arguments
        .iter()
        .map(|a| format!("{}: {}", rust_ident(&a.name), param_type(a.ty)))
        .collect::<Vec<_>>()
        .join(", ");
    out.push_str(&format!(
        "{vis} fn {}({params}) -> FormattedResource {{\n",
        rust_ident(&resource.name)
    ));

    out.push_str("    FormattedResource {\n");
    out.push_str(&format!("        id: {:?},\n", resource.name));
    if resource.arguments.is_empty() {
        out.push_str("        args: FormatArgs::Positional(Vec::new()),\n");
    } else if resource.has_contiguous_numbered_tokens {
        out.push_str("        args: FormatArgs::Positional(vec![\n");
        for argument in &resource.arguments {
            out.push_str(&format!("            {},\n", value_expr(argument)));
        }
        out.push_str("        ]),\n");
    } else {
        out.push_str("        args: FormatArgs::Named(vec![\n");
        for argument in &resource.arguments {
            out.push_str(&format!(
                "            ({:?}, {}),\n",
                argument.key,
                value_expr(argument)
            ));
        }
        out.push_str("        ]),\n");
    }
    out.push_str("    }\n");
    out.push_str("}\n");
}

fn param_type(ty: ValueType) -> &'static str {
    match ty {
        ValueType::Generic => "impl std::fmt::Display",
        ValueType::DateTime => "std::time::SystemTime",
        ValueType::Numeric => "f64",
        ValueType::Integer => "i64",
        ValueType::Text => "impl Into<String>",
    }
}

/// Value encoding at the formatting boundary: date/times become epoch
/// millis, everything else passes through.
fn value_expr(argument: &Argument) -> String {
    let name = rust_ident(&argument.name);
    match argument.ty {
        ValueType::Generic => format!("FormatArg::Any({name}.to_string())"),
        ValueType::DateTime => format!("FormatArg::EpochMillis(epoch_millis({name}))"),
        ValueType::Numeric => format!("FormatArg::Num({name})"),
        ValueType::Integer => format!("FormatArg::Int({name})"),
        ValueType::Text => format!("FormatArg::Text({name}.into())"),
    }
}

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "static", "struct", "super", "trait", "true", "type",
    "unsafe", "use", "where", "while",
];

/// Best-effort mapping of a resource/argument name onto a Rust identifier.
fn rust_ident(name: &str) -> String {
    let mut ident = String::with_capacity(name.len());
    for (i, c) in name.chars().enumerate() {
        if c.is_alphanumeric() || c == '_' {
            if i == 0 && c.is_ascii_digit() {
                ident.push('_');
            }
            ident.push(c);
        } else {
            ident.push('_');
        }
    }
    if KEYWORDS.contains(&ident.as_str()) {
        ident.push('_');
    }
    ident
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
