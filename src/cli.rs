//! Minimal CLI: load → tokenize → merge → (contract | rust)
//!
//! Input files are given in locale-priority order; that order is the
//! declared variant order for every merge, so output is deterministic.
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;
use serde::Deserialize;

use crate::merge::{merge_all, TokenizedVariant};
use crate::model::{RawResource, Visibility};
use crate::tokenize::{tokenize, TokenizeError};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// compile localized ICU message resources into per-resource accessor contracts
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// merge and print the per-resource contracts as JSON
    Contract(ContractOut),
    /// merge and emit a Rust source file of typed accessor functions
    Rust(RustOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more locale resource files, in locale-priority order.
    /// May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct ContractOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct RustOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .rs file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

/// One locale's resource file:
/// `{ "locale": "en", "resources": [ { "name", "text", ... } ] }`
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceFile {
    pub locale: String,
    pub resources: Vec<ResourceEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceEntry {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub text: String,
    /// Per-variant visibility declaration; public when absent.
    #[serde(default)]
    pub visibility: Visibility,
}

/// A decoded resource plus its declared visibility, pre-tokenization.
#[derive(Debug, Clone)]
struct LoadedVariant {
    raw: RawResource,
    visibility: Visibility,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_variants(&self) -> anyhow::Result<Vec<TokenizedVariant>> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .map_err(|e| anyhow::anyhow!("failed to resolve input file paths: {e}"))?;
        let mut loaded = Vec::<LoadedVariant>::new();
        for source_path in source_paths {
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read {}", source_path.display()))?;
            let file: ResourceFile = crate::path_de::from_str_with_path(&source)
                .map_err(|e| anyhow::anyhow!("{}: {e}", source_path.display()))?;
            loaded.extend(flatten_file(file));
        }
        tokenize_variants(&loaded).map_err(Into::into)
    }
}

fn flatten_file(file: ResourceFile) -> Vec<LoadedVariant> {
    let locale = file.locale;
    file.resources
        .into_iter()
        .map(|entry| LoadedVariant {
            raw: RawResource {
                name: entry.name,
                description: entry.description,
                text: entry.text,
                locale: locale.clone(),
            },
            visibility: entry.visibility,
        })
        .collect()
}

/// Tokenization is a pure per-variant transform, so it runs in parallel;
/// collect keeps the declared order.
fn tokenize_variants(loaded: &[LoadedVariant]) -> Result<Vec<TokenizedVariant>, TokenizeError> {
    loaded
        .par_iter()
        .map(|variant| {
            Ok(TokenizedVariant {
                locale: variant.raw.locale.clone(),
                visibility: variant.visibility,
                resource: tokenize(&variant.raw)?,
            })
        })
        .collect()
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Contract(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }

                let variants = target.input_settings.load_variants()?;
                let merged = report_conflicts(merge_all(variants))?;
                let contract_src = serde_json::to_string_pretty(&merged)?;
                write_output(target.out.as_deref(), &contract_src)
            }
            Command::Rust(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }

                let variants = target.input_settings.load_variants()?;
                let merged = report_conflicts(merge_all(variants))?;
                let rust_src = crate::emit::emit_rust(&merged);
                write_output(target.out.as_deref(), &rust_src)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

/// Render every collected conflict before failing, so one run shows every
/// problem in the resource set.
fn report_conflicts<T>(result: Result<T, crate::merge::ConflictReport>) -> anyhow::Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(report) => {
            for conflict in &report.conflicts {
                eprintln!("{}", conflict.to_string().red());
            }
            anyhow::bail!("{} declaration conflict(s)", report.conflicts.len());
        }
    }
}

fn write_output(out: Option<&std::path::Path>, content: &str) -> anyhow::Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(out, content)
                .with_context(|| format!("failed to write {}", out.display()))?;
        }
        None => println!("{content}"),
    }
    Ok(())
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            // Treat as a glob pattern
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                match entry {
                    Ok(p) => {
                        matched_any = true;
                        out.push(p);
                    }
                    Err(e) => return Err(Box::new(e)),
                }
            }
            if !matched_any {
                // Pattern was explicitly a glob but matched nothing -> surface as an error
                return Err(format!("glob pattern matched no files: {pattern}").into());
            }
        } else {
            // Treat as a literal path
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
