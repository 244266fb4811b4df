// SPDX-FileCopyrightText: 2026 vaultsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Startup diagnostics for configuration problems.
//!
//! Figment errors are mapped onto [`ConfigError`] variants that render with
//! miette: unknown keys point at the offending line of the TOML file, and
//! both unknown keys and unknown export formats get a "did you mean"
//! suggestion ranked by Jaro-Winkler similarity. Values that came from the
//! environment name the provider they were read from, since container
//! deployments usually configure everything through variables.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use figment::error::{Error as FigmentError, Kind};
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Below this Jaro-Winkler score a candidate is not worth suggesting.
const MIN_SIMILARITY: f64 = 0.75;

/// A configuration problem, reported before any backup runs.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(vaultsync::config::unknown_key),
        help("{}", hint(suggestion.as_deref(), "known keys", known))
    )]
    UnknownKey {
        key: String,
        suggestion: Option<String>,
        known: String,
        #[label("not a recognized key")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value outside an enumerated set, such as an export format.
    #[error("`{value}` is not a valid value for `{key}`")]
    #[diagnostic(
        code(vaultsync::config::invalid_value),
        help("{}{}", hint(suggestion.as_deref(), "accepted values", accepted), origin_note(origin.as_deref()))
    )]
    InvalidValue {
        key: String,
        value: String,
        suggestion: Option<String>,
        accepted: String,
        origin: Option<String>,
    },

    #[error("`{key}` has the wrong type: found {found}")]
    #[diagnostic(
        code(vaultsync::config::invalid_type),
        help("expected {expected}{}", origin_note(origin.as_deref()))
    )]
    InvalidType {
        key: String,
        found: String,
        expected: String,
        origin: Option<String>,
    },

    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(vaultsync::config::missing_key),
        help("set `{key}` in vaultsync.toml or through the environment")
    )]
    MissingKey { key: String },

    #[error("validation error: {message}")]
    #[diagnostic(code(vaultsync::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(vaultsync::config::other))]
    Other(String),
}

fn hint(suggestion: Option<&str>, label: &str, candidates: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? {label}: {candidates}"),
        None => format!("{label}: {candidates}"),
    }
}

fn origin_note(origin: Option<&str>) -> String {
    origin.map(|o| format!(" (value read from {o})")).unwrap_or_default()
}

/// Maps every error inside a `figment::Error` onto a [`ConfigError`].
///
/// `toml_sources` holds `(path, content)` pairs used to underline unknown
/// keys; pass an empty slice when no file content is available.
pub fn figment_to_config_errors(
    err: FigmentError,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| classify(&error, toml_sources))
        .collect()
}

fn classify(error: &FigmentError, toml_sources: &[(String, String)]) -> ConfigError {
    let key = error.path.join(".");
    let origin = error.metadata.as_ref().map(|m| m.name.to_string());

    match &error.kind {
        Kind::UnknownField(field, expected) => {
            let (span, src) = locate(error, field, toml_sources).unzip();
            ConfigError::UnknownKey {
                key: field.clone(),
                suggestion: suggest_key(field, expected),
                known: expected.join(", "),
                span,
                src,
            }
        }
        Kind::UnknownVariant(value, expected) => ConfigError::InvalidValue {
            key,
            value: value.clone(),
            suggestion: suggest_key(value, expected),
            accepted: expected.join(", "),
            origin,
        },
        Kind::MissingField(field) => ConfigError::MissingKey {
            key: if key.is_empty() {
                field.to_string()
            } else {
                format!("{key}.{field}")
            },
        },
        Kind::InvalidType(found, expected) => ConfigError::InvalidType {
            key,
            found: found.to_string(),
            expected: expected.clone(),
            origin,
        },
        Kind::InvalidValue(found, expected) => ConfigError::InvalidType {
            key,
            found: found.to_string(),
            expected: expected.clone(),
            origin,
        },
        _ => ConfigError::Other(error.to_string()),
    }
}

/// Span of `field` in the TOML file the error came from, if it is known.
fn locate(
    error: &FigmentError,
    field: &str,
    toml_sources: &[(String, String)],
) -> Option<(SourceSpan, NamedSource<String>)> {
    let path = match error.metadata.as_ref()?.source.as_ref()? {
        figment::Source::File(path) => path.display().to_string(),
        _ => return None,
    };
    let (name, content) = toml_sources.iter().find(|(p, _)| *p == path)?;
    let offset = find_key_offset(content, &error.path, field)?;
    Some((
        SourceSpan::new(offset.into(), field.len()),
        NamedSource::new(name, content.clone()),
    ))
}

/// Byte offset of `field` as a key inside the table named by `section`.
///
/// Only the first path element is used to find the `[table]` header, which
/// is all the nesting this config has.
pub fn find_key_offset(content: &str, section: &[String], field: &str) -> Option<usize> {
    let body_start = match section.first() {
        Some(table) => {
            let header = format!("[{table}]");
            content.find(&header)? + header.len()
        }
        None => 0,
    };

    let mut line_start = body_start;
    for line in content[body_start..].split_inclusive('\n') {
        let indent = line.len() - line.trim_start().len();
        let rest = &line[indent..];
        if rest.starts_with('[') {
            return None;
        }
        if let Some(after) = rest.strip_prefix(field) {
            if after.trim_start().starts_with('=') {
                return Some(line_start + indent);
            }
        }
        line_start += line.len();
    }
    None
}

/// Closest candidate to `input`, if any is similar enough.
pub fn suggest_key<S: AsRef<str>>(input: &str, candidates: &[S]) -> Option<String> {
    candidates
        .iter()
        .map(|c| (strsim::jaro_winkler(input, c.as_ref()), c.as_ref()))
        .filter(|(score, _)| *score > MIN_SIMILARITY)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, c)| c.to_string())
}

/// Render a list of `ConfigError`s to stderr using miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    use miette::GraphicalReportHandler;

    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        if handler.render_report(&mut buf, error as &dyn Diagnostic).is_ok() {
            eprint!("{buf}");
        } else {
            eprintln!("Error: {error}");
        }
    }
    eprintln!(
        "vaultsync: {} configuration problem(s), not starting",
        errors.len()
    );
}
