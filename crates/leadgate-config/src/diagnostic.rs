// SPDX-FileCopyrightText: 2026 Leadgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Config error diagnostics.
//!
//! Turns figment deserialization failures into miette reports: each failure
//! becomes a [`ConfigError`] carrying a source span located in the offending
//! TOML document and, for misspelled keys, a "did you mean" hint scored with
//! Jaro-Winkler similarity.

use miette::{Diagnostic, GraphicalReportHandler, NamedSource, SourceSpan};
use thiserror::Error;

/// Minimum Jaro-Winkler score before a key is offered as a correction.
/// 0.75 catches `databse_path` -> `database_path` while filtering noise.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration error renderable as a miette report.
///
/// Leadgate's config structs default every field, so a missing-field error
/// cannot occur; the variants cover what strict parsing and validation
/// actually produce.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A key that no section accepts, with a typo suggestion when one is
    /// close enough.
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(code(leadgate::config::unknown_key), help("{hint}"))]
    UnknownKey {
        key: String,
        suggestion: Option<String>,
        hint: String,
        #[label("not a recognized key")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value of the wrong TOML type.
    #[error("invalid type for `{key}`: {detail}")]
    #[diagnostic(code(leadgate::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
        #[label("wrong type")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A well-formed value rejected by post-parse validation.
    #[error("invalid configuration: {message}")]
    #[diagnostic(code(leadgate::config::validation))]
    Validation { message: String },

    /// Anything figment reports that has no richer mapping.
    #[error("configuration error: {0}")]
    #[diagnostic(code(leadgate::config::other))]
    Other(String),
}

/// A TOML document consulted when resolving error spans.
#[derive(Debug, Clone)]
pub struct TomlSource {
    pub name: String,
    pub content: String,
}

impl TomlSource {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Byte span of `key` within `section` (`None` means top level).
    ///
    /// Tracks section headers while scanning, so a key that also appears in
    /// a later section is never mistaken for the one being reported.
    fn locate_key(&self, section: Option<&str>, key: &str) -> Option<SourceSpan> {
        let mut in_scope = section.is_none();
        let mut offset = 0;
        for line in self.content.split_inclusive('\n') {
            let trimmed = line.trim_start();
            if trimmed.starts_with('[') {
                let header = trimmed
                    .trim_end()
                    .trim_start_matches('[')
                    .trim_end_matches(']');
                in_scope = section == Some(header);
            } else if in_scope
                && let Some(rest) = trimmed.strip_prefix(key)
                && rest.trim_start().starts_with('=')
            {
                let start = offset + (line.len() - trimmed.len());
                return Some(SourceSpan::new(start.into(), key.len()));
            }
            offset += line.len();
        }
        None
    }
}

/// Convert a figment error (which may aggregate several failures) into
/// diagnostics, attaching spans and hints where the sources allow.
pub fn figment_to_config_errors(
    err: figment::Error,
    sources: &[TomlSource],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| match &error.kind {
            Kind::UnknownField(field, allowed) => {
                let allowed: Vec<&str> = allowed.to_vec();
                let suggestion = closest_key(field, &allowed);
                let hint = match suggestion.as_deref() {
                    Some(s) => format!("did you mean `{s}`? valid keys: {}", allowed.join(", ")),
                    None => format!("valid keys: {}", allowed.join(", ")),
                };
                let section = error.path.first().map(String::as_str);
                let (span, src) = span_for(sources, &error, section, field);
                ConfigError::UnknownKey {
                    key: field.clone(),
                    suggestion,
                    hint,
                    span,
                    src,
                }
            }
            Kind::InvalidType(actual, expected) => {
                let (section, field) = match error.path.as_slice() {
                    [] => (None, None),
                    [field] => (None, Some(field.as_str())),
                    [section, .., field] => (Some(section.as_str()), Some(field.as_str())),
                };
                let (span, src) = match field {
                    Some(field) => span_for(sources, &error, section, field),
                    None => (None, None),
                };
                ConfigError::InvalidType {
                    key: error.path.join("."),
                    detail: format!("found {actual}"),
                    expected: expected.to_string(),
                    span,
                    src,
                }
            }
            _ => ConfigError::Other(error.to_string()),
        })
        .collect()
}

/// Resolve the span and source snippet for one figment error.
///
/// File providers name their path in the error metadata; inline documents do
/// not, so when exactly one source was supplied it is used as-is.
fn span_for(
    sources: &[TomlSource],
    error: &figment::error::Error,
    section: Option<&str>,
    key: &str,
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let file = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|s| match s {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        });

    let source = match &file {
        Some(path) => sources.iter().find(|s| &s.name == path),
        None if sources.len() == 1 => sources.first(),
        None => None,
    };

    match source.and_then(|s| s.locate_key(section, key).map(|span| (s, span))) {
        Some((s, span)) => (
            Some(span),
            Some(NamedSource::new(&s.name, s.content.clone())),
        ),
        None => (None, None),
    }
}

/// Best fuzzy match for an unknown key among the accepted ones.
fn closest_key(unknown: &str, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Render diagnostics to stderr through miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = GraphicalReportHandler::new();
    let mut out = String::new();
    for error in errors {
        if handler.render_report(&mut out, error).is_err() {
            out.push_str(&format!("error: {error}\n"));
        }
    }
    eprint!("{out}");
}
