//! YAML syntax diagnostics.
//!
//! Converts `serde_saphyr` errors into [`miette`] diagnostics that point at
//! the offending character and suggest a fix for common mistakes.

use super::{ManifestName, ManifestSource};
use crate::manifest::hints::YAML_HINTS;
use miette::{Diagnostic, NamedSource, SourceSpan};
use serde_saphyr::{Error as YamlError, Location};
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
#[error("YAML parse error at line {line}, column {column}: {source}")]
#[diagnostic(code(easymake::yaml::parse))]
struct YamlDiagnostic {
    #[source_code]
    src: NamedSource<String>,
    #[label("here")]
    span: Option<SourceSpan>,
    #[help]
    help: Option<String>,
    #[source]
    source: YamlError,
    line: u64,
    column: u64,
}

/// Byte offset of a one-based `line`/`column` pair, clamped to the line end.
///
/// Columns count characters, so multi-byte text and `\r\n` endings are
/// handled.
fn offset_of(src: &str, line: u64, column: u64) -> usize {
    let line_idx = usize::try_from(line.saturating_sub(1)).unwrap_or(usize::MAX);
    let col_idx = usize::try_from(column.saturating_sub(1)).unwrap_or(usize::MAX);
    let mut start = 0usize;
    for (idx, text) in src.split_inclusive('\n').enumerate() {
        if idx == line_idx {
            let body = text.trim_end_matches(['\n', '\r']);
            return start
                + body
                    .char_indices()
                    .nth(col_idx)
                    .map_or(body.len(), |(at, _)| at);
        }
        start += text.len();
    }
    src.len()
}

/// A one-character span at `loc`, or an empty span at a line end.
fn span_at(src: &str, loc: Location) -> SourceSpan {
    let at = offset_of(src, loc.line(), loc.column());
    let len = src
        .get(at..)
        .and_then(|rest| rest.chars().next())
        .filter(|c| !matches!(c, '\n' | '\r'))
        .map_or(0, char::len_utf8);
    SourceSpan::new(at.into(), len)
}

fn indented_with_tab(src: &str, loc: Location) -> bool {
    let idx = usize::try_from(loc.line().saturating_sub(1)).unwrap_or(usize::MAX);
    src.lines().nth(idx).is_some_and(|line| {
        line.chars()
            .take_while(|c| c.is_whitespace())
            .any(|c| c == '\t')
    })
}

fn hint_for(message: &str, src: &str, loc: Option<Location>) -> Option<String> {
    if loc.is_some_and(|l| indented_with_tab(src, l)) {
        return Some("indent with spaces; YAML does not allow tabs".to_owned());
    }
    let lower = message.to_lowercase();
    YAML_HINTS
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, hint)| (*hint).to_owned())
}

/// Map a `serde_saphyr` parse error into a [`miette`] diagnostic.
///
/// Errors without a location are reported at line 1, column 1 with no span.
#[must_use]
pub fn map_yaml_error(
    err: YamlError,
    src: &ManifestSource,
    name: &ManifestName,
) -> Box<dyn Diagnostic + Send + Sync + 'static> {
    let loc = err.location();
    let text = src.as_str();
    let help = hint_for(&err.to_string(), text, loc);
    Box::new(YamlDiagnostic {
        src: NamedSource::new(name.as_str(), text.to_owned()),
        span: loc.map(|l| span_at(text, l)),
        help,
        line: loc.map_or(1, |l| l.line()),
        column: loc.map_or(1, |l| l.column()),
        source: err,
    })
}
