//! Rule-line parsing.
//!
//! The compiler's only input format: one `action<TAB>key<TAB>value` record per
//! line. Blank lines and lines starting with `#` are skipped. A trailing `\r`
//! is tolerated; every other character, spaces included, is significant.

use crate::error::{Error, Result};
use crate::model::RuleKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    Set,
    Rule(RuleKind),
}

/// One parsed record, borrowing from the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RuleLine<'a> {
    pub action: Action,
    pub key: &'a str,
    pub value: &'a str,
    pub raw: &'a str,
}

impl RuleLine<'_> {
    pub(crate) fn invalid(&self, reason: impl Into<String>) -> Error {
        invalid(self.raw, reason)
    }
}

pub(crate) fn invalid(line: &str, reason: impl Into<String>) -> Error {
    Error::InvalidRule { line: line.to_string(), reason: reason.into() }
}

pub(crate) fn parse_lines(text: &str) -> Result<Vec<RuleLine<'_>>> {
    let mut out = Vec::new();

    for raw in text.split('\n') {
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }

        let columns: Vec<&str> = line.split('\t').collect();
        let &[action, key, value] = columns.as_slice() else {
            return Err(invalid(line, format!("expected 3 tab-separated columns, found {}", columns.len())));
        };

        let action = match action {
            "set" => Action::Set,
            other => match RuleKind::from_letter(other) {
                Some(kind) => Action::Rule(kind),
                None => return Err(invalid(line, format!("unknown action {other:?}"))),
            },
        };

        out.push(RuleLine { action, key, value, raw: line });
    }

    Ok(out)
}
