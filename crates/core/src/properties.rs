//! Java `.properties` file parsing
//!
//! Gradle scripts load `key.properties` through `java.util.Properties`, so the
//! file is read with the same rules:
//! - ISO-8859-1 decoding
//! - `#` and `!` comment lines
//! - `=`, `:` or whitespace between key and value
//! - Backslash line continuations
//! - `\t`, `\n`, `\r`, `\f` and `\uXXXX` escapes
//!
//! Later duplicates of a key replace earlier ones.

use crate::error::{Error, ErrorCode, Result, ResultExt};
use std::collections::BTreeMap;
use std::path::Path;

/// Parsed key/value pairs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl Properties {
    /// Read and parse a properties file
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).context(format!("Failed to read {}", path.display()))?;
        let text: String = bytes.iter().map(|&b| char::from(b)).collect();
        Self::parse(&text).context(format!("Failed to parse {}", path.display()))
    }

    /// Parse properties from text
    pub fn parse(input: &str) -> Result<Self> {
        let mut entries = BTreeMap::new();
        for (number, line) in logical_lines(input) {
            let (key, value) = split_key_value(&line);
            let key = unescape(key).map_err(|e| e.with_context(format!("line {number}")))?;
            let value = unescape(value).map_err(|e| e.with_context(format!("line {number}")))?;
            entries.insert(key, value);
        }
        Ok(Self { entries })
    }

    /// Look up a value
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Whether a key is present
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// All keys, sorted
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\x0c')
}

/// Whether a line ends in an odd number of backslashes
fn continues(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

/// Join continuation lines and drop comments and blanks.
///
/// Yields the 1-based number of the first physical line of each entry.
fn logical_lines(input: &str) -> Vec<(usize, String)> {
    let mut out = Vec::new();
    let mut physical = input
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .enumerate();

    while let Some((idx, raw)) = physical.next() {
        let line = raw.trim_start_matches(is_blank);
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }

        let mut logical = line.to_string();
        while continues(&logical) {
            logical.pop();
            match physical.next() {
                Some((_, next)) => logical.push_str(next.trim_start_matches(is_blank)),
                None => break,
            }
        }
        out.push((idx + 1, logical));
    }
    out
}

/// Split at the first unescaped separator
fn split_key_value(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();
    let mut sep_char = None;

    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => {
                key_end = i;
                sep_char = Some(c);
                break;
            }
            c if is_blank(c) => {
                key_end = i;
                sep_char = Some(c);
                break;
            }
            _ => {}
        }
    }

    let key = &line[..key_end];
    let Some(sep) = sep_char else {
        return (key, "");
    };

    let mut rest = line[key_end + sep.len_utf8()..].trim_start_matches(is_blank);
    if is_blank(sep) {
        if let Some(stripped) = rest.strip_prefix(['=', ':']) {
            rest = stripped.trim_start_matches(is_blank);
        }
    }
    (key, rest)
}

fn unescape(raw: &str) -> Result<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0c'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let decoded = (hex.len() == 4 && hex.chars().all(|c| c.is_ascii_hexdigit()))
                    .then(|| u32::from_str_radix(&hex, 16).ok())
                    .flatten()
                    .and_then(char::from_u32)
                    .ok_or_else(|| {
                        Error::new(
                            ErrorCode::InvalidFormat,
                            format!("Malformed \\uXXXX encoding: \\u{hex}"),
                        )
                    })?;
                out.push(decoded);
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    Ok(out)
}
