//! Task environment files.
//!
//! A dotenv-style `KEY=VALUE` file whose entries replace a container's
//! environment wholesale. Keys starting with `_` are secrets: the prefix is
//! stripped and the value is used as the secret's `valueFrom` locator.
//!
//! ```text
//! # plain variables
//! MODE=production
//! export LOG_LEVEL="info"
//! # secrets
//! _DATABASE_URL=arn:aws:ssm:eu-west-1:1:parameter/db-url
//! ```

use crate::error::{ConvoyError, Result};
use crate::types::{KeyValuePair, Secret};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

pub const SECRET_PREFIX: char = '_';

/// Parsed environment file, split into plain variables and secrets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskEnvironment {
    pub environment: Vec<KeyValuePair>,
    pub secrets: Vec<Secret>,
}

impl TaskEnvironment {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let env = Self::parse(&content)?;
        tracing::info!(
            path = %path.display(),
            variables = env.environment.len(),
            secrets = env.secrets.len(),
            "read env file"
        );
        Ok(env)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(Self::from_pairs(parse_pairs(content)?))
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut env = Self::default();
        for (key, value) in pairs {
            match key.strip_prefix(SECRET_PREFIX) {
                Some(name) => env.secrets.push(Secret {
                    name: name.to_string(),
                    value_from: value,
                }),
                None => env.environment.push(KeyValuePair { name: key, value }),
            }
        }
        env
    }

    pub fn has_secrets(&self) -> bool {
        !self.secrets.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

static KEY_RE: OnceLock<Regex> = OnceLock::new();

fn key_re() -> &'static Regex {
    KEY_RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.\-]*$").unwrap())
}

/// Parse env content into ordered pairs. A key repeated later in the file
/// keeps its first position and takes the last value.
pub fn parse_pairs(content: &str) -> Result<Vec<(String, String)>> {
    let mut pairs: Vec<(String, String)> = Vec::new();
    for (idx, raw) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line).trim_start();
        let (key, value) = line.split_once('=').ok_or_else(|| ConvoyError::EnvFile {
            line: line_no,
            reason: "expected KEY=VALUE".to_string(),
        })?;
        let key = key.trim();
        if !key_re().is_match(key) {
            return Err(ConvoyError::EnvFile {
                line: line_no,
                reason: format!("invalid key '{key}'"),
            });
        }
        let value = parse_value(value.trim()).ok_or_else(|| ConvoyError::EnvFile {
            line: line_no,
            reason: format!("unterminated quote in value of '{key}'"),
        })?;
        match pairs.iter_mut().find(|(k, _)| k == key) {
            Some(existing) => existing.1 = value,
            None => pairs.push((key.to_string(), value)),
        }
    }
    Ok(pairs)
}

fn parse_value(raw: &str) -> Option<String> {
    if let Some(rest) = raw.strip_prefix('"') {
        let end = closing_double_quote(rest)?;
        return Some(unescape(&rest[..end]));
    }
    if let Some(rest) = raw.strip_prefix('\'') {
        let end = rest.find('\'')?;
        return Some(rest[..end].to_string());
    }
    // Unquoted: ` #` starts an inline comment.
    let value = match raw.find(" #") {
        Some(pos) => &raw[..pos],
        None => raw,
    };
    Some(value.trim_end().to_string())
}

fn closing_double_quote(s: &str) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        match c {
            '\\' if !escaped => escaped = true,
            '"' if !escaped => return Some(i),
            _ => escaped = false,
        }
    }
    None
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
