//! Distinguished Name utilities.
//!
//! The resolver composes login DNs (`<login-attribute>=<username>,<base-dn>`)
//! and parses configured base DNs. Parsing is intentionally strict to
//! surface malformed configuration early.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use dirauth_core::error::Error as CoreError;

/// Errors that can occur when parsing a distinguished name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DistinguishedNameError {
    /// The distinguished name was empty.
    #[error("distinguished name cannot be empty")]
    Empty,
    /// A component lacked an attribute, a value, or the `=` between them.
    #[error("invalid distinguished name component: {0}")]
    InvalidComponent(String),
    /// The distinguished name ended with an escape character.
    #[error("distinguished name contains an unterminated escape sequence")]
    UnterminatedEscape,
}

impl From<DistinguishedNameError> for CoreError {
    fn from(err: DistinguishedNameError) -> Self {
        CoreError::Config(err.to_string())
    }
}

/// Strongly-typed distinguished name wrapper.
///
/// Keeps a canonical string representation alongside the parsed
/// attribute/value components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistinguishedName {
    raw: String,
    components: Vec<(String, String)>,
}

impl DistinguishedName {
    /// Parses a distinguished name from a string.
    ///
    /// # Errors
    ///
    /// Returns [`DistinguishedNameError`] if the input is empty or a
    /// component is malformed.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, DistinguishedNameError> {
        let raw = input.as_ref().trim();
        if raw.is_empty() {
            return Err(DistinguishedNameError::Empty);
        }

        let mut components = Vec::new();
        for part in split_escaped(raw, ',')? {
            let (attribute, value) = split_attribute_value(&part)?;
            components.push((attribute, value));
        }

        Ok(Self {
            raw: components_to_string(&components),
            components,
        })
    }

    /// Borrows the canonical distinguished name string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Looks up the value of the first matching attribute (case-insensitive).
    #[must_use]
    pub fn get(&self, attribute: &str) -> Option<&str> {
        self.components
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(attribute))
            .map(|(_, value)| value.as_str())
    }

    /// Creates a new distinguished name by prefixing an attribute/value
    /// component, e.g. composing an entry DN from a base DN.
    ///
    /// The value is taken verbatim and escaped on rendering.
    #[must_use]
    pub fn with_prefix(mut self, attribute: impl Into<String>, value: impl Into<String>) -> Self {
        self.components.insert(0, (attribute.into(), value.into()));
        self.raw = components_to_string(&self.components);
        self
    }
}

impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for DistinguishedName {
    type Err = DistinguishedNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<DistinguishedName> for String {
    fn from(value: DistinguishedName) -> Self {
        value.raw
    }
}

fn split_escaped(input: &str, delimiter: char) -> Result<Vec<String>, DistinguishedNameError> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut escape = false;

    for ch in input.chars() {
        if escape {
            current.push(ch);
            escape = false;
        } else if ch == '\\' {
            escape = true;
        } else if ch == delimiter {
            parts.push(current.trim().to_string());
            current.clear();
        } else {
            current.push(ch);
        }
    }

    if escape {
        return Err(DistinguishedNameError::UnterminatedEscape);
    }

    parts.push(current.trim().to_string());
    if parts.iter().any(String::is_empty) {
        return Err(DistinguishedNameError::InvalidComponent(input.to_string()));
    }
    Ok(parts)
}

fn split_attribute_value(component: &str) -> Result<(String, String), DistinguishedNameError> {
    let idx = component
        .find('=')
        .ok_or_else(|| DistinguishedNameError::InvalidComponent(component.to_string()))?;
    let attribute = component[..idx].trim();
    let value = component[idx + 1..].trim_start();

    if attribute.is_empty() || value.is_empty() {
        return Err(DistinguishedNameError::InvalidComponent(
            component.to_string(),
        ));
    }

    Ok((attribute.to_string(), unescape(value)?))
}

fn unescape(value: &str) -> Result<String, DistinguishedNameError> {
    let mut result = String::with_capacity(value.len());
    let mut chars = value.chars();

    while let Some(ch) = chars.next() {
        if ch == '\\' {
            let next = chars
                .next()
                .ok_or(DistinguishedNameError::UnterminatedEscape)?;
            result.push(next);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

fn escape(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let mut escaped = String::with_capacity(value.len());

    for (idx, ch) in chars.iter().enumerate() {
        let needs_escape = matches!(ch, ',' | '+' | '"' | '\\' | '<' | '>' | ';' | '=')
            || (idx == 0 && (*ch == ' ' || *ch == '#'))
            || (idx == chars.len() - 1 && *ch == ' ');

        if needs_escape {
            escaped.push('\\');
        }
        escaped.push(*ch);
    }

    escaped
}

fn components_to_string(components: &[(String, String)]) -> String {
    components
        .iter()
        .map(|(attribute, value)| format!("{attribute}={}", escape(value)))
        .collect::<Vec<_>>()
        .join(",")
}
