//! Field selectors.
//!
//! Supports the subset of CSS selectors hosts use to point at template
//! fields: an optional tag name followed by attribute conditions, e.g.
//! `input[name="settings[template]"]` or `[data-template-field]`.

use crate::binding::FieldInfo;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Why a selector could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    #[error("selector is empty")]
    Empty,

    #[error("unterminated {0} in selector '{1}'")]
    Unterminated(&'static str, String),

    #[error("unexpected '{0}' in selector '{1}'")]
    Unexpected(char, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttributeCondition {
    name: String,
    /// `None` means the attribute only has to be present.
    value: Option<String>,
}

/// A parsed selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSelector {
    tag: Option<String>,
    attributes: Vec<AttributeCondition>,
    source: String,
}

impl FieldSelector {
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let source = input.trim();
        if source.is_empty() {
            return Err(SelectorError::Empty);
        }

        let mut chars = source.chars().peekable();
        let mut tag = String::new();
        while let Some(&c) = chars.peek() {
            if c == '[' {
                break;
            }
            if !(c.is_ascii_alphanumeric() || c == '-') {
                return Err(SelectorError::Unexpected(c, source.to_string()));
            }
            tag.push(c.to_ascii_lowercase());
            chars.next();
        }

        let mut attributes = Vec::new();
        while let Some(c) = chars.next() {
            if c != '[' {
                return Err(SelectorError::Unexpected(c, source.to_string()));
            }

            let mut name = String::new();
            let mut value = None;
            loop {
                match chars.next() {
                    Some(']') => break,
                    Some('=') => {
                        value = Some(parse_value(&mut chars, source)?);
                        match chars.next() {
                            Some(']') => break,
                            Some(other) => {
                                return Err(SelectorError::Unexpected(other, source.to_string()))
                            }
                            None => {
                                return Err(SelectorError::Unterminated(
                                    "attribute",
                                    source.to_string(),
                                ))
                            }
                        }
                    }
                    Some(c) if c.is_whitespace() => {}
                    Some(c) => name.push(c),
                    None => {
                        return Err(SelectorError::Unterminated(
                            "attribute",
                            source.to_string(),
                        ))
                    }
                }
            }

            if name.is_empty() {
                return Err(SelectorError::Unexpected(']', source.to_string()));
            }
            attributes.push(AttributeCondition {
                name: name.to_ascii_lowercase(),
                value,
            });
        }

        Ok(Self {
            tag: (!tag.is_empty()).then_some(tag),
            attributes,
            source: source.to_string(),
        })
    }

    /// Whether `field` satisfies the tag and every attribute condition.
    pub fn matches(&self, field: &FieldInfo) -> bool {
        if let Some(tag) = &self.tag {
            if !field.tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }

        self.attributes.iter().all(|cond| match &cond.value {
            Some(expected) => field.attribute(&cond.name) == Some(expected.as_str()),
            None => field.attribute(&cond.name).is_some(),
        })
    }
}

fn parse_value(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    source: &str,
) -> Result<String, SelectorError> {
    let mut value = String::new();
    match chars.peek().copied() {
        Some(quote @ ('"' | '\'')) => {
            chars.next();
            loop {
                match chars.next() {
                    Some(c) if c == quote => return Ok(value),
                    Some(c) => value.push(c),
                    None => return Err(SelectorError::Unterminated("string", source.to_string())),
                }
            }
        }
        _ => {
            while let Some(&c) = chars.peek() {
                if c == ']' {
                    break;
                }
                value.push(c);
                chars.next();
            }
            Ok(value.trim().to_string())
        }
    }
}

impl FromStr for FieldSelector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for FieldSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
