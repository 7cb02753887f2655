//! Expected-operation patterns

use super::canonical::{method_of, normalize};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between alternatives in a disjunction's textual form
pub const DISJUNCTION_SEPARATOR: &str = " OR ";

/// One element of an expected pattern.
///
/// The textual form round-trips through [`PatternElement::parse`]:
/// `a OR b` is a disjunction, anything containing `<` is a method-only
/// wildcard (`returnValue(<the one that succeeded>, <value>)`), everything else
/// is a literal canonical operation string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PatternElement {
    /// Exact canonical operation string
    Literal(String),

    /// Matches when the observed op equals any alternative
    AnyOf(Vec<String>),

    /// Matches any call of `method`, whatever the arguments
    Method { method: String, text: String },
}

impl PatternElement {
    /// Literal element
    pub fn literal(op: impl Into<String>) -> Self {
        PatternElement::Literal(op.into())
    }

    /// Disjunction of literals
    pub fn any_of<I, S>(alternatives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PatternElement::AnyOf(alternatives.into_iter().map(Into::into).collect())
    }

    /// Wildcard on a method name, with a placeholder describing the arguments
    pub fn method(method: impl Into<String>, placeholder: &str) -> Self {
        let method = method.into();
        let text = format!("{}({})", method, placeholder);
        PatternElement::Method { method, text }
    }

    /// Parse the textual form
    pub fn parse(text: &str) -> Result<Self, String> {
        let text = text.trim();
        if text.is_empty() {
            return Err("Empty pattern element".to_string());
        }

        if text.contains(DISJUNCTION_SEPARATOR) {
            let alternatives: Vec<String> = text
                .split(DISJUNCTION_SEPARATOR)
                .map(|alt| alt.trim().to_string())
                .filter(|alt| !alt.is_empty())
                .collect();
            return Ok(PatternElement::AnyOf(alternatives));
        }

        if text.contains('<') {
            let method = method_of(text).trim().to_string();
            if method.is_empty() {
                return Err(format!("Wildcard pattern without method name: {}", text));
            }
            return Ok(PatternElement::Method {
                method,
                text: text.to_string(),
            });
        }

        Ok(PatternElement::Literal(text.to_string()))
    }

    /// Whether an observed canonical operation satisfies this element
    pub fn matches(&self, observed: &str) -> bool {
        let observed = normalize(observed);
        match self {
            PatternElement::Literal(expected) => normalize(expected) == observed,
            PatternElement::AnyOf(alternatives) => {
                alternatives.iter().any(|alt| normalize(alt) == observed)
            }
            PatternElement::Method { method, .. } => {
                observed.starts_with(&format!("{}(", normalize(method)))
            }
        }
    }
}

impl fmt::Display for PatternElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternElement::Literal(op) => f.write_str(op),
            PatternElement::AnyOf(alternatives) => {
                f.write_str(&alternatives.join(DISJUNCTION_SEPARATOR))
            }
            PatternElement::Method { text, .. } => f.write_str(text),
        }
    }
}

impl TryFrom<String> for PatternElement {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        PatternElement::parse(&value)
    }
}

impl From<PatternElement> for String {
    fn from(element: PatternElement) -> Self {
        element.to_string()
    }
}

/// Ordered list of pattern elements for one (prompt, scenario) pair
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpectedPattern(Vec<PatternElement>);

impl ExpectedPattern {
    pub fn new(elements: Vec<PatternElement>) -> Self {
        Self(elements)
    }

    /// Parse each textual element
    pub fn parse<I, S>(elements: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        elements
            .into_iter()
            .map(|e| PatternElement::parse(e.as_ref()))
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    pub fn elements(&self) -> &[PatternElement] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PatternElement> {
        self.0.iter()
    }
}

impl From<Vec<PatternElement>> for ExpectedPattern {
    fn from(elements: Vec<PatternElement>) -> Self {
        Self(elements)
    }
}

impl<'a> IntoIterator for &'a ExpectedPattern {
    type Item = &'a PatternElement;
    type IntoIter = std::slice::Iter<'a, PatternElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
