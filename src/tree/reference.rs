//! `${...}` reference tokens.
//!
//! A token names another node of the same tree. A leading run of dots makes
//! the path relative to the referencing value: one dot is the node that holds
//! it, every further dot climbs one level. Without dots the path is absolute.

use std::fmt;
use std::mem;

use crate::error::ConfigError;
use crate::tree::path::KeyPath;

/// The path named inside a `${...}` token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefPath {
    up: usize,
    keys: Vec<String>,
}

impl RefPath {
    /// Parse the text between `${` and `}`.
    pub fn parse(token: &str) -> Result<Self, String> {
        let token = token.trim();
        if token.is_empty() {
            return Err("empty reference".to_string());
        }

        let up = token.chars().take_while(|c| *c == '.').count();
        let rest = &token[up..];
        let keys: Vec<String> = if rest.is_empty() {
            Vec::new()
        } else {
            rest.split('.').map(str::to_string).collect()
        };

        if keys.iter().any(String::is_empty) {
            return Err("empty key in reference path".to_string());
        }
        if keys
            .iter()
            .any(|key| key.contains(|c: char| matches!(c, '$' | '{' | '}') || c.is_whitespace()))
        {
            return Err("nested or malformed token".to_string());
        }

        Ok(Self { up, keys })
    }

    pub fn is_relative(&self) -> bool {
        self.up > 0
    }

    /// Turn this path into an absolute one, given the location of the value
    /// that holds the token. `None` if the path climbs past the root.
    pub fn absolute_from(&self, location: &KeyPath) -> Option<KeyPath> {
        let keys = KeyPath::from_keys(self.keys.clone());
        if self.up == 0 {
            return Some(keys);
        }

        let container = location.parent()?;
        let climb = self.up - 1;
        if climb > container.len() {
            return None;
        }
        Some(container.prefix(container.len() - climb).join(&keys))
    }
}

impl fmt::Display for RefPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", ".".repeat(self.up), self.keys.join("."))
    }
}

/// One piece of a string that carries tokens.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Literal(String),
    Ref(RefPath),
}

/// An unresolved value: either a lone token or a string with embedded tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    source: String,
    segments: Vec<Segment>,
}

impl Reference {
    /// The text as written in the document.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The target path when the whole value is a single token. Such a value
    /// resolves to the target node itself, type included.
    pub fn whole(&self) -> Option<&RefPath> {
        match self.segments.as_slice() {
            [Segment::Ref(path)] => Some(path),
            _ => None,
        }
    }

    pub fn paths(&self) -> impl Iterator<Item = &RefPath> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Ref(path) => Some(path),
            Segment::Literal(_) => None,
        })
    }
}

/// Result of scanning a string scalar for tokens.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedText {
    /// No tokens; escapes (`\${`) have been removed.
    Plain(String),
    Interpolated(Reference),
}

/// Scan `text` for `${...}` tokens.
pub fn parse_text(text: &str) -> Result<ParsedText, ConfigError> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = text;

    while let Some(pos) = rest.find("${") {
        if rest[..pos].ends_with('\\') {
            literal.push_str(&rest[..pos - 1]);
            literal.push_str("${");
            rest = &rest[pos + 2..];
            continue;
        }

        literal.push_str(&rest[..pos]);
        let after = &rest[pos + 2..];
        let end = after.find('}').ok_or_else(|| ConfigError::MalformedReference {
            token: text.to_string(),
            reason: "unterminated `${`".to_string(),
        })?;

        let token = &after[..end];
        let path = RefPath::parse(token).map_err(|reason| ConfigError::MalformedReference {
            token: format!("${{{}}}", token),
            reason,
        })?;

        if !literal.is_empty() {
            segments.push(Segment::Literal(mem::take(&mut literal)));
        }
        segments.push(Segment::Ref(path));
        rest = &after[end + 1..];
    }
    literal.push_str(rest);

    if segments.is_empty() {
        return Ok(ParsedText::Plain(literal));
    }
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }

    Ok(ParsedText::Interpolated(Reference {
        source: text.to_string(),
        segments,
    }))
}
