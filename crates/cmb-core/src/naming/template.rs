//! Plantillas de ruta con placeholders `{nombre}`.
//!
//! Una `PathTemplate` se parsea una sola vez y se renderiza muchas veces (una
//! por contexto). El parseo rechaza llaves desbalanceadas y placeholders
//! vacíos; la resolución de nombres la hace el `Namer`.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("malformed template '{template}': {reason}")]
    Malformed { template: String, reason: String },
    #[error("unresolved placeholder '{field}' in template '{template}'")]
    Unresolved { field: String, template: String },
    #[error("sim index {index} does not fit in {digits} digits")]
    SimIndexOverflow { index: u32, digits: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// Plantilla parseada.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    pub fn parse(raw: &str) -> Result<Self, TemplateError> {
        let malformed = |reason: &str| TemplateError::Malformed { template: raw.to_string(), reason: reason.to_string() };
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = raw.chars();
        while let Some(c) = chars.next() {
            match c {
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for n in chars.by_ref() {
                        match n {
                            '}' => {
                                closed = true;
                                break;
                            }
                            '{' => return Err(malformed("nested '{'")),
                            other => name.push(other),
                        }
                    }
                    if !closed {
                        return Err(malformed("unclosed '{'"));
                    }
                    let name = name.trim();
                    if name.is_empty() {
                        return Err(malformed("empty placeholder"));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(name.to_string()));
                }
                '}' => return Err(malformed("unmatched '}'")),
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(Self { raw: raw.to_string(), segments })
    }

    /// Texto original de la plantilla.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Nombres de placeholders en orden de aparición (con repetidos).
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
                                 Segment::Placeholder(name) => Some(name.as_str()),
                                 Segment::Literal(_) => None,
                             })
    }

    pub fn has_placeholder(&self, name: &str) -> bool {
        self.placeholders().any(|p| p == name)
    }

    /// Sustituye cada placeholder con `lookup`. Un `Ok(None)` del lookup es un
    /// placeholder sin valor y produce `TemplateError::Unresolved`.
    pub fn render<F>(&self, mut lookup: F) -> Result<String, TemplateError>
        where F: FnMut(&str) -> Result<Option<String>, TemplateError>
    {
        let mut out = String::with_capacity(self.raw.len() + 16);
        for seg in &self.segments {
            match seg {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => match lookup(name)? {
                    Some(value) => out.push_str(&value),
                    None => {
                        return Err(TemplateError::Unresolved { field: name.clone(), template: self.raw.clone() })
                    }
                },
            }
        }
        Ok(out)
    }
}

impl FromStr for PathTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
