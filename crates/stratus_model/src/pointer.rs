//! JSON pointers (RFC 6901) for extracting computed values out of deployed
//! output resources.

use serde_json::Value;

use crate::error::PointerError;

/// A parsed JSON pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPointer {
    raw: String,
    tokens: Vec<String>,
}

impl JsonPointer {
    /// Parse a pointer such as `/status/loadBalancer/ingress/0/ip`.
    ///
    /// The empty string refers to the whole document.
    pub fn parse(pointer: &str) -> Result<Self, PointerError> {
        if pointer.is_empty() {
            return Ok(Self {
                raw: String::new(),
                tokens: Vec::new(),
            });
        }

        let Some(rest) = pointer.strip_prefix('/') else {
            return Err(PointerError::InvalidSyntax(pointer.to_string()));
        };

        let tokens = rest
            .split('/')
            .map(|token| unescape(pointer, token))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            raw: pointer.to_string(),
            tokens,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Walk `document` along the pointer.
    pub fn resolve<'a>(&self, document: &'a Value) -> Result<&'a Value, PointerError> {
        let mut current = document;
        for (depth, token) in self.tokens.iter().enumerate() {
            current = match current {
                Value::Object(map) => map.get(token).ok_or_else(|| self.missing(token, depth))?,
                Value::Array(items) => {
                    let index = parse_index(token).ok_or_else(|| PointerError::InvalidIndex {
                        pointer: self.raw.clone(),
                        segment: token.clone(),
                    })?;
                    items.get(index).ok_or_else(|| self.missing(token, depth))?
                }
                _ => {
                    return Err(PointerError::NotTraversable {
                        pointer: self.raw.clone(),
                        segment: token.clone(),
                    })
                }
            };
        }
        Ok(current)
    }

    fn missing(&self, token: &str, depth: usize) -> PointerError {
        PointerError::MissingSegment {
            pointer: self.raw.clone(),
            segment: token.to_string(),
            depth,
        }
    }
}

impl std::fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl std::str::FromStr for JsonPointer {
    type Err = PointerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Parse and resolve in one step.
pub fn extract<'a>(document: &'a Value, pointer: &str) -> Result<&'a Value, PointerError> {
    JsonPointer::parse(pointer)?.resolve(document)
}

fn unescape(pointer: &str, token: &str) -> Result<String, PointerError> {
    if !token.contains('~') {
        return Ok(token.to_string());
    }

    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(c) = chars.next() {
        if c != '~' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('~'),
            Some('1') => out.push('/'),
            _ => {
                return Err(PointerError::InvalidEscape {
                    pointer: pointer.to_string(),
                    token: token.to_string(),
                })
            }
        }
    }
    Ok(out)
}

fn parse_index(token: &str) -> Option<usize> {
    if token.is_empty() || (token.len() > 1 && token.starts_with('0')) {
        return None;
    }
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}
