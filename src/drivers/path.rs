//! Driver path parsing
//!
//! A path is dot-separated field names, each optionally followed by zero-based
//! `[index]` subscripts: `customers.segments[0].volume.growth_rate`.

use super::OverlayError;
use std::fmt;
use std::str::FromStr;

/// One step of a driver path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

/// A parsed driver path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverPath {
    raw: String,
    segments: Vec<PathSegment>,
}

impl DriverPath {
    pub fn parse(path: &str) -> Result<Self, OverlayError> {
        let malformed = |reason: String| OverlayError::MalformedPath {
            path: path.to_string(),
            reason,
        };

        if path.is_empty() {
            return Err(malformed("path is empty".into()));
        }

        let mut segments = Vec::new();
        for part in path.split('.') {
            let (name, mut rest) = match part.find('[') {
                Some(i) => part.split_at(i),
                None => (part, ""),
            };

            if name.is_empty() {
                return Err(malformed(format!("empty field name in '{}'", part)));
            }
            if name.contains(']') {
                return Err(malformed(format!("unexpected ']' in '{}'", part)));
            }
            segments.push(PathSegment::Field(name.to_string()));

            while !rest.is_empty() {
                let close = rest
                    .find(']')
                    .ok_or_else(|| malformed(format!("unclosed '[' in '{}'", part)))?;
                let digits = &rest[1..close];
                let index = digits
                    .parse::<usize>()
                    .map_err(|_| malformed(format!("invalid index '[{}]' in '{}'", digits, part)))?;
                segments.push(PathSegment::Index(index));

                rest = &rest[close + 1..];
                if !rest.is_empty() && !rest.starts_with('[') {
                    return Err(malformed(format!("unexpected '{}' after index in '{}'", rest, part)));
                }
            }
        }

        Ok(Self {
            raw: path.to_string(),
            segments,
        })
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Render the first `len` segments, for error messages
    pub(crate) fn prefix(&self, len: usize) -> String {
        let mut out = String::new();
        for segment in self.segments.iter().take(len) {
            match segment {
                PathSegment::Field(name) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(name);
                }
                PathSegment::Index(i) => {
                    out.push_str(&format!("[{}]", i));
                }
            }
        }
        out
    }
}

impl FromStr for DriverPath {
    type Err = OverlayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DriverPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
