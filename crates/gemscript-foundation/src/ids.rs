//! Identifiers for agents and reference paths.
//!
//! [`Path`] names a property on an agent: own props are single-segment
//! (`x`), feature props are namespaced by the feature (`Movement.direction`).
//! [`AgentId`] is the runtime identity handed out at instantiation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A dot-separated reference path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Path {
    /// Ordered segments of the path.
    pub segments: Vec<String>,
}

impl Path {
    /// Creates a new Path from a list of segments.
    pub fn new(segments: Vec<String>) -> Self {
        Self { segments }
    }

    /// Creates a new Path from a dot-separated string.
    pub fn from_path_str(s: &str) -> Self {
        Self {
            segments: s.split('.').map(String::from).collect(),
        }
    }

    /// Path of a property declared by a feature.
    pub fn feature_prop(feature: &str, prop: &str) -> Self {
        Self::new(vec![feature.to_string(), prop.to_string()])
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Get the first segment (feature namespace or own prop name).
    pub fn first(&self) -> Option<&str> {
        self.segments.first().map(String::as_str)
    }

    /// Get the last segment (leaf name).
    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Append a segment to create a new path.
    pub fn append(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self::new(segments)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl From<&str> for Path {
    fn from(s: &str) -> Self {
        Self::from_path_str(s)
    }
}

/// Runtime identity of an agent instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u64);

impl AgentId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_from_str() {
        let path = Path::from("Movement.direction");
        assert_eq!(path.segments(), &["Movement", "direction"]);
        assert_eq!(path.first(), Some("Movement"));
        assert_eq!(path.last(), Some("direction"));
        assert_eq!(path.to_string(), "Movement.direction");
    }

    #[test]
    fn test_feature_prop_matches_parsed() {
        assert_eq!(
            Path::feature_prop("IU", "logStringText"),
            Path::from("IU.logStringText")
        );
    }

    #[test]
    fn test_append() {
        assert_eq!(Path::from("IU").append("logStringText").len(), 2);
    }
}
