//! Topological relations between model objects.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a relation between two objects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationType {
    #[default]
    Default,
    Bypass,
    Spill,
}

impl RelationType {
    pub const ALL: [RelationType; 3] = [Self::Default, Self::Bypass, Self::Spill];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Bypass => "bypass",
            Self::Spill => "spill",
        }
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction in which a relation query looks from the queried object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationDirection {
    #[default]
    Both,
    Input,
    Output,
}

impl RelationDirection {
    pub const ALL: [RelationDirection; 3] = [Self::Both, Self::Input, Self::Output];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Both => "both",
            Self::Input => "input",
            Self::Output => "output",
        }
    }
}

impl fmt::Display for RelationDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies one engine object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    pub object_type: String,
    pub object_name: String,
}

impl ObjectRef {
    pub fn new(object_type: impl Into<String>, object_name: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            object_name: object_name.into(),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.object_type, self.object_name)
    }
}

/// An edge between two objects as reported by, or submitted to, the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub from: String,
    pub from_type: String,
    pub to: String,
    pub to_type: String,
    #[serde(default)]
    pub relation_type: RelationType,
    #[serde(default)]
    pub relation_direction: RelationDirection,
}

impl Connection {
    /// A default-typed connection in direction `both`.
    pub fn new(from: &ObjectRef, to: &ObjectRef) -> Self {
        Self {
            from: from.object_name.clone(),
            from_type: from.object_type.clone(),
            to: to.object_name.clone(),
            to_type: to.object_type.clone(),
            relation_type: RelationType::Default,
            relation_direction: RelationDirection::Both,
        }
    }

    #[must_use]
    pub fn with_relation(mut self, relation_type: RelationType, direction: RelationDirection) -> Self {
        self.relation_type = relation_type;
        self.relation_direction = direction;
        self
    }

    pub fn from_ref(&self) -> ObjectRef {
        ObjectRef::new(&self.from_type, &self.from)
    }

    pub fn to_ref(&self) -> ObjectRef {
        ObjectRef::new(&self.to_type, &self.to)
    }
}
