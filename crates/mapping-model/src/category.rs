use serde::{Deserialize, Serialize};
use std::fmt;

/// The four parallel mapping domains. The class filter is not a category:
/// filter nodes attach *onto* source nodes of any category (see
/// [`crate::node::NodeKind::ClassFilter`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    PropertySet,
    Property,
    Quantity,
    Classification,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::PropertySet,
        Category::Property,
        Category::Quantity,
        Category::Classification,
    ];

    /// Short prefix used in node and edge ids.
    pub fn prefix(self) -> &'static str {
        match self {
            Category::PropertySet => "pset",
            Category::Property => "property",
            Category::Quantity => "quantity",
            Category::Classification => "classification",
        }
    }

    /// Region header title.
    pub fn title(self) -> &'static str {
        match self {
            Category::PropertySet => "Property Set Mapping",
            Category::Property => "Property Mapping",
            Category::Quantity => "Quantity Mapping",
            Category::Classification => "Classification Mapping",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Which side of a mapping a node sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Source,
    Target,
}

impl Role {
    pub fn prefix(self) -> &'static str {
        match self {
            Role::Source => "source",
            Role::Target => "target",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// The classification category has exactly one logical target slot; its
/// business identifier is this fixed literal.
pub const CLASSIFICATION_TARGET_ID: &str = "classification";
