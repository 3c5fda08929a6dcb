use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of object a reference points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReferenceType {
    Location,
    Zone,
    ConstructionInstance,
    EmbeddedObject,
    Network,
    Schedule,
    Model,
}

impl fmt::Display for ReferenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Location => "Location",
            Self::Zone => "Zone",
            Self::ConstructionInstance => "ConstructionInstance",
            Self::EmbeddedObject => "EmbeddedObject",
            Self::Network => "Network",
            Self::Schedule => "Schedule",
            Self::Model => "Model",
        };
        f.write_str(name)
    }
}

/// What the index keys of a vector-valued quantity refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IndexKeyType {
    /// Keys are plain positions.
    #[default]
    Index,
    /// Keys are object IDs (for example zone IDs).
    ModelId,
}

/// A quantity name with an optional vector index.
///
/// For vector-valued quantities the index is the ID of the element (for
/// example a zone ID). `None` addresses a scalar or the vector as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct QuantityName {
    pub name: String,
    #[serde(default)]
    pub index: Option<u32>,
}

impl QuantityName {
    /// Creates a scalar quantity name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            index: None,
        }
    }

    /// Creates a quantity name addressing one vector element.
    pub fn indexed(name: impl Into<String>, index: u32) -> Self {
        Self {
            name: name.into(),
            index: Some(index),
        }
    }
}

impl fmt::Display for QuantityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "{}[{index}]", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// A reference to a quantity that a model requires as input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputReference {
    /// ID of the referenced object.
    pub id: u32,
    pub reference_type: ReferenceType,
    pub name: QuantityName,
    /// Whether the simulation must fail if the reference cannot be resolved.
    #[serde(default)]
    pub required: bool,
}

impl InputReference {
    /// Creates a required reference to a scalar quantity of an object.
    pub fn new(id: u32, reference_type: ReferenceType, name: impl Into<String>) -> Self {
        Self {
            id,
            reference_type,
            name: QuantityName::new(name),
            required: true,
        }
    }
}

/// Describes a published quantity.
///
/// Vector-valued quantities list their element keys in `index_keys`; for
/// scalars the list is empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QuantityDescription {
    pub id: u32,
    pub name: String,
    pub unit: String,
    pub description: String,
    pub constant: bool,
    pub reference_type: Option<ReferenceType>,
    pub index_key_type: IndexKeyType,
    pub index_keys: Vec<u32>,
}

impl QuantityDescription {
    /// Creates the description of a vector-valued quantity keyed by object IDs.
    pub fn vector(
        name: impl Into<String>,
        unit: impl Into<String>,
        description: impl Into<String>,
        index_keys: Vec<u32>,
    ) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
            description: description.into(),
            index_key_type: IndexKeyType::ModelId,
            index_keys,
            ..Self::default()
        }
    }

    /// Returns `true` if the quantity is vector-valued.
    #[must_use]
    pub fn is_vector(&self) -> bool {
        !self.index_keys.is_empty()
    }
}
