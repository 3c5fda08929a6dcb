use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::ReferenceType;

/// A named, typed, de-duplicated set of object IDs.
///
/// Iteration over [`ObjectList::ids`] is in ascending ID order, which is the
/// order models use when they emit per-object references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectList {
    pub name: String,
    pub reference_type: ReferenceType,
    #[serde(default)]
    pub ids: BTreeSet<u32>,
}

impl ObjectList {
    /// Creates an object list from any collection of IDs.
    pub fn new(
        name: impl Into<String>,
        reference_type: ReferenceType,
        ids: impl IntoIterator<Item = u32>,
    ) -> Self {
        Self {
            name: name.into(),
            reference_type,
            ids: ids.into_iter().collect(),
        }
    }

    /// Returns the index of the list called `name` within `lists`.
    #[must_use]
    pub fn find(lists: &[ObjectList], name: &str) -> Option<usize> {
        lists.iter().position(|list| list.name == name)
    }

    /// Returns the member IDs in iteration order.
    #[must_use]
    pub fn id_vec(&self) -> Vec<u32> {
        self.ids.iter().copied().collect()
    }
}

/// A thermal zone as seen by the models in this workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub id: u32,
    #[serde(default)]
    pub display_name: String,
}

impl Zone {
    #[must_use]
    pub fn new(id: u32) -> Self {
        Self {
            id,
            display_name: String::new(),
        }
    }

    /// Returns the index of the zone with `id` within `zones`.
    #[must_use]
    pub fn find(zones: &[Zone], id: u32) -> Option<usize> {
        zones.iter().position(|zone| zone.id == id)
    }
}
