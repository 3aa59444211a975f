use core::fmt;
use std::ops::Index;

use anyhow::Context;
use indexmap::{IndexMap, map::Entry};
use serde::Deserialize;

use crate::resource::{ResId, Resource};

/// The working set of resources, iterated in insertion order.
#[derive(Clone, Default)]
pub struct ResourceMap {
    resources: IndexMap<ResId, Resource>,
}

impl fmt::Debug for ResourceMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.resources.values()).finish()
    }
}

impl fmt::Display for ResourceMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for resource in self.iter() {
            if self.len() > 1 {
                writeln!(f, "---")?;
            }
            let yaml = serde_yaml::to_string(resource).map_err(|_| fmt::Error)?;
            write!(f, "{yaml}")?;
        }

        Ok(())
    }
}

impl ResourceMap {
    /// Parses a stream of YAML documents, skipping empty ones.
    pub fn from_yaml_str(s: &str) -> anyhow::Result<Self> {
        let mut resources = ResourceMap::default();
        for (i, document) in serde_yaml::Deserializer::from_str(s).enumerate() {
            let value = serde_json::Value::deserialize(document)
                .with_context(|| format!("parsing yaml document {i}"))?;
            if value.is_null() {
                continue;
            }

            let resource = Resource::from_value(value)
                .with_context(|| format!("parsing yaml document {i}"))?;
            resources.insert(resource)?;
        }

        Ok(resources)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn insert(&mut self, resource: Resource) -> Result<(), Conflict> {
        match self.resources.entry(resource.id().clone()) {
            Entry::Occupied(_) => Err(Conflict { resource }),
            Entry::Vacant(entry) => {
                entry.insert(resource);
                Ok(())
            }
        }
    }

    pub fn contains(&self, id: &ResId) -> bool {
        self.resources.contains_key(id)
    }

    /// Removes a resource, preserving the order of the remaining ones.
    pub fn remove(&mut self, id: &ResId) -> Option<Resource> {
        self.resources.shift_remove(id)
    }

    pub fn ids(&self) -> impl ExactSizeIterator<Item = &ResId> + DoubleEndedIterator {
        self.resources.keys()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Resource> + DoubleEndedIterator {
        self.resources.values()
    }

    /// In-place merge of two `ResourceMap`s, any conflicting resources will be an error
    pub fn merge(&mut self, other: ResourceMap) -> Result<(), Conflict> {
        for (_, resource) in other.resources {
            self.insert(resource)?;
        }
        Ok(())
    }
}

impl Index<&ResId> for ResourceMap {
    type Output = Resource;

    fn index(&self, id: &ResId) -> &Self::Output {
        self.resources
            .get(id)
            .unwrap_or_else(|| panic!("resource with id `{id}` not in ResourceMap"))
    }
}

impl<'a> IntoIterator for &'a ResourceMap {
    type Item = &'a Resource;
    type IntoIter = indexmap::map::Values<'a, ResId, Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.resources.values()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub resource: Resource,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "may not add resource with an already registered id `{}`",
            self.resource.id()
        )
    }
}

impl std::error::Error for Conflict {}
