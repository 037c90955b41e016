// Copyright 2022 Matthew Ingwersen.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! Implementation of the [`Registry`] container.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::thing::{AsThing, Provenance};
use crate::util::name_key;

/// A container of named entities whose names are unique, compared
/// ASCII-case-insensitively.
///
/// Entities are kept in insertion order. [`Registry::iter`] is a cheap,
/// restartable view of the contents in that order, while
/// [`Registry::sorted_by`] materializes a stably sorted list (ties keep
/// insertion order).
///
/// A `Registry` serializes as the list of its entities. The name index
/// is rebuilt when it is deserialized.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Registry<T> {
    items: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: AsThing> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `item` to the `Registry`, returning a reference to it in its
    /// new home. This fails if an entity with the same (lower-cased)
    /// name is already present; the error carries the provenance of
    /// both definitions.
    pub fn add(&mut self, item: T) -> Result<&mut T, DuplicateName> {
        let key = name_key(item.name());
        if let Some(&existing) = self.index.get(&key) {
            return Err(DuplicateName {
                name: item.name().to_owned(),
                first: self.items[existing].provenance().clone(),
                duplicate: item.provenance().clone(),
            });
        }
        let position = self.items.len();
        self.index.insert(key, position);
        self.items.push(item);
        Ok(&mut self.items[position])
    }

    /// Looks up an entity by name, case-insensitively.
    pub fn lookup(&self, name: &str) -> Option<&T> {
        self.index.get(&name_key(name)).map(|&i| &self.items[i])
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut T> {
        match self.index.get(&name_key(name)) {
            Some(&i) => Some(&mut self.items[i]),
            None => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&name_key(name))
    }

    /// Returns a list of the entities sorted by `compare`. The sort is
    /// stable, so entities that compare equal stay in insertion order.
    pub fn sorted_by<F>(&self, mut compare: F) -> Vec<&T>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let mut sorted: Vec<&T> = self.items.iter().collect();
        sorted.sort_by(|a, b| compare(a, b));
        sorted
    }
}

impl<T> Registry<T> {
    /// Returns an iterator over the entities in insertion order.
    pub fn iter(&self) -> std::slice::Iter<T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<T> {
        self.items.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the entity at insertion position `position`.
    pub(crate) fn get(&self, position: usize) -> Option<&T> {
        self.items.get(position)
    }

    pub(crate) fn get_mut(&mut self, position: usize) -> Option<&mut T> {
        self.items.get_mut(position)
    }
}

impl<'a, T> IntoIterator for &'a Registry<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Serialize> Serialize for Registry<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.items.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Registry<T>
where
    T: AsThing + Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut registry = Self::new();
        for item in Vec::<T>::deserialize(deserializer)? {
            registry.add(item).map_err(de::Error::custom)?;
        }
        Ok(registry)
    }
}

/// The error returned when a name is registered twice.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DuplicateName {
    pub name: String,
    pub first: Provenance,
    pub duplicate: Provenance,
}

impl fmt::Display for DuplicateName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "the name {} is already defined (first definition at {})",
            self.name, self.first,
        )
    }
}

impl std::error::Error for DuplicateName {}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
