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

//! Implementation of inheritable tag sets.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A set of tags, each of which is either set explicitly or inherited
/// from one or more other entities.
///
/// Each tag maps to the names of the entities it was inherited from; an
/// empty list means the tag was set explicitly. Inheritance must be
/// applied before explicit tags (see [`TagSet::apply`]): an explicit
/// tag that is already inherited is an error, as is removing (with the
/// `!tag` form) a tag that was not inherited.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct TagSet {
    tags: BTreeMap<String, Vec<String>>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inherits every tag of `from`, recording `source` (the name of
    /// the entity `from` belongs to) as the origin.
    pub fn inherit(&mut self, source: &str, from: &TagSet) {
        for tag in from.tags.keys() {
            let sources = self.tags.entry(tag.clone()).or_default();
            if !sources.iter().any(|s| s == source) {
                sources.push(source.to_owned());
            }
        }
    }

    /// Applies an explicit tag entry: `tag` sets a tag, and
    /// `!tag` removes an inherited one.
    pub fn apply(&mut self, entry: &str) -> Result<(), TagError> {
        let entry = entry.trim();
        if let Some(tag) = entry.strip_prefix('!') {
            let tag = normalize(tag)?;
            match self.tags.get(&tag) {
                Some(sources) if !sources.is_empty() => {
                    self.tags.remove(&tag);
                    Ok(())
                }
                _ => Err(TagError::NotInherited(tag)),
            }
        } else {
            let tag = normalize(entry)?;
            match self.tags.get(&tag) {
                Some(sources) if sources.is_empty() => Err(TagError::AlreadySet(tag)),
                Some(sources) => Err(TagError::AlreadyInherited {
                    from: sources.clone(),
                    tag,
                }),
                None => {
                    self.tags.insert(tag, Vec::new());
                    Ok(())
                }
            }
        }
    }

    /// Applies several explicit tag entries in order.
    pub fn apply_all<'a>(&mut self, entries: impl IntoIterator<Item = &'a String>) -> Result<(), TagError> {
        entries.into_iter().try_for_each(|entry| self.apply(entry))
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains_key(&tag.trim().to_ascii_lowercase())
    }

    /// Returns the entities `tag` was inherited from. This is `None` if
    /// the tag is absent and an empty slice if it was set explicitly.
    pub fn sources(&self, tag: &str) -> Option<&[String]> {
        self.tags
            .get(&tag.trim().to_ascii_lowercase())
            .map(Vec::as_slice)
    }

    /// Returns an iterator over the (effective) tags, in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

fn normalize(tag: &str) -> Result<String, TagError> {
    let tag = tag.trim();
    if tag.is_empty() || tag.contains(|c: char| c.is_whitespace() || c == ',' || c == '!') {
        Err(TagError::Invalid(tag.to_owned()))
    } else {
        Ok(tag.to_ascii_lowercase())
    }
}

/// Errors that arise when applying explicit tags to a [`TagSet`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TagError {
    AlreadyInherited { tag: String, from: Vec<String> },
    AlreadySet(String),
    NotInherited(String),
    Invalid(String),
}

impl fmt::Display for TagError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::AlreadyInherited { ref tag, ref from } => write!(
                f,
                "the tag {} is already inherited from {}",
                tag,
                from.join(", "),
            ),
            Self::AlreadySet(ref tag) => write!(f, "the tag {} is set more than once", tag),
            Self::NotInherited(ref tag) => {
                write!(f, "the tag {} cannot be removed: it is not inherited", tag)
            }
            Self::Invalid(ref tag) => write!(f, "\"{}\" is not a valid tag", tag),
        }
    }
}

impl std::error::Error for TagError {}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
