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

//! The [`Thing`] structure, which carries the attributes shared by
//! every named entity in the database, and [`Provenance`], which
//! records where an entity was defined.
//!
//! Entities do not inherit from `Thing`; they embed one by value and
//! expose it through the [`AsThing`] trait. That trait is also what
//! [`Registry`](crate::registry::Registry) requires of its contents.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dns::Ttl;

mod tags;
pub use tags::{TagError, TagSet};

////////////////////////////////////////////////////////////////////////
// PROVENANCE                                                         //
////////////////////////////////////////////////////////////////////////

/// The origin of a definition: a source identifier (normally a file
/// name), plus a line number and/or a record path within that source
/// when the document loader knows them.
///
/// Provenance is captured when a record is constructed and carried
/// immutably from then on, so error messages never need to consult
/// the source document again.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    source: String,
    line: Option<u32>,
    record: Option<String>,
}

impl Provenance {
    /// Creates a `Provenance` naming only its source.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            line: None,
            record: None,
        }
    }

    /// Returns a copy of this `Provenance` with the line number set.
    pub fn at_line(&self, line: u32) -> Self {
        Self {
            line: Some(line),
            ..self.clone()
        }
    }

    /// Returns a copy of this `Provenance` with the record path set.
    pub fn at_record(&self, record: impl Into<String>) -> Self {
        Self {
            record: Some(record.into()),
            ..self.clone()
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn line(&self) -> Option<u32> {
        self.line
    }

    pub fn record(&self) -> Option<&str> {
        self.record.as_deref()
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.source.is_empty() {
            f.write_str("<unknown>")?;
        } else {
            f.write_str(&self.source)?;
        }
        if let Some(line) = self.line {
            write!(f, ":{}", line)?;
        }
        if let Some(ref record) = self.record {
            write!(f, " [{}]", record)?;
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////
// THINGS                                                             //
////////////////////////////////////////////////////////////////////////

/// The attributes common to all named entities: a name, the
/// [`Provenance`] of its definition, a free-text description, a TTL
/// (which may be unset, in which case an enclosing scope's TTL
/// applies), and a [`TagSet`].
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Thing {
    name: String,
    provenance: Provenance,
    description: Option<String>,
    ttl: Option<Ttl>,
    tags: TagSet,
}

impl Thing {
    pub fn new(name: impl Into<String>, provenance: Provenance) -> Self {
        Self {
            name: name.into(),
            provenance,
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    pub fn ttl(&self) -> Option<Ttl> {
        self.ttl
    }

    pub fn set_ttl(&mut self, ttl: Option<Ttl>) {
        self.ttl = ttl;
    }

    /// Sets the TTL to `ttl` unless one is already set. This is how a
    /// TTL is inherited from an enclosing scope.
    pub fn inherit_ttl(&mut self, ttl: Option<Ttl>) {
        if self.ttl.is_none() {
            self.ttl = ttl;
        }
    }

    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    pub fn tags_mut(&mut self) -> &mut TagSet {
        &mut self.tags
    }
}

/// Access to the [`Thing`] embedded in an entity.
///
/// The provided methods forward to the embedded `Thing`, so an entity
/// can be named, located, and tag-filtered without knowing its type.
pub trait AsThing {
    fn thing(&self) -> &Thing;

    fn thing_mut(&mut self) -> &mut Thing;

    fn name(&self) -> &str {
        self.thing().name()
    }

    fn provenance(&self) -> &Provenance {
        self.thing().provenance()
    }

    fn description(&self) -> Option<&str> {
        self.thing().description()
    }

    fn ttl(&self) -> Option<Ttl> {
        self.thing().ttl()
    }

    fn tags(&self) -> &TagSet {
        self.thing().tags()
    }
}

impl AsThing for Thing {
    fn thing(&self) -> &Thing {
        self
    }

    fn thing_mut(&mut self) -> &mut Thing {
        self
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
