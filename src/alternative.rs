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

//! Alternatives: labeled switches that select which of several sets of
//! DNS facts is active.
//!
//! An [`Alternative`] has a fixed set of allowed states and one current
//! state. Facts (host addresses, aliases, and raw records) can be bound
//! to one state of one alternative with a `label:state` selector; such
//! a fact is rendered as an active record only while the alternative is
//! in that state, and commented out otherwise. Facts not bound to any
//! alternative are always active.

use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::dns::{Ttl, Type};
use crate::registry::{DuplicateName, Registry};
use crate::thing::{AsThing, Provenance, Thing};

////////////////////////////////////////////////////////////////////////
// MAPPINGS                                                           //
////////////////////////////////////////////////////////////////////////

/// A fact that can be bound to the state of an [`Alternative`].
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum Mapping {
    /// An address of a host.
    Address { host: String, address: IpAddr },
    /// An alias (CNAME) pointing at a host.
    Alias { host: String, alias: String },
    /// A raw record owned by a host.
    Record {
        host: String,
        rr_type: Type,
        rdata: String,
    },
}

impl fmt::Display for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::Address {
                ref host,
                ref address,
            } => write!(f, "address {} of {}", address, host),
            Self::Alias {
                ref host,
                ref alias,
            } => write!(f, "alias {} of {}", alias, host),
            Self::Record {
                ref host,
                rr_type,
                ref rdata,
            } => write!(f, "{} record \"{}\" of {}", rr_type, rdata, host),
        }
    }
}

////////////////////////////////////////////////////////////////////////
// ALTERNATIVES                                                       //
////////////////////////////////////////////////////////////////////////

/// A labeled switch with a finite set of allowed states.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    thing: Thing,
    states: Vec<String>,
    state: String,
    mappings: BTreeMap<String, Vec<Mapping>>,
}

impl Alternative {
    /// Creates an `Alternative` in the first of its allowed states.
    pub fn new(label: &str, states: &[String], provenance: Provenance) -> Result<Self, Error> {
        let mut unique: Vec<String> = Vec::new();
        for state in states {
            if !unique.contains(state) {
                unique.push(state.clone());
            }
        }
        let state = match unique.first() {
            Some(state) => state.clone(),
            None => return Err(Error::NoStates(label.to_owned())),
        };
        Ok(Self {
            thing: Thing::new(label, provenance),
            states: unique,
            state,
            mappings: BTreeMap::new(),
        })
    }

    pub fn states(&self) -> &[String] {
        &self.states
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    /// Switches to `state`, returning the previous state.
    pub fn set_state(&mut self, state: &str) -> Result<String, Error> {
        if !self.states.iter().any(|s| s == state) {
            return Err(self.unknown_state(state));
        }
        Ok(std::mem::replace(&mut self.state, state.to_owned()))
    }

    /// Returns whether `state` is the current state, or `None` if it is
    /// not an allowed state.
    pub fn check_state(&self, state: &str) -> Option<bool> {
        if self.states.iter().any(|s| s == state) {
            Some(self.state == state)
        } else {
            None
        }
    }

    /// Binds `mapping` to `state`. A mapping can be bound only once per
    /// alternative; a second binding indicates a bug in the loader.
    pub fn add_mapping(&mut self, state: &str, mapping: Mapping) -> Result<(), Error> {
        if self.check_state(state).is_none() {
            return Err(self.unknown_state(state));
        }
        if let Some(existing) = self.find_mapping(&mapping) {
            return Err(Error::DuplicateMapping {
                label: self.name().to_owned(),
                state: existing.to_owned(),
                mapping: mapping.to_string(),
            });
        }
        self.mappings
            .entry(state.to_owned())
            .or_default()
            .push(mapping);
        Ok(())
    }

    /// Returns the state `mapping` is bound to, if any.
    pub fn find_mapping(&self, mapping: &Mapping) -> Option<&str> {
        self.mappings
            .iter()
            .find(|(_, mappings)| mappings.contains(mapping))
            .map(|(state, _)| state.as_str())
    }

    /// Returns the mappings bound to `state`.
    pub fn mappings(&self, state: &str) -> &[Mapping] {
        self.mappings.get(state).map(Vec::as_slice).unwrap_or(&[])
    }

    fn unknown_state(&self, state: &str) -> Error {
        Error::UnknownState {
            label: self.name().to_owned(),
            state: state.to_owned(),
            allowed: self.states.join(", "),
        }
    }
}

impl AsThing for Alternative {
    fn thing(&self) -> &Thing {
        &self.thing
    }

    fn thing_mut(&mut self) -> &mut Thing {
        &mut self.thing
    }
}

////////////////////////////////////////////////////////////////////////
// ALTERNATIVE REGISTRY                                               //
////////////////////////////////////////////////////////////////////////

/// How a fact bound with [`AlternativeRegistry::bind`] is rendered.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Binding {
    /// Whether the fact's record is active.
    pub active: bool,
    /// The alternative's TTL override, if it has one.
    pub ttl: Option<Ttl>,
}

/// The collection of all [`Alternative`]s.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct AlternativeRegistry {
    alternatives: Registry<Alternative>,
}

impl AlternativeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, alternative: Alternative) -> Result<&mut Alternative, Error> {
        Ok(self.alternatives.add(alternative)?)
    }

    pub fn lookup(&self, label: &str) -> Option<&Alternative> {
        self.alternatives.lookup(label)
    }

    pub fn lookup_mut(&mut self, label: &str) -> Option<&mut Alternative> {
        self.alternatives.lookup_mut(label)
    }

    pub fn iter(&self) -> std::slice::Iter<Alternative> {
        self.alternatives.iter()
    }

    pub fn len(&self) -> usize {
        self.alternatives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alternatives.is_empty()
    }

    /// Finds the alternative and state that `mapping` is bound to.
    pub fn find_mapping(&self, mapping: &Mapping) -> Option<(&Alternative, &str)> {
        self.alternatives
            .iter()
            .find_map(|alt| alt.find_mapping(mapping).map(|state| (alt, state)))
    }

    /// Returns whether `mapping` is currently active: either it is bound
    /// to the current state of its alternative, or it is not bound at
    /// all.
    pub fn is_active(&self, mapping: &Mapping) -> bool {
        match self.find_mapping(mapping) {
            Some((alt, state)) => alt.state() == state,
            None => true,
        }
    }

    /// Binds `mapping` to the state named by the selector `when`
    /// (`label:state`), returning how the fact should be rendered.
    pub fn bind(&mut self, when: &str, mapping: Mapping) -> Result<Binding, Error> {
        let (label, state) = parse_selector(when)?;
        let alternative = match self.alternatives.lookup_mut(label) {
            Some(alternative) => alternative,
            None => return Err(Error::UnknownAlternative(label.to_owned())),
        };
        alternative.add_mapping(state, mapping)?;
        Ok(Binding {
            active: alternative.state() == state,
            ttl: alternative.ttl(),
        })
    }
}

/// Splits a `label:state` selector.
pub fn parse_selector(when: &str) -> Result<(&str, &str), Error> {
    match when.split_once(':') {
        Some((label, state)) if !label.trim().is_empty() && !state.trim().is_empty() => {
            Ok((label.trim(), state.trim()))
        }
        _ => Err(Error::MalformedSelector(when.to_owned())),
    }
}

////////////////////////////////////////////////////////////////////////
// ERRORS                                                             //
////////////////////////////////////////////////////////////////////////

/// Errors that arise when defining and using alternatives.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    NoStates(String),
    UnknownAlternative(String),
    UnknownState {
        label: String,
        state: String,
        allowed: String,
    },
    MalformedSelector(String),
    DuplicateMapping {
        label: String,
        state: String,
        mapping: String,
    },
    Duplicate(DuplicateName),
}

impl Error {
    /// Returns whether the error indicates a bug rather than a problem
    /// with the data.
    pub fn is_bug(&self) -> bool {
        matches!(self, Self::DuplicateMapping { .. })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::NoStates(ref label) => {
                write!(f, "the alternative {} has no allowed states", label)
            }
            Self::UnknownAlternative(ref label) => {
                write!(f, "there is no alternative named {}", label)
            }
            Self::UnknownState {
                ref label,
                ref state,
                ref allowed,
            } => write!(
                f,
                "{} is not a state of the alternative {} (allowed: {})",
                state, label, allowed,
            ),
            Self::MalformedSelector(ref when) => write!(
                f,
                "\"{}\" is not a valid alternative selector (expected label:state)",
                when,
            ),
            Self::DuplicateMapping {
                ref label,
                ref state,
                ref mapping,
            } => write!(
                f,
                "the {} is already bound to state {} of the alternative {}",
                mapping, state, label,
            ),
            Self::Duplicate(ref e) => e.fmt(f),
        }
    }
}

impl From<DuplicateName> for Error {
    fn from(error: DuplicateName) -> Self {
        Self::Duplicate(error)
    }
}

impl std::error::Error for Error {}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn states(list: &[&str]) -> Vec<String> {
        list.iter().map(|&s| s.to_owned()).collect()
    }

    fn address(host: &str, ip: &str) -> Mapping {
        Mapping::Address {
            host: host.into(),
            address: ip.parse().unwrap(),
        }
    }

    #[test]
    fn mapping_under_inactive_state_is_inactive_until_switched() {
        let mut registry = AlternativeRegistry::new();
        let mut foo = Alternative::new("foo", &states(&["bar", "baz"]), Provenance::new("test")).unwrap();
        assert_eq!(foo.set_state("bar").unwrap(), "bar");
        registry.add(foo).unwrap();

        let mapping = address("www.example.", "10.0.0.5");
        let binding = registry.bind("foo:baz", mapping.clone()).unwrap();
        assert!(!binding.active);
        assert_eq!(registry.lookup("foo").unwrap().check_state("bar"), Some(true));
        assert_eq!(registry.lookup("foo").unwrap().check_state("baz"), Some(false));
        assert_eq!(registry.lookup("foo").unwrap().check_state("qux"), None);
        assert!(!registry.is_active(&mapping));
        assert!(registry.is_active(&address("www.example.", "10.0.0.6")));

        let previous = registry.lookup_mut("FOO").unwrap().set_state("baz").unwrap();
        assert_eq!(previous, "bar");
        assert!(registry.is_active(&mapping));
        let (alt, state) = registry.find_mapping(&mapping).unwrap();
        assert_eq!((alt.name(), state), ("foo", "baz"));
    }

    #[test]
    fn state_errors() {
        assert_eq!(
            Alternative::new("empty", &[], Provenance::new("test")),
            Err(Error::NoStates("empty".into()))
        );
        let mut alt = Alternative::new("foo", &states(&["a", "b", "a"]), Provenance::new("test")).unwrap();
        assert_eq!(alt.states(), ["a", "b"]);
        assert_eq!(alt.state(), "a");
        assert!(matches!(alt.set_state("c"), Err(Error::UnknownState { .. })));
        assert!(matches!(
            alt.add_mapping("c", address("h.", "10.0.0.1")),
            Err(Error::UnknownState { .. })
        ));
    }

    #[test]
    fn duplicate_mapping_is_a_bug() {
        let mut registry = AlternativeRegistry::new();
        registry
            .add(Alternative::new("site", &states(&["a", "b"]), Provenance::new("test")).unwrap())
            .unwrap();
        let alias = Mapping::Alias {
            host: "h.example.".into(),
            alias: "www.example.".into(),
        };
        registry.bind("site:a", alias.clone()).unwrap();
        let error = registry.bind("site:b", alias).unwrap_err();
        assert!(error.is_bug());
        assert!(matches!(error, Error::DuplicateMapping { ref state, .. } if state == "a"));
    }

    #[test]
    fn selectors_are_validated() {
        let mut registry = AlternativeRegistry::new();
        assert_eq!(parse_selector(" site : a ").unwrap(), ("site", "a"));
        assert!(matches!(
            registry.bind("site", address("h.", "10.0.0.1")),
            Err(Error::MalformedSelector(_))
        ));
        assert!(matches!(
            registry.bind("site:a", address("h.", "10.0.0.1")),
            Err(Error::UnknownAlternative(_))
        ));
    }
}
