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

//! The loaded database and the load pass that builds it.
//!
//! An [`Ipam`] is built once from a [`Document`] by [`Ipam::load`] and
//! is read-only afterward. Every registry it holds is plain data, so a
//! loaded `Ipam` can be serialized as a whole (see
//! [`crate::snapshot`]) and reconstructed without loading again.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::addr::AddressMap;
use crate::alternative::AlternativeRegistry;
use crate::diag::Warning;
use crate::dns::{Ttl, ZoneRegistry};
use crate::iid::IidRegistry;
use crate::network::{Host, Network};
use crate::registry::Registry;
use crate::source::Document;
use crate::thing::Provenance;
use crate::util::{fqdn, name_key};

mod error;
mod generate;
mod load;
mod reserve;

pub use error::{Error, ErrorKind};

/// The default TTL of zones that do not set one.
pub const DEFAULT_TTL: u32 = 3600;

/// Options for [`Ipam::load_with`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LoadOptions {
    /// The TTL of zones that do not set one.
    pub default_ttl: Ttl,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            default_ttl: Ttl::from(DEFAULT_TTL),
        }
    }
}

/// What a host or alias name belongs to.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum NameOwner {
    Host { network: String },
    Alias { network: String, host: String },
}

/// A fully loaded database.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Ipam {
    zones: ZoneRegistry,
    map: AddressMap,
    iids: IidRegistry,
    alternatives: AlternativeRegistry,
    networks: Registry<Network>,
    names: BTreeMap<String, (NameOwner, Provenance)>,
    warnings: Vec<Warning>,
}

impl Ipam {
    /// Loads `document` with the default [`LoadOptions`].
    pub fn load(document: &Document) -> Result<Self, Error> {
        Self::load_with(document, &LoadOptions::default())
    }

    /// Runs the load pass over `document`. The load aborts at the first
    /// fatal error; soft issues are logged and kept (see
    /// [`Ipam::warnings`]).
    pub fn load_with(document: &Document, options: &LoadOptions) -> Result<Self, Error> {
        load::Loader::new(options).run(document)
    }

    pub fn zones(&self) -> &ZoneRegistry {
        &self.zones
    }

    pub fn map(&self) -> &AddressMap {
        &self.map
    }

    pub fn iids(&self) -> &IidRegistry {
        &self.iids
    }

    pub fn alternatives(&self) -> &AlternativeRegistry {
        &self.alternatives
    }

    pub fn networks(&self) -> &Registry<Network> {
        &self.networks
    }

    /// Returns the soft issues found while loading.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn network(&self, name: &str) -> Option<&Network> {
        self.networks.lookup(name)
    }

    /// Returns what the host or alias name `name` belongs to.
    pub fn name_owner(&self, name: &str) -> Option<&NameOwner> {
        self.names.get(&name_key(&fqdn(name))).map(|(owner, _)| owner)
    }

    /// Finds a host by its name.
    pub fn host(&self, name: &str) -> Option<&Host> {
        match self.name_owner(name)? {
            NameOwner::Host { network } => self.network(network)?.find_host(name),
            NameOwner::Alias { .. } => None,
        }
    }

    /// Finds the host that has the alias `name`.
    pub fn alias_owner(&self, name: &str) -> Option<&Host> {
        match self.name_owner(name)? {
            NameOwner::Alias { network, host } => self.network(network)?.find_host(host),
            NameOwner::Host { .. } => None,
        }
    }

    /// Returns every host of every network, in load order.
    pub fn hosts(&self) -> impl Iterator<Item = &Host> {
        self.networks
            .iter()
            .flat_map(|network| network.hosts().iter())
    }
}

