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

//! Soft issues found while loading a database.
//!
//! Structural and referential problems abort a load with an
//! [`Error`](crate::ipam::Error). Everything else is a [`Warning`]: it
//! is logged when it is found and collected in a [`Diagnostics`]
//! accumulator, so that callers can also report it once the load has
//! finished.

use std::fmt;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::dns::{Ttl, Type};
use crate::thing::Provenance;

////////////////////////////////////////////////////////////////////////
// WARNINGS                                                           //
////////////////////////////////////////////////////////////////////////

/// A soft issue. Loading continues after a warning.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Warning {
    /// Records of one RRset were given different TTLs; the smaller one
    /// was kept.
    TtlMismatch {
        owner: String,
        rr_type: Type,
        kept: Ttl,
        ignored: Ttl,
        at: Provenance,
    },
    /// An IID was defined but never used to synthesize an address.
    UnusedIid { name: String, at: Provenance },
    /// A host following the `<name>-admin` convention has no `<name>`
    /// counterpart.
    MissingAdminTarget {
        host: String,
        expected: String,
        at: Provenance,
    },
    /// A host was defined without any addresses.
    HostWithoutAddresses { host: String, at: Provenance },
}

impl Warning {
    /// Returns the provenance of the definition the warning is about.
    pub fn provenance(&self) -> &Provenance {
        match *self {
            Self::TtlMismatch { ref at, .. }
            | Self::UnusedIid { ref at, .. }
            | Self::MissingAdminTarget { ref at, .. }
            | Self::HostWithoutAddresses { ref at, .. } => at,
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::TtlMismatch {
                ref owner,
                rr_type,
                kept,
                ignored,
                ref at,
            } => write!(
                f,
                "{}: TTL {} for the {} RRset at {} differs from the RRset's TTL; using {}",
                at, ignored, rr_type, owner, kept,
            ),
            Self::UnusedIid { ref name, ref at } => {
                write!(f, "{}: the IID {} is never used", at, name)
            }
            Self::MissingAdminTarget {
                ref host,
                ref expected,
                ref at,
            } => write!(
                f,
                "{}: the host {} has no corresponding host {}",
                at, host, expected,
            ),
            Self::HostWithoutAddresses { ref host, ref at } => {
                write!(f, "{}: the host {} has no addresses", at, host)
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////
// ACCUMULATOR                                                        //
////////////////////////////////////////////////////////////////////////

/// Collects [`Warning`]s during a load.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `warning`, also writing it to the log.
    pub fn warn(&mut self, warning: Warning) {
        warn!("{}", warning);
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }
}
