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

//! Implementation of the [`Error`] type for DNS-data errors.

use std::fmt;

use super::Type;
use crate::registry::DuplicateName;
use crate::thing::Provenance;

/// Errors that arise when adding records to a
/// [`Domain`](super::Domain) or [`ZoneRegistry`](super::ZoneRegistry).
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// A CNAME record was added at a zone apex.
    CnameAtApex { owner: String },

    /// A second CNAME record was added for a name.
    DuplicateCname { owner: String, first: Provenance },

    /// A CNAME record and a record of another type were both added for
    /// a name. `existing` is the type that was there first.
    CnameConflict {
        owner: String,
        rr_type: Type,
        existing: Type,
        first: Provenance,
    },

    /// No registered zone contains the owner name.
    NotInAnyZone(String),

    /// A zone was registered twice.
    Duplicate(DuplicateName),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::CnameAtApex { ref owner } => {
                write!(f, "{} is a zone apex and cannot own a CNAME record", owner)
            }
            Self::DuplicateCname {
                ref owner,
                ref first,
            } => write!(
                f,
                "{} already has a CNAME record (defined at {})",
                owner, first,
            ),
            Self::CnameConflict {
                ref owner,
                rr_type,
                existing,
                ref first,
            } => write!(
                f,
                "cannot add a {} record to {}, which already has a {} record (defined at {}); \
                 a name with a CNAME record cannot have other records",
                rr_type, owner, existing, first,
            ),
            Self::NotInAnyZone(ref name) => {
                write!(f, "{} is not within any configured zone", name)
            }
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
