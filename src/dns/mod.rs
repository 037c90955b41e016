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

//! DNS data: TTLs, RR types, and the [`Domain`], [`Zone`], and
//! [`ZoneRegistry`] structures that collect generated records and
//! render them as master files.

mod domain;
mod error;
mod reverse;
mod rr_type;
mod tree;
mod ttl;
mod zone;

pub use domain::{Domain, PrintOptions, Record, Rrset, RrsetList};
pub use error::Error;
pub use reverse::reverse_name;
pub use rr_type::Type;
pub use ttl::Ttl;
pub use zone::{Zone, ZoneRegistry};
