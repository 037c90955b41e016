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

//! An IP address management (IPAM) database.
//!
//! The database describes an address map of nested prefixes, the
//! networks built on its stub prefixes, the hosts within those networks,
//! and the DNS zones their records are published in. It is loaded from
//! a [`source::Document`] in a single pass by [`ipam::Ipam::load`],
//! which checks the data for consistency and builds the zones' records
//! as it goes. The loaded [`ipam::Ipam`] is then read-only: it can be
//! queried (see [`query`]), cached (see [`snapshot`]), and exported as
//! master-file fragments (see [`export`]).

pub mod addr;
pub mod alternative;
pub mod diag;
pub mod dns;
pub mod export;
pub mod iid;
pub mod ipam;
pub mod network;
pub mod query;
pub mod registry;
pub mod snapshot;
pub mod source;
pub mod thing;
mod util;
