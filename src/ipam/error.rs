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

//! Implementation of the [`Error`] type for load failures.

use std::fmt;

use crate::thing::{Provenance, TagError};
use crate::{addr, alternative, dns, iid, network};

/// A fatal error that aborted a load, together with the provenance of
/// the record that was being processed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Error {
    at: Provenance,
    kind: ErrorKind,
}

impl Error {
    pub fn new(at: Provenance, kind: ErrorKind) -> Self {
        Self { at, kind }
    }

    pub fn provenance(&self) -> &Provenance {
        &self.at
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns whether the error indicates a bug rather than a problem
    /// with the document.
    pub fn is_bug(&self) -> bool {
        matches!(self.kind, ErrorKind::Bug(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.at, self.kind)
    }
}

impl std::error::Error for Error {}

/// The kinds of [`Error`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Address(addr::Error),
    Network(network::Error),
    Dns(dns::Error),
    Iid(iid::Error),
    Alternative(alternative::Error),
    Tag(TagError),

    /// A network names a prefix id that no stub prefix has.
    UnknownPrefixId { network: String, id: String },

    /// A network names no prefixes.
    NoPrefixes(String),

    /// A host or alias name is already used by another host or alias.
    NameTaken { name: String, first: Provenance },

    /// A host is hosted on a host that does not exist.
    DanglingHostedOn { host: String, target: String },

    /// A host asks for IID-based addresses, but its network has no IPv6
    /// prefix.
    NoIpv6Prefix { host: String, network: String },

    /// A generated-host template would not give each host its own name.
    InvalidTemplate(String),

    /// A range of addresses is too large to enumerate.
    RangeTooLarge(String),

    /// A generated-host block is not within the network.
    BlockOutsideNetwork { block: String, network: String },

    /// An internal invariant was violated.
    Bug(String),
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::Address(ref e) => e.fmt(f),
            Self::Network(ref e) => e.fmt(f),
            Self::Dns(ref e) => e.fmt(f),
            Self::Iid(ref e) => e.fmt(f),
            Self::Alternative(ref e) => e.fmt(f),
            Self::Tag(ref e) => e.fmt(f),
            Self::UnknownPrefixId {
                ref network,
                ref id,
            } => write!(
                f,
                "the network {} refers to the prefix id {}, which no stub prefix has",
                network, id,
            ),
            Self::NoPrefixes(ref network) => {
                write!(f, "the network {} has no prefixes", network)
            }
            Self::NameTaken {
                ref name,
                ref first,
            } => write!(f, "the name {} is already in use (defined at {})", name, first),
            Self::DanglingHostedOn {
                ref host,
                ref target,
            } => write!(
                f,
                "{} is hosted on {}, which is not a known host",
                host, target,
            ),
            Self::NoIpv6Prefix {
                ref host,
                ref network,
            } => write!(
                f,
                "{} uses an interface identifier, but the network {} has no IPv6 prefix",
                host, network,
            ),
            Self::InvalidTemplate(ref template) => write!(
                f,
                "the host name template {} contains neither {{n}} nor {{ip}}",
                template,
            ),
            Self::RangeTooLarge(ref range) => {
                write!(f, "{} has too many addresses to enumerate", range)
            }
            Self::BlockOutsideNetwork {
                ref block,
                ref network,
            } => write!(f, "{} is not within the network {}", block, network),
            Self::Bug(ref message) => write!(f, "BUG: {}", message),
        }
    }
}

macro_rules! impl_from_for_error_kind {
    ($($source:ty => $variant:ident,)*) => {
        $(
            impl From<$source> for ErrorKind {
                fn from(error: $source) -> Self {
                    Self::$variant(error)
                }
            }
        )*
    };
}

impl_from_for_error_kind! {
    addr::Error => Address,
    network::Error => Network,
    dns::Error => Dns,
    iid::Error => Iid,
    TagError => Tag,
}

impl From<alternative::Error> for ErrorKind {
    fn from(error: alternative::Error) -> Self {
        if error.is_bug() {
            Self::Bug(error.to_string())
        } else {
            Self::Alternative(error)
        }
    }
}

/// Attaches a [`Provenance`] to the error of a `Result`, turning it into
/// an [`Error`].
pub(super) trait At<T> {
    fn at(self, at: &Provenance) -> Result<T, Error>;
}

impl<T, E: Into<ErrorKind>> At<T> for Result<T, E> {
    fn at(self, at: &Provenance) -> Result<T, Error> {
        self.map_err(|e| Error::new(at.clone(), e.into()))
    }
}
