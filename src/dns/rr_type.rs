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

//! Provides the [`Type`] structure for DNS RR types.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::util::Caseless;

////////////////////////////////////////////////////////////////////////
// RR TYPES                                                           //
////////////////////////////////////////////////////////////////////////

/// Represents the RR type of a DNS record.
///
/// An RR type is an unsigned 16-bit integer on the wire, so this is a
/// wrapper around `u16` whose [`Display`](fmt::Display) and [`FromStr`]
/// implementations handle the textual mnemonics used in master files.
/// Types without a known mnemonic use the `TYPEnnn` form of
/// [RFC 3597 § 5]. Parsing is case-insensitive and display is always
/// upper-case, which is how record types are normalized in this crate.
///
/// [RFC 3597 § 5]: https://datatracker.ietf.org/doc/html/rfc3597#section-5
#[derive(Clone, Copy, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct Type(u16);

/// Generates the [`Type`] constants along with the mnemonic lookup
/// tables used by [`FromStr`] and [`Display`](fmt::Display).
macro_rules! rr_types {
    ($($name:ident = $value:literal,)*) => {
        impl Type {
            $(pub const $name: Type = Type($value);)*

            /// Returns the mnemonic of this type, if it has one.
            fn mnemonic(self) -> Option<&'static str> {
                match self.0 {
                    $($value => Some(stringify!($name)),)*
                    _ => None,
                }
            }

            /// Looks up a type by its (case-insensitive) mnemonic.
            fn from_mnemonic(text: &str) -> Option<Self> {
                $(if Caseless(text) == Caseless(stringify!($name)) {
                    return Some(Self::$name);
                })*
                None
            }
        }
    };
}

rr_types! {
    A = 1,
    NS = 2,
    CNAME = 5,
    SOA = 6,
    PTR = 12,
    HINFO = 13,
    MX = 15,
    TXT = 16,
    RP = 17,
    AFSDB = 18,
    AAAA = 28,
    LOC = 29,
    SRV = 33,
    NAPTR = 35,
    CERT = 37,
    DNAME = 39,
    APL = 42,
    DS = 43,
    SSHFP = 44,
    IPSECKEY = 45,
    DNSKEY = 48,
    TLSA = 52,
    SMIMEA = 53,
    OPENPGPKEY = 61,
    SVCB = 64,
    HTTPS = 65,
    SPF = 99,
    URI = 256,
    CAA = 257,
}

impl Type {
    /// Returns whether several owners are expected to share identical
    /// records of this type (e.g. several hosts in one location), so
    /// duplicates are dropped without comment when rendering.
    pub fn expects_duplicates(self) -> bool {
        self == Self::PTR || self == Self::LOC
    }

    /// Compares two types by their textual names. This is the order in
    /// which RRsets are rendered.
    pub fn cmp_by_name(self, other: Self) -> Ordering {
        if self == other {
            Ordering::Equal
        } else {
            self.to_string().cmp(&other.to_string())
        }
    }
}

impl From<u16> for Type {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

impl From<Type> for u16 {
    fn from(rr_type: Type) -> Self {
        rr_type.0
    }
}

impl FromStr for Type {
    type Err = &'static str;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        if let Some(rr_type) = Self::from_mnemonic(text) {
            Ok(rr_type)
        } else if text
            .get(0..4)
            .map_or(false, |prefix| prefix.eq_ignore_ascii_case("TYPE"))
        {
            text[4..]
                .parse::<u16>()
                .map(Self::from)
                .or(Err("type value is not a valid unsigned 16-bit integer"))
        } else {
            Err("unknown type")
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.mnemonic() {
            Some(mnemonic) => f.write_str(mnemonic),
            None => write!(f, "TYPE{}", self.0), // RFC 3597 § 5
        }
    }
}

impl Serialize for Type {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Type {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse()
            .map_err(|e| de::Error::custom(format!("invalid RR type {}: {}", text, e)))
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_displays_according_to_rfc3597() {
        // TYPE65280 is from the private use range, so it should always
        // be unknown.
        let rr_type = Type::from(0xff00);
        assert_eq!(rr_type.to_string(), "TYPE65280");
    }

    #[test]
    fn type_parses_according_to_rfc3597() {
        let type_a: Type = "TYPE1".parse().unwrap();
        let type_65280: Type = "TYPE65280".parse().unwrap();
        assert_eq!(type_a, Type::A);
        assert_eq!(u16::from(type_65280), 65280);
    }

    #[test]
    fn mnemonics_are_case_insensitive_and_normalized() {
        let rr_type: Type = "cname".parse().unwrap();
        assert_eq!(rr_type, Type::CNAME);
        assert_eq!(rr_type.to_string(), "CNAME");
        assert_eq!("sshfp".parse::<Type>().unwrap().to_string(), "SSHFP");
        assert!("BOGUS".parse::<Type>().is_err());
    }

    #[test]
    fn name_order_is_lexicographic() {
        assert_eq!(Type::AAAA.cmp_by_name(Type::A), Ordering::Greater);
        assert_eq!(Type::CNAME.cmp_by_name(Type::TXT), Ordering::Less);
        assert_eq!(Type::MX.cmp_by_name(Type::MX), Ordering::Equal);
    }
}
