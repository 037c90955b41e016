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

//! Provides the [`Ttl`] structure for DNS RR TTLs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

////////////////////////////////////////////////////////////////////////
// TTLS                                                               //
////////////////////////////////////////////////////////////////////////

/// The time to live (TTL) of a DNS record.
///
/// [RFC 2181 § 8] clarified that TTL values are unsigned integers
/// between 0 and 2³¹ - 1, inclusive. This type wraps `u32` to implement
/// that rule: `Ttl::from(u32)` treats values with the most significant
/// bit set as zero, so a `Ttl` never holds an out-of-range value.
///
/// In addition to plain integers, TTLs can be parsed from the
/// unit-suffixed text accepted by BIND (e.g. `1h30m`, `2d`, `1W`).
///
/// [RFC 2181 § 8]: https://datatracker.ietf.org/doc/html/rfc2181#section-8
#[derive(Clone, Copy, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct Ttl(u32);

impl From<u32> for Ttl {
    fn from(raw: u32) -> Self {
        if raw > i32::MAX as u32 {
            Self(0)
        } else {
            Self(raw)
        }
    }
}

impl From<Ttl> for u32 {
    fn from(ttl: Ttl) -> Self {
        ttl.0
    }
}

impl Ttl {
    /// Converts a number of seconds into a `Ttl`, failing if it is
    /// outside the RFC 2181 range. Unlike `Ttl::from(u32)`, this is
    /// meant for values typed by a person.
    pub fn from_seconds(seconds: u64) -> Result<Self, &'static str> {
        if seconds > i32::MAX as u64 {
            Err("TTL is too large")
        } else {
            Ok(Self(seconds as u32))
        }
    }
}

impl FromStr for Ttl {
    type Err = &'static str;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        if text.is_empty() {
            return Err("TTL is empty");
        }
        if text.bytes().all(|b| b.is_ascii_digit()) {
            let seconds = text.parse::<u64>().map_err(|_| "TTL is too large")?;
            return Self::from_seconds(seconds);
        }

        let mut total: u64 = 0;
        let mut digits: Option<u64> = None;
        for c in text.chars() {
            if let Some(digit) = c.to_digit(10) {
                let value = digits.unwrap_or(0) * 10 + u64::from(digit);
                if value > i32::MAX as u64 {
                    return Err("TTL is too large");
                }
                digits = Some(value);
            } else {
                let multiplier = match c.to_ascii_lowercase() {
                    's' => 1,
                    'm' => 60,
                    'h' => 60 * 60,
                    'd' => 24 * 60 * 60,
                    'w' => 7 * 24 * 60 * 60,
                    _ => return Err("TTL contains an unknown unit"),
                };
                let value = digits.take().ok_or("TTL unit is not preceded by a number")?;
                // Neither `value` nor `total` exceeds i32::MAX here.
                total += value * multiplier;
                if total > i32::MAX as u64 {
                    return Err("TTL is too large");
                }
            }
        }
        if digits.is_some() {
            return Err("TTL has a trailing number without a unit");
        }
        Self::from_seconds(total)
    }
}

impl fmt::Debug for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_ttls_are_not_modified() {
        let i32_max = i32::MAX as u32;
        assert_eq!(u32::from(Ttl::from(0)), 0);
        assert_eq!(u32::from(Ttl::from(23)), 23);
        assert_eq!(u32::from(Ttl::from(i32_max)), i32_max);
    }

    #[test]
    fn large_ttls_become_zero() {
        assert_eq!(u32::from(Ttl::from(i32::MAX as u32 + 1)), 0);
    }

    #[test]
    fn parses_unit_suffixed_text() {
        assert_eq!("3600".parse::<Ttl>(), Ok(Ttl::from(3600)));
        assert_eq!("1h30m".parse::<Ttl>(), Ok(Ttl::from(5400)));
        assert_eq!("1W".parse::<Ttl>(), Ok(Ttl::from(604_800)));
        assert_eq!("2d10s".parse::<Ttl>(), Ok(Ttl::from(172_810)));
    }

    #[test]
    fn rejects_malformed_text() {
        assert!("".parse::<Ttl>().is_err());
        assert!("h".parse::<Ttl>().is_err());
        assert!("1h5".parse::<Ttl>().is_err());
        assert!("5y".parse::<Ttl>().is_err());
        assert!("100000000w".parse::<Ttl>().is_err());
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert_eq!("2147483647".parse::<Ttl>(), Ok(Ttl::from(i32::MAX as u32)));
        assert_eq!("2147483648".parse::<Ttl>(), Err("TTL is too large"));
        assert_eq!("3000000000".parse::<Ttl>(), Err("TTL is too large"));
        assert_eq!("99999999999999999999999".parse::<Ttl>(), Err("TTL is too large"));
        assert_eq!(Ttl::from_seconds(3_000_000_000), Err("TTL is too large"));
        assert_eq!(Ttl::from_seconds(300), Ok(Ttl::from(300)));
    }

    #[test]
    fn long_unit_text_does_not_overflow() {
        let text = "4294967295w".repeat(8000);
        assert_eq!(text.parse::<Ttl>(), Err("TTL is too large"));
        assert_eq!("3550w".repeat(2).parse::<Ttl>(), Err("TTL is too large"));
    }
}
