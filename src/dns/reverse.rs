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

//! Reverse-mapping (PTR owner) names for IP addresses.

use std::net::IpAddr;

use crate::util::nibble_to_ascii_hex_digit;

/// Returns the owner name of the PTR record for `ip`: the dotted-quad
/// form under `in-addr.arpa.` ([RFC 1035 § 3.5]) for IPv4, and the
/// nibble form under `ip6.arpa.` ([RFC 3596 § 2.5]) for IPv6.
///
/// [RFC 1035 § 3.5]: https://datatracker.ietf.org/doc/html/rfc1035#section-3.5
/// [RFC 3596 § 2.5]: https://datatracker.ietf.org/doc/html/rfc3596#section-2.5
pub fn reverse_name(ip: IpAddr) -> String {
    let mut name = String::new();
    match ip {
        IpAddr::V4(ip) => {
            for octet in ip.octets().iter().rev() {
                name.push_str(&octet.to_string());
                name.push('.');
            }
            name.push_str("in-addr.arpa.");
        }
        IpAddr::V6(ip) => {
            for octet in ip.octets().iter().rev() {
                name.push(char::from(nibble_to_ascii_hex_digit(octet & 0xf)));
                name.push('.');
                name.push(char::from(nibble_to_ascii_hex_digit(octet >> 4)));
                name.push('.');
            }
            name.push_str("ip6.arpa.");
        }
    }
    name
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ipv4_reverse_name() {
        assert_eq!(
            reverse_name("10.0.0.5".parse().unwrap()),
            "5.0.0.10.in-addr.arpa.",
        );
    }

    #[test]
    fn ipv6_reverse_name() {
        assert_eq!(
            reverse_name("2001:db8::567:89ab".parse().unwrap()),
            "b.a.9.8.7.6.5.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.8.b.d.0.1.0.0.2.ip6.arpa.",
        );
    }
}
