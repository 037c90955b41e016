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

//! The infrastructure-address reservation policy and the enumeration
//! of address ranges.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use ipnet::IpNet;

use super::error::ErrorKind;
use crate::source::ReservePolicy;

/// The largest number of addresses [`enumerate`] will produce.
const MAX_RANGE: u128 = 1 << 16;

/// Returns the addresses of `prefix` that `policy` reserves.
///
/// For IPv4, `minimal` reserves the network and broadcast addresses,
/// and `full` additionally reserves the lowest host addresses: one for
/// a /29 or /30, three for a /26 through /28, and seven for a /25 or
/// shorter. Prefixes longer than /30 have no such addresses. For IPv6,
/// both policies reserve only the subnet-router anycast address.
pub(super) fn policy_addresses(policy: ReservePolicy, prefix: &IpNet) -> Vec<IpAddr> {
    if policy == ReservePolicy::None {
        return Vec::new();
    }
    match prefix {
        IpNet::V4(net) => {
            if net.prefix_len() > 30 {
                return Vec::new();
            }
            let mut reserved = vec![IpAddr::V4(net.network()), IpAddr::V4(net.broadcast())];
            if policy == ReservePolicy::Full {
                let base = u32::from(net.network());
                for offset in 1..=low_count(net.prefix_len()) {
                    reserved.push(IpAddr::V4(Ipv4Addr::from(base + offset)));
                }
            }
            reserved
        }
        IpNet::V6(net) => vec![IpAddr::V6(net.network())],
    }
}

/// Returns how many low host addresses the `full` policy reserves for
/// an IPv4 prefix of length `prefix_len`.
fn low_count(prefix_len: u8) -> u32 {
    match prefix_len {
        0..=25 => 7,
        26..=28 => 3,
        29..=30 => 1,
        _ => 0,
    }
}

/// Returns every address of `net` along with its offset from the
/// network address. Ranges of more than 65,536 addresses are refused.
pub(super) fn enumerate(net: &IpNet) -> Result<Vec<(u128, IpAddr)>, ErrorKind> {
    let host_bits = u32::from(net.max_prefix_len() - net.prefix_len());
    if host_bits > 16 {
        return Err(ErrorKind::RangeTooLarge(net.to_string()));
    }
    let size = 1u128 << host_bits;
    debug_assert!(size <= MAX_RANGE);
    Ok((0..size)
        .map(|offset| {
            let ip = match net {
                IpNet::V4(v4) => {
                    IpAddr::V4(Ipv4Addr::from(u32::from(v4.network()) + offset as u32))
                }
                IpNet::V6(v6) => IpAddr::V6(Ipv6Addr::from(u128::from(v6.network()) + offset)),
            };
            (offset, ip)
        })
        .collect())
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
