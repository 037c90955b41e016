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

//! Expansion of generated-host templates.

use std::net::IpAddr;

use super::error::ErrorKind;
use super::reserve;
use crate::addr::{self, AddressMap, Containable};
use crate::network::Network;
use crate::source::{AddressDef, GenerateDef, HostDef};
use crate::thing::AsThing;

/// Expands `generate` into one host definition per address of its
/// block, skipping addresses that are reserved in `map`.
pub(super) fn expand(
    generate: &GenerateDef,
    network: &Network,
    map: &AddressMap,
) -> Result<Vec<HostDef>, ErrorKind> {
    let template = generate.template.trim();
    if !template.contains("{n}") && !template.contains("{ip}") {
        return Err(ErrorKind::InvalidTemplate(generate.template.clone()));
    }
    let block = addr::parse_net(&generate.block)?;
    if !network
        .prefixes(None)
        .iter()
        .any(|prefix| prefix.contains_net(&block))
    {
        return Err(ErrorKind::BlockOutsideNetwork {
            block: block.to_string(),
            network: network.name().to_owned(),
        });
    }

    let mut hosts = Vec::new();
    for (offset, ip) in reserve::enumerate(&block)? {
        if map.address(ip).map_or(false, |a| a.is_reserved()) {
            continue;
        }
        hosts.push(HostDef {
            name: expand_name(template, offset, ip),
            addresses: vec![AddressDef::new(&ip.to_string())],
            ttl: generate.ttl,
            provenance: generate.provenance.clone(),
            ..Default::default()
        });
    }
    Ok(hosts)
}

fn expand_name(template: &str, offset: u128, ip: IpAddr) -> String {
    let ip = ip
        .to_string()
        .replace(|c: char| c == '.' || c == ':', "-");
    template
        .replace("{n}", &offset.to_string())
        .replace("{ip}", &ip)
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
