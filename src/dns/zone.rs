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

//! Implementation of the [`Zone`] and [`ZoneRegistry`] structures.

use std::fmt::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::tree::LabelTree;
use super::{Domain, Error, PrintOptions, Record, Ttl, Type};
use crate::diag::Diagnostics;
use crate::registry::Registry;
use crate::thing::{AsThing, Provenance, Thing};
use crate::util::{fqdn, labels_from_root};

////////////////////////////////////////////////////////////////////////
// ZONES                                                              //
////////////////////////////////////////////////////////////////////////

/// A DNS zone for which records are generated.
///
/// A `Zone` owns a [`Domain`] for every name within it that has
/// records. Domains are created on demand by [`Zone::add_rr`], and their
/// names are kept relative to the zone apex (which is named `@`).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    thing: Thing,
    directory: Option<PathBuf>,
    default_ttl: Ttl,
    domains: Registry<Domain>,
}

impl Zone {
    /// Creates an empty `Zone`. The name is normalized to have a
    /// trailing dot.
    pub fn new(name: &str, default_ttl: Ttl, provenance: Provenance) -> Self {
        Self {
            thing: Thing::new(fqdn(name), provenance),
            directory: None,
            default_ttl,
            domains: Registry::new(),
        }
    }

    /// Returns the directory the zone is exported to, if the zone
    /// overrides the exporter's default.
    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    pub fn set_directory(&mut self, directory: Option<PathBuf>) {
        self.directory = directory;
    }

    /// Returns the TTL applied to records that are added without one.
    pub fn default_ttl(&self) -> Ttl {
        self.default_ttl
    }

    /// Returns `name` relative to this zone: `@` for the apex, or the
    /// labels preceding the zone's name. Returns `None` if `name` is not
    /// within the zone.
    pub fn relative_name(&self, name: &str) -> Option<String> {
        let name = fqdn(name);
        let zone = self.name();
        if name.eq_ignore_ascii_case(zone) {
            return Some("@".to_owned());
        }
        if zone == "." {
            return Some(name.trim_end_matches('.').to_owned());
        }
        let suffix = format!(".{}", zone.to_ascii_lowercase());
        if name.to_ascii_lowercase().ends_with(&suffix) {
            Some(name[..name.len() - suffix.len()].to_owned())
        } else {
            None
        }
    }

    /// Looks up the [`Domain`] for a name relative to the zone.
    pub fn domain(&self, relative: &str) -> Option<&Domain> {
        self.domains.lookup(relative)
    }

    /// Returns the zone's [`Domain`]s in rendering order: the apex
    /// first, then the remaining names sorted label by label from the
    /// apex downward.
    pub fn domains(&self) -> Vec<&Domain> {
        self.domains.sorted_by(|a, b| {
            b.is_apex()
                .cmp(&a.is_apex())
                .then_with(|| labels_from_root(a.fqdn()).cmp(&labels_from_root(b.fqdn())))
        })
    }

    /// Adds a record for the relative name `relative`, creating its
    /// [`Domain`] if necessary. A record without a TTL gets the zone's
    /// default TTL. See [`Domain::add_rr`] for the failure conditions.
    pub fn add_rr(
        &mut self,
        relative: &str,
        ttl: Option<Ttl>,
        rr_type: Type,
        record: Record,
        diag: &mut Diagnostics,
    ) -> Result<(), Error> {
        if !self.domains.contains(relative) {
            let owner = if relative == "@" {
                self.name().to_owned()
            } else if self.name() == "." {
                format!("{}.", relative)
            } else {
                format!("{}.{}", relative, self.name())
            };
            self.domains
                .add(Domain::new(relative, &owner, relative == "@"))?;
        }
        let ttl = ttl.unwrap_or(self.default_ttl);
        match self.domains.lookup_mut(relative) {
            Some(domain) => domain.add_rr(ttl, rr_type, record, diag),
            None => Err(Error::NotInAnyZone(relative.to_owned())),
        }
    }

    /// Writes all of the zone's records to `sink`, one [`Domain`] after
    /// another, in the order given by [`Zone::domains`].
    pub fn print<W: Write>(&self, sink: &mut W, options: &PrintOptions) -> fmt::Result {
        for domain in self.domains() {
            domain.print(sink, options)?;
        }
        Ok(())
    }

    /// Returns the width of the longest relative name in the zone,
    /// which is a good owner-column width for [`Zone::print`].
    pub fn owner_width(&self) -> usize {
        self.domains.iter().map(|d| d.name().len()).max().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

impl AsThing for Zone {
    fn thing(&self) -> &Thing {
        &self.thing
    }

    fn thing_mut(&mut self) -> &mut Thing {
        &mut self.thing
    }
}

////////////////////////////////////////////////////////////////////////
// ZONE REGISTRY                                                      //
////////////////////////////////////////////////////////////////////////

/// The collection of all configured [`Zone`]s.
///
/// Besides holding the zones, the registry keeps them in a
/// [`LabelTree`] so that the zone containing any name can be found by
/// longest-suffix match on its labels.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ZoneRegistry {
    zones: Registry<Zone>,
    tree: LabelTree,
}

impl ZoneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a zone. This fails if a zone of the same name exists.
    pub fn add(&mut self, zone: Zone) -> Result<&mut Zone, Error> {
        let labels = labels_from_root(zone.name());
        let name = zone.name().to_owned();
        let zone = self.zones.add(zone)?;
        self.tree.insert(&labels, name);
        Ok(zone)
    }

    /// Looks up a zone by its name.
    pub fn lookup(&self, name: &str) -> Option<&Zone> {
        self.zones.lookup(&fqdn(name))
    }

    /// Finds the zone containing `name` (the registered zone whose name
    /// matches the most labels of `name`, counting from the right).
    /// Returns the zone and `name` relative to it, or `None` if no zone
    /// contains `name`.
    pub fn lookup_fqdn(&self, name: &str) -> Option<(&Zone, String)> {
        let name = fqdn(name);
        let (zone_name, _) = self.tree.lookup(&labels_from_root(&name))?;
        let zone = self.zones.lookup(zone_name)?;
        let relative = zone.relative_name(&name)?;
        Some((zone, relative))
    }

    /// Returns whether some zone contains `name`.
    pub fn covers(&self, name: &str) -> bool {
        self.lookup_fqdn(name).is_some()
    }

    /// Adds a record owned by the fully-qualified name `owner` to the
    /// zone that contains it. A record without a TTL gets that zone's
    /// default TTL. This fails with [`Error::NotInAnyZone`] if no zone
    /// contains `owner`, and otherwise as [`Domain::add_rr`] does.
    pub fn add_rr(
        &mut self,
        owner: &str,
        ttl: Option<Ttl>,
        rr_type: Type,
        record: Record,
        diag: &mut Diagnostics,
    ) -> Result<(), Error> {
        let (zone_name, relative) = match self.lookup_fqdn(owner) {
            Some((zone, relative)) => (zone.name().to_owned(), relative),
            None => return Err(Error::NotInAnyZone(fqdn(owner))),
        };
        match self.zones.lookup_mut(&zone_name) {
            Some(zone) => zone.add_rr(&relative, ttl, rr_type, record, diag),
            None => Err(Error::NotInAnyZone(fqdn(owner))),
        }
    }

    /// Renders the records owned by `owner`, if any, in master-file
    /// syntax with the owner written as a fully-qualified name.
    pub fn render_name(&self, owner: &str, annotate: bool) -> Option<String> {
        let (zone, relative) = self.lookup_fqdn(owner)?;
        let domain = zone.domain(&relative)?;
        let mut text = String::new();
        domain
            .print(
                &mut text,
                &PrintOptions {
                    indent: 0,
                    annotate,
                    repeat_owner: true,
                    absolute: true,
                },
            )
            .ok()?;
        Some(text)
    }

    /// Returns an iterator over the zones, in the order they were added.
    pub fn iter(&self) -> std::slice::Iter<Zone> {
        self.zones.iter()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ZoneRegistry {
        let mut zones = ZoneRegistry::new();
        for name in ["example.", "sub.example.", "10.in-addr.arpa."] {
            zones
                .add(Zone::new(name, Ttl::from(3600), Provenance::new("test")))
                .unwrap();
        }
        zones
    }

    #[test]
    fn lookup_fqdn_uses_longest_suffix() {
        let zones = registry();
        let (zone, relative) = zones.lookup_fqdn("www.example").unwrap();
        assert_eq!((zone.name(), relative.as_str()), ("example.", "www"));
        let (zone, relative) = zones.lookup_fqdn("a.b.Sub.Example.").unwrap();
        assert_eq!((zone.name(), relative.as_str()), ("sub.example.", "a.b"));
        let (zone, relative) = zones.lookup_fqdn("sub.example.").unwrap();
        assert_eq!((zone.name(), relative.as_str()), ("sub.example.", "@"));
        assert!(zones.lookup_fqdn("example.org.").is_none());
        assert!(!zones.covers("."));
    }

    #[test]
    fn duplicate_zones_are_rejected() {
        let mut zones = registry();
        assert!(matches!(
            zones.add(Zone::new("EXAMPLE", Ttl::from(60), Provenance::new("again"))),
            Err(Error::Duplicate(_))
        ));
    }

    #[test]
    fn add_rr_creates_domains_and_applies_default_ttl() {
        let mut zones = registry();
        let mut diag = Diagnostics::new();
        zones
            .add_rr(
                "5.0.0.10.in-addr.arpa.",
                None,
                Type::PTR,
                Record::new("foo.example.", Provenance::new("test")),
                &mut diag,
            )
            .unwrap();
        zones
            .add_rr(
                "foo.example.",
                Some(Ttl::from(60)),
                Type::A,
                Record::new("10.0.0.5", Provenance::new("test")),
                &mut diag,
            )
            .unwrap();
        assert_eq!(
            zones.add_rr(
                "foo.example.org.",
                None,
                Type::A,
                Record::new("10.0.0.5", Provenance::new("test")),
                &mut diag,
            ),
            Err(Error::NotInAnyZone("foo.example.org.".into()))
        );

        let reverse = zones.lookup("10.in-addr.arpa.").unwrap();
        let ptr = reverse.domain("5.0.0").unwrap();
        assert_eq!(ptr.fqdn(), "5.0.0.10.in-addr.arpa.");
        assert_eq!(
            ptr.active().lookup(Type::PTR).unwrap().ttl(),
            Ttl::from(3600)
        );
        assert_eq!(
            zones.render_name("FOO.example.", false).unwrap(),
            "foo.example. 60 IN A 10.0.0.5\n"
        );
    }

    #[test]
    fn zone_prints_apex_first_then_sorted_names() {
        let mut zone = Zone::new("example.", Ttl::from(60), Provenance::new("test"));
        let mut diag = Diagnostics::new();
        for owner in ["b", "a.b", "@", "a"] {
            zone.add_rr(
                owner,
                None,
                Type::TXT,
                Record::new("\"x\"", Provenance::new("test")),
                &mut diag,
            )
            .unwrap();
        }
        let mut text = String::new();
        let options = PrintOptions {
            indent: zone.owner_width(),
            ..Default::default()
        };
        zone.print(&mut text, &options).unwrap();
        assert_eq!(
            text,
            "@   60 IN TXT \"x\"\n\
             a   60 IN TXT \"x\"\n\
             b   60 IN TXT \"x\"\n\
             a.b 60 IN TXT \"x\"\n"
        );
    }
}
