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

//! Implementation of [`Domain`], which collects the records of one
//! owner name into RRsets and renders them in master-file syntax.

use std::fmt::{self, Write};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::{Error, Ttl, Type};
use crate::diag::{Diagnostics, Warning};
use crate::thing::{AsThing, Provenance, Thing};

////////////////////////////////////////////////////////////////////////
// RECORDS AND RRSETS                                                 //
////////////////////////////////////////////////////////////////////////

/// A single record of an [`Rrset`]. The RDATA is kept in its master-file
/// text form.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub rdata: String,
    pub comment: Option<String>,
    pub active: bool,
    pub provenance: Provenance,
}

impl Record {
    /// Creates an active record without a comment.
    pub fn new(rdata: impl Into<String>, provenance: Provenance) -> Self {
        Self {
            rdata: rdata.into(),
            comment: None,
            active: true,
            provenance,
        }
    }

    pub fn with_comment(self, comment: Option<String>) -> Self {
        Self { comment, ..self }
    }

    pub fn with_active(self, active: bool) -> Self {
        Self { active, ..self }
    }
}

/// The records of one type at one owner name, sharing one TTL.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Rrset {
    rr_type: Type,
    ttl: Ttl,
    records: Vec<Record>,
}

impl Rrset {
    pub fn rr_type(&self) -> Type {
        self.rr_type
    }

    pub fn ttl(&self) -> Ttl {
        self.ttl
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Returns the provenance of the record that created the RRset.
    fn first_provenance(&self) -> Provenance {
        self.records
            .first()
            .map(|r| r.provenance.clone())
            .unwrap_or_default()
    }
}

/// The [`Rrset`]s at one owner name, kept sorted by type name.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct RrsetList {
    rrsets: Vec<Rrset>,
}

impl RrsetList {
    fn search(&self, rr_type: Type) -> Result<usize, usize> {
        self.rrsets
            .binary_search_by(|r| r.rr_type.cmp_by_name(rr_type))
    }

    /// Looks up the [`Rrset`] of type `rr_type` in the `RrsetList`.
    pub fn lookup(&self, rr_type: Type) -> Option<&Rrset> {
        self.search(rr_type).ok().map(|index| &self.rrsets[index])
    }

    /// Returns an iterator over the [`Rrset`]s, in order of type name.
    pub fn iter(&self) -> std::slice::Iter<Rrset> {
        self.rrsets.iter()
    }

    pub fn len(&self) -> usize {
        self.rrsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rrsets.is_empty()
    }
}

////////////////////////////////////////////////////////////////////////
// DOMAINS                                                            //
////////////////////////////////////////////////////////////////////////

/// The records owned by one name within a [`Zone`](super::Zone).
///
/// A `Domain`'s name is relative to its zone (`@` for the apex). Active
/// records, which will be published, and inactive records, which are
/// rendered commented out, are kept in separate [`RrsetList`]s. Only the
/// active list is subject to the CNAME rules of [RFC 1034 § 3.6.2] and
/// [RFC 2181 § 10.1].
///
/// [RFC 1034 § 3.6.2]: https://datatracker.ietf.org/doc/html/rfc1034#section-3.6.2
/// [RFC 2181 § 10.1]: https://datatracker.ietf.org/doc/html/rfc2181#section-10.1
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    thing: Thing,
    fqdn: String,
    apex: bool,
    active: RrsetList,
    inactive: RrsetList,
}

/// Options for [`Domain::print`].
#[derive(Clone, Copy, Debug, Default)]
pub struct PrintOptions {
    /// The width of the owner-name column.
    pub indent: usize,
    /// Whether to append the provenance of each record as a comment.
    pub annotate: bool,
    /// Whether to write the owner name on every line, rather than only
    /// on the first line of each RRset.
    pub repeat_owner: bool,
    /// Whether to write the fully-qualified owner name instead of the
    /// name relative to the zone.
    pub absolute: bool,
}

impl Domain {
    /// Creates an empty `Domain`. `name` is relative to the zone and
    /// `fqdn` is the full owner name, used in messages.
    pub fn new(name: &str, fqdn: &str, apex: bool) -> Self {
        Self {
            thing: Thing::new(name, Provenance::default()),
            fqdn: fqdn.to_owned(),
            apex,
            active: RrsetList::default(),
            inactive: RrsetList::default(),
        }
    }

    pub fn fqdn(&self) -> &str {
        &self.fqdn
    }

    pub fn is_apex(&self) -> bool {
        self.apex
    }

    pub fn active(&self) -> &RrsetList {
        &self.active
    }

    pub fn inactive(&self) -> &RrsetList {
        &self.inactive
    }

    /// Adds a record to the `Domain`.
    ///
    /// Inactive records are filed without any checks, and the TTL of
    /// their RRset is simply replaced by `ttl`. For active records, this
    /// fails if the record would give the name a CNAME record alongside
    /// any other record (including a second CNAME record), or a CNAME
    /// record at a zone apex. If the RRset already exists with a
    /// different TTL, the smaller TTL is kept and a warning is recorded
    /// in `diag`.
    pub fn add_rr(
        &mut self,
        ttl: Ttl,
        rr_type: Type,
        record: Record,
        diag: &mut Diagnostics,
    ) -> Result<(), Error> {
        if !record.active {
            match self.inactive.search(rr_type) {
                Ok(index) => {
                    let rrset = &mut self.inactive.rrsets[index];
                    rrset.ttl = ttl;
                    rrset.records.push(record);
                }
                Err(index) => self.inactive.rrsets.insert(
                    index,
                    Rrset {
                        rr_type,
                        ttl,
                        records: vec![record],
                    },
                ),
            }
            return Ok(());
        }

        self.check_cname_rules(rr_type)?;
        match self.active.search(rr_type) {
            Ok(index) => {
                let rrset = &mut self.active.rrsets[index];
                if rrset.ttl != ttl {
                    let kept = rrset.ttl.min(ttl);
                    diag.warn(Warning::TtlMismatch {
                        owner: self.fqdn.clone(),
                        rr_type,
                        kept,
                        ignored: rrset.ttl.max(ttl),
                        at: record.provenance.clone(),
                    });
                    rrset.ttl = kept;
                }
                rrset.records.push(record);
            }
            Err(index) => self.active.rrsets.insert(
                index,
                Rrset {
                    rr_type,
                    ttl,
                    records: vec![record],
                },
            ),
        }
        Ok(())
    }

    /// Checks whether an active record of type `rr_type` may be added.
    fn check_cname_rules(&self, rr_type: Type) -> Result<(), Error> {
        if rr_type == Type::CNAME {
            if self.apex {
                return Err(Error::CnameAtApex {
                    owner: self.fqdn.clone(),
                });
            }
            if let Some(cname) = self.active.lookup(Type::CNAME) {
                return Err(Error::DuplicateCname {
                    owner: self.fqdn.clone(),
                    first: cname.first_provenance(),
                });
            }
            if let Some(other) = self.active.iter().next() {
                return Err(Error::CnameConflict {
                    owner: self.fqdn.clone(),
                    rr_type,
                    existing: other.rr_type,
                    first: other.first_provenance(),
                });
            }
        } else if let Some(cname) = self.active.lookup(Type::CNAME) {
            return Err(Error::CnameConflict {
                owner: self.fqdn.clone(),
                rr_type,
                existing: Type::CNAME,
                first: cname.first_provenance(),
            });
        }
        Ok(())
    }

    /// Writes the `Domain`'s records to `sink` in master-file syntax.
    ///
    /// Active RRsets are written first, then inactive ones (commented
    /// out); within each group, RRsets are ordered by type name and
    /// records by insertion order. Identical RDATA within an RRset is
    /// written once. Duplicates are expected for PTR and LOC records and
    /// dropped silently; for other types, a warning is logged.
    pub fn print<W: Write>(&self, sink: &mut W, options: &PrintOptions) -> fmt::Result {
        for rrset in self.active.iter() {
            self.print_rrset(sink, rrset, "", options)?;
        }
        for rrset in self.inactive.iter() {
            self.print_rrset(sink, rrset, "; ", options)?;
        }
        Ok(())
    }

    fn print_rrset<W: Write>(
        &self,
        sink: &mut W,
        rrset: &Rrset,
        prefix: &str,
        options: &PrintOptions,
    ) -> fmt::Result {
        let mut seen: Vec<&str> = Vec::new();
        for record in &rrset.records {
            if seen.contains(&record.rdata.as_str()) {
                if !record.active {
                    debug!(
                        "Dropping duplicate inactive {} record for {}.",
                        rrset.rr_type, self.fqdn,
                    );
                } else if !rrset.rr_type.expects_duplicates() {
                    warn!(
                        "{}: dropping duplicate {} record \"{}\" for {}",
                        record.provenance, rrset.rr_type, record.rdata, self.fqdn,
                    );
                }
                continue;
            }

            let owner = if !(seen.is_empty() || options.repeat_owner) {
                ""
            } else if options.absolute {
                &self.fqdn
            } else {
                self.name()
            };
            seen.push(&record.rdata);
            write!(
                sink,
                "{}{:<width$} {} IN {} {}",
                prefix,
                owner,
                rrset.ttl,
                rrset.rr_type,
                record.rdata,
                width = options.indent,
            )?;
            match (&record.comment, options.annotate) {
                (Some(comment), true) => write!(sink, " ; {} ({})", comment, record.provenance)?,
                (Some(comment), false) => write!(sink, " ; {}", comment)?,
                (None, true) => write!(sink, " ; {}", record.provenance)?,
                (None, false) => (),
            }
            sink.write_char('\n')?;
        }
        Ok(())
    }
}

impl AsThing for Domain {
    fn thing(&self) -> &Thing {
        &self.thing
    }

    fn thing_mut(&mut self) -> &mut Thing {
        &mut self.thing
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn domain() -> Domain {
        Domain::new("www", "www.example.", false)
    }

    fn record(rdata: &str, source: &str) -> Record {
        Record::new(rdata, Provenance::new(source))
    }

    #[test]
    fn ttl_mismatch_keeps_smaller_ttl_and_warns() {
        let mut domain = domain();
        let mut diag = Diagnostics::new();
        domain
            .add_rr(Ttl::from(300), Type::A, record("1.2.3.4", "a"), &mut diag)
            .unwrap();
        domain
            .add_rr(Ttl::from(600), Type::A, record("1.2.3.5", "b"), &mut diag)
            .unwrap();

        assert_eq!(domain.active().lookup(Type::A).unwrap().ttl(), Ttl::from(300));
        assert_eq!(diag.warnings().len(), 1);
        assert!(matches!(
            diag.warnings()[0],
            Warning::TtlMismatch { kept, ignored, .. }
                if kept == Ttl::from(300) && ignored == Ttl::from(600)
        ));

        let mut text = String::new();
        domain.print(&mut text, &PrintOptions::default()).unwrap();
        assert_eq!(text, "www 300 IN A 1.2.3.4\n 300 IN A 1.2.3.5\n");
    }

    #[test]
    fn cname_excludes_other_types_both_ways() {
        let mut diag = Diagnostics::new();

        let mut domain = domain();
        domain
            .add_rr(Ttl::from(60), Type::CNAME, record("host.example.", "a"), &mut diag)
            .unwrap();
        assert!(matches!(
            domain.add_rr(Ttl::from(60), Type::TXT, record("\"x\"", "b"), &mut diag),
            Err(Error::CnameConflict { existing: Type::CNAME, ref first, .. })
                if *first == Provenance::new("a")
        ));
        assert!(matches!(
            domain.add_rr(Ttl::from(60), Type::CNAME, record("other.example.", "c"), &mut diag),
            Err(Error::DuplicateCname { .. })
        ));

        let mut domain = self::domain();
        domain
            .add_rr(Ttl::from(60), Type::A, record("1.2.3.4", "a"), &mut diag)
            .unwrap();
        assert!(matches!(
            domain.add_rr(Ttl::from(60), Type::CNAME, record("host.example.", "b"), &mut diag),
            Err(Error::CnameConflict { existing: Type::A, .. })
        ));
    }

    #[test]
    fn inactive_records_are_not_checked() {
        let mut diag = Diagnostics::new();
        let mut domain = domain();
        domain
            .add_rr(Ttl::from(60), Type::CNAME, record("host.example.", "a"), &mut diag)
            .unwrap();
        domain
            .add_rr(
                Ttl::from(120),
                Type::A,
                record("1.2.3.4", "b").with_active(false),
                &mut diag,
            )
            .unwrap();
        domain
            .add_rr(
                Ttl::from(30),
                Type::A,
                record("1.2.3.5", "c").with_active(false),
                &mut diag,
            )
            .unwrap();
        assert!(diag.is_empty());
        assert_eq!(domain.inactive().lookup(Type::A).unwrap().ttl(), Ttl::from(30));

        let mut text = String::new();
        domain.print(&mut text, &PrintOptions::default()).unwrap();
        assert_eq!(
            text,
            "www 60 IN CNAME host.example.\n\
             ; www 30 IN A 1.2.3.4\n\
             ;  30 IN A 1.2.3.5\n"
        );
    }

    #[test]
    fn cname_at_apex_is_rejected() {
        let mut diag = Diagnostics::new();
        let mut apex = Domain::new("@", "example.", true);
        assert_eq!(
            apex.add_rr(Ttl::from(60), Type::CNAME, record("x.", "a"), &mut diag),
            Err(Error::CnameAtApex {
                owner: "example.".into()
            })
        );
    }

    #[test]
    fn print_orders_by_type_name_and_drops_duplicates() {
        let mut diag = Diagnostics::new();
        let mut domain = domain();
        let options = PrintOptions {
            indent: 6,
            annotate: false,
            repeat_owner: true,
            absolute: false,
        };
        for (rr_type, rdata) in [
            (Type::TXT, "\"hello\""),
            (Type::AAAA, "2001:db8::1"),
            (Type::A, "10.0.0.1"),
            (Type::A, "10.0.0.1"),
            (Type::A, "10.0.0.2"),
        ] {
            domain
                .add_rr(Ttl::from(60), rr_type, record(rdata, "x"), &mut diag)
                .unwrap();
        }
        let mut text = String::new();
        domain.print(&mut text, &options).unwrap();
        assert_eq!(
            text,
            "www    60 IN A 10.0.0.1\n\
             www    60 IN A 10.0.0.2\n\
             www    60 IN AAAA 2001:db8::1\n\
             www    60 IN TXT \"hello\"\n"
        );
    }

    #[test]
    fn print_annotates_comments_and_provenance() {
        let mut diag = Diagnostics::new();
        let mut domain = domain();
        domain
            .add_rr(
                Ttl::from(60),
                Type::A,
                record("10.0.0.1", "db.toml").with_comment(Some("primary".into())),
                &mut diag,
            )
            .unwrap();
        let mut text = String::new();
        let options = PrintOptions {
            annotate: true,
            ..Default::default()
        };
        domain.print(&mut text, &options).unwrap();
        assert_eq!(text, "www 60 IN A 10.0.0.1 ; primary (db.toml)\n");
    }
}
