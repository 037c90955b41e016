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

//! The zone exporter.
//!
//! Zones are written as master-file fragments: they carry no SOA or NS
//! records of their own and are meant to be `$INCLUDE`d into a zone file
//! that does.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::info;

use crate::dns::{PrintOptions, Zone, ZoneRegistry};
use crate::thing::AsThing;

/// Renders `zone` in master-file syntax, beginning with an `$ORIGIN`
/// directive for the zone.
pub fn render(zone: &Zone, annotate: bool) -> String {
    let mut text = format!("$ORIGIN {}\n", zone.name());
    let options = PrintOptions {
        indent: zone.owner_width(),
        annotate,
        repeat_owner: false,
        absolute: false,
    };
    // Writing to a String cannot fail.
    let _ = zone.print(&mut text, &options);
    text
}

/// Returns the file name a zone is exported to: its name without the
/// trailing dot, or `root` for the root zone, with a `.zone` extension.
pub fn file_name(zone: &Zone) -> String {
    match zone.name().trim_end_matches('.') {
        "" => "root.zone".to_owned(),
        name => format!("{}.zone", name.to_ascii_lowercase()),
    }
}

/// Writes every zone of `zones` to its own file, in the zone's own
/// directory if it has one and in `directory` otherwise. Returns the
/// paths written.
pub fn export(zones: &ZoneRegistry, directory: &Path, annotate: bool) -> io::Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(zones.len());
    for zone in zones.iter() {
        let path = zone.directory().unwrap_or(directory).join(file_name(zone));
        fs::write(&path, render(zone, annotate))?;
        info!("Wrote {} ({} names) to {}.", zone.name(), zone.len(), path.display());
        written.push(path);
    }
    Ok(written)
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
