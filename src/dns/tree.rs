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

//! Implementation of the [`LabelTree`] used to find the zone that
//! contains a name.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A tree mirroring the DNS namespace, with zone names placed at the
/// nodes for their apexes. Labels are stored lower-cased and given from
/// the root downward (see [`labels_from_root`](crate::util::labels_from_root)).
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub(super) struct LabelTree {
    children: HashMap<String, LabelTree>,
    zone: Option<String>,
}

impl LabelTree {
    /// Places `zone` at the node for `labels`, creating any missing
    /// nodes along the way.
    pub fn insert(&mut self, labels: &[String], zone: String) {
        self.get_or_create_descendant(labels).zone = Some(zone);
    }

    fn get_or_create_descendant(&mut self, labels: &[String]) -> &mut Self {
        match labels.split_first() {
            None => self,
            Some((first, rest)) => self
                .children
                .entry(first.clone())
                .or_default()
                .get_or_create_descendant(rest),
        }
    }

    /// Finds the zone that is the nearest ancestor of (or equal to) the
    /// name given by `labels`, returning its name and the number of
    /// labels it matched.
    pub fn lookup(&self, labels: &[String]) -> Option<(&str, usize)> {
        self.lookup_at(labels, 0)
    }

    /// Implements lookup. `self` is the deepest node matched so far,
    /// which corresponds to the first `depth` labels.
    fn lookup_at(&self, labels: &[String], depth: usize) -> Option<(&str, usize)> {
        // Try to traverse down the tree. If we can match more labels,
        // then we see if there's a longer match.
        let longer_match = labels
            .get(depth)
            .and_then(|label| self.children.get(label))
            .and_then(|child| child.lookup_at(labels, depth + 1));
        longer_match.or_else(|| self.zone.as_deref().map(|zone| (zone, depth)))
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
