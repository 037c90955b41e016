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

//! Crate-private utilities.

/// A wrapper around [`str`] references whose [`PartialEq`] and [`Eq`]
/// implementations are ASCII-case-insensitive.
pub struct Caseless<'a>(pub &'a str);

impl PartialEq for Caseless<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(other.0)
    }
}

impl Eq for Caseless<'_> {}

/// Converts a nibble into an ASCII hex character. Lower-case hex digits
/// are used. The passed value must be less than 16.
pub fn nibble_to_ascii_hex_digit(nibble: u8) -> u8 {
    assert!(nibble < 16);
    if nibble < 10 {
        b'0' + nibble
    } else {
        b'a' + nibble - 10
    }
}

/// Writes `octets` as lower-case hexadecimal text.
pub fn hex(octets: &[u8]) -> String {
    let mut text = String::with_capacity(octets.len() * 2);
    for octet in octets {
        text.push(char::from(nibble_to_ascii_hex_digit(octet >> 4)));
        text.push(char::from(nibble_to_ascii_hex_digit(octet & 0xf)));
    }
    text
}

/// Normalizes a domain name to fully-qualified form: surrounding
/// whitespace is removed and a trailing dot is appended if missing.
/// Case is preserved; comparisons elsewhere are case-insensitive.
pub fn fqdn(name: &str) -> String {
    let name = name.trim();
    if name.ends_with('.') {
        name.to_owned()
    } else {
        format!("{}.", name)
    }
}

/// Returns the key under which a case-insensitively unique name is
/// indexed.
pub fn name_key(name: &str) -> String {
    name.to_ascii_lowercase()
}

/// Returns the labels of a fully-qualified domain name from the root
/// downward, lower-cased. The root name yields no labels.
pub fn labels_from_root(fqdn: &str) -> Vec<String> {
    let trimmed = fqdn.trim_end_matches('.');
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.rsplit('.').map(name_key).collect()
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fqdn_appends_trailing_dot_once() {
        assert_eq!(fqdn("foo.example"), "foo.example.");
        assert_eq!(fqdn(" foo.example. "), "foo.example.");
    }

    #[test]
    fn labels_from_root_works() {
        assert_eq!(labels_from_root("Foo.Example."), ["example", "foo"]);
        assert!(labels_from_root(".").is_empty());
    }

    #[test]
    fn hex_works() {
        assert_eq!(hex(&[0x00, 0x9f, 0xa0]), "009fa0");
    }
}
