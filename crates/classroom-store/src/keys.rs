//! Key encoding utilities for `RocksDB`.
//!
//! Identifiers never contain NUL (see `classroom_core::ids`), so NUL is used
//! to separate the parts of composite index keys. Every owner prefix ends in
//! a separator, which is what keeps `course_1` from matching `course_10`.

const SEP: u8 = 0;

/// Create a primary key from a record id.
#[must_use]
pub fn record_key(id: &str) -> Vec<u8> {
    id.as_bytes().to_vec()
}

/// Create a prefix covering every index entry under the given owner parts.
///
/// Format: `part_1 || 0x00 || part_2 || 0x00 || ...`
#[must_use]
pub fn owner_prefix(owner: &[&str]) -> Vec<u8> {
    let len = owner.iter().map(|p| p.len() + 1).sum();
    let mut key = Vec::with_capacity(len);
    for part in owner {
        key.extend_from_slice(part.as_bytes());
        key.push(SEP);
    }
    key
}

/// Create an index key: the owner prefix followed by the record id.
#[must_use]
pub fn index_key(owner: &[&str], id: &str) -> Vec<u8> {
    let mut key = owner_prefix(owner);
    key.extend_from_slice(id.as_bytes());
    key
}

/// Extract the record id from an index key, given the prefix it was found under.
///
/// Returns `None` if the key does not start with `prefix` or the remainder is
/// not valid UTF-8.
#[must_use]
pub fn id_from_index_key(key: &[u8], prefix: &[u8]) -> Option<String> {
    let rest = key.strip_prefix(prefix)?;
    String::from_utf8(rest.to_vec()).ok()
}
