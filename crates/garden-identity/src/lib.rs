//! Lineal hash identity.
//!
//! A lineal hash names a piece of data by its declared `(name, version)`
//! and, for derived data, the lineal hashes of the inputs it was computed
//! from. Two data points with the same lineal hash are considered the
//! same derivation, even if they were produced by different workers at
//! different times.

use sha1::{Digest, Sha1};

/// A SHA1 digest rendered as a lowercase hex string.
pub type LinealHash = String;

fn sha1_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// `LinealHash(name, version) = SHA1(SHA1(name)_hex || version)`.
pub fn lineal_hash(name: &str, version: &str) -> LinealHash {
    let name_digest = sha1_hex(name.as_bytes());
    let mut input = String::with_capacity(name_digest.len() + version.len());
    input.push_str(&name_digest);
    input.push_str(version);
    sha1_hex(input.as_bytes())
}

/// `LinealHash(name, version, [h1..hn]) = SHA1(LinealHash(name,version) || h1 || .. || hn)`,
/// with the `hi` in the declared input order.
pub fn lineal_hash_with_inputs<I>(name: &str, version: &str, input_lineages: I) -> LinealHash
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let base = lineal_hash(name, version);
    let mut input = base;
    for h in input_lineages {
        input.push_str(h.as_ref());
    }
    sha1_hex(input.as_bytes())
}
