//! Value types, their conversions, and the path DAG shared by every other
//! garden crate.

pub mod error;
pub mod garden;
pub mod values;

pub use error::CycleError;
pub use garden::{Garden, PathRef, Recipe};
pub use values::{Data, Input, ResultError, ResultInput, Work, WorkInput, WorkResult};

pub use garden_identity::{lineal_hash, lineal_hash_with_inputs, LinealHash};

/// `SHA1(value)` as a lowercase hex string — the same hash `WorkInput`/
/// `ResultInput` carry, exposed for callers that need to recompute it (for
/// example `InvalidResultFilter`'s freshness check).
pub fn hash_value(value: &str) -> String {
    use sha1::{Digest, Sha1};
    let mut hasher = Sha1::new();
    hasher.update(value.as_bytes());
    hex::encode(hasher.finalize())
}
