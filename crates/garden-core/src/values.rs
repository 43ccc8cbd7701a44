//! Immutable value types carried through the garden pipeline, and the
//! named total conversions between them.
//!
//! None of these types is ever mutated in place; each stage produces a new
//! value from the one before it.

use garden_identity::{lineal_hash, lineal_hash_with_inputs, LinealHash};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

fn sha1_hex(value: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(value.as_bytes());
    hex::encode(hasher.finalize())
}

/// An external fact fed into the garden for a given entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Input {
    pub entity: String,
    pub name: String,
    pub version: String,
    pub value: String,
}

impl Input {
    pub fn new(
        entity: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            entity: entity.into(),
            name: name.into(),
            version: version.into(),
            value: value.into(),
        }
    }

    /// Input -> Data: lineage is the non-derived lineal hash of `(name, version)`.
    pub fn into_data(self) -> Data {
        let lineage = lineal_hash(&self.name, &self.version);
        Data {
            entity: self.entity,
            name: self.name,
            version: self.version,
            lineage,
            value: self.value,
        }
    }
}

/// A stored fact: an `Input` or a validated `Result`, tagged with provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Data {
    pub entity: String,
    pub name: String,
    pub version: String,
    pub lineage: LinealHash,
    pub value: String,
}

impl Data {
    /// Data -> WorkInput: computes `hash = SHA1(value)`.
    pub fn into_work_input(self) -> WorkInput {
        let hash = sha1_hex(&self.value);
        WorkInput {
            name: self.name,
            version: self.version,
            lineage: self.lineage,
            value: self.value,
            hash,
        }
    }
}

/// A piece of data carried into a computation, with its value hash attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkInput {
    pub name: String,
    pub version: String,
    pub lineage: LinealHash,
    pub value: String,
    pub hash: String,
}

impl WorkInput {
    /// Computes `hash` for a value supplied without one.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        lineage: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        let value = value.into();
        let hash = sha1_hex(&value);
        Self {
            name: name.into(),
            version: version.into(),
            lineage: lineage.into(),
            value,
            hash,
        }
    }

    /// WorkInput -> ResultInput: drops `value`.
    pub fn into_result_input(self) -> ResultInput {
        ResultInput {
            name: self.name,
            version: self.version,
            lineage: self.lineage,
            hash: self.hash,
        }
    }
}

/// A concrete instance of a recipe with input values filled in, awaiting
/// execution by a worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Work {
    pub entity: String,
    pub name: String,
    pub version: String,
    pub lineage: LinealHash,
    pub inputs: Vec<WorkInput>,
}

impl Work {
    pub fn new(
        entity: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
        lineage: impl Into<String>,
        inputs: Vec<WorkInput>,
    ) -> Self {
        Self {
            entity: entity.into(),
            name: name.into(),
            version: version.into(),
            lineage: lineage.into(),
            inputs,
        }
    }

    /// Computes the lineage of a Work produced from `inputs` under
    /// `(name, version)`: `LinealHash(name, version, [input lineages])`.
    pub fn lineage_for(name: &str, version: &str, inputs: &[WorkInput]) -> LinealHash {
        lineal_hash_with_inputs(name, version, inputs.iter().map(|i| i.lineage.as_str()))
    }

    /// Work -> Result(value): the worker's successful reply.
    pub fn into_result(self, value: impl Into<String>) -> WorkResult {
        WorkResult {
            entity: self.entity,
            name: self.name,
            version: self.version,
            lineage: self.lineage,
            value: value.into(),
            inputs: self.inputs.into_iter().map(WorkInput::into_result_input).collect(),
        }
    }

    /// Work -> ResultError(err): the worker's failed reply.
    pub fn into_result_error(self, error: impl Into<String>) -> ResultError {
        ResultError {
            entity: self.entity,
            name: self.name,
            version: self.version,
            lineage: self.lineage,
            error: error.into(),
            inputs: self.inputs.into_iter().map(WorkInput::into_result_input).collect(),
        }
    }
}

/// `WorkInput` minus its value: enough to validate freshness without
/// shipping the value back over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultInput {
    pub name: String,
    pub version: String,
    pub lineage: LinealHash,
    pub hash: String,
}

impl ResultInput {
    /// ResultInput -> WorkInput: reattaches a value. Identity on the fields
    /// the two types share (`name`, `version`, `lineage`, `hash`) when the
    /// reattached value hashes to the same `hash`.
    pub fn reattach_value(self, value: impl Into<String>) -> WorkInput {
        WorkInput {
            name: self.name,
            version: self.version,
            lineage: self.lineage,
            value: value.into(),
            hash: self.hash,
        }
    }
}

/// The worker's successful reply to a `Work`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkResult {
    pub entity: String,
    pub name: String,
    pub version: String,
    pub lineage: LinealHash,
    pub value: String,
    pub inputs: Vec<ResultInput>,
}

impl WorkResult {
    /// Result -> Data.
    pub fn into_data(self) -> Data {
        Data {
            entity: self.entity,
            name: self.name,
            version: self.version,
            lineage: self.lineage,
            value: self.value,
        }
    }
}

/// The worker's failed reply to a `Work`: the registered function raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultError {
    pub entity: String,
    pub name: String,
    pub version: String,
    pub lineage: LinealHash,
    pub error: String,
    pub inputs: Vec<ResultInput>,
}
