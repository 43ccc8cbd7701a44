//! Worker: executes registered functions against dispatched `Work`.

pub mod registry;
pub mod worker;

pub use registry::{FunctionRegistry, WorkerFn};
pub use worker::{ExecutionPolicy, Worker};
