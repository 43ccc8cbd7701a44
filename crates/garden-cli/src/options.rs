//! The `Options` surface described in `spec.md` §6, restated as a `clap`
//! derive parser rather than a Twisted `usage.Options` subclass. Field
//! names mirror `examples/original_source/garden/service/gardener.py` and
//! `garden/service/worker.py` exactly (`worker-endpoint`, `input-endpoint`,
//! `plugin-module` for the gardener; `endpoint` for the worker), plus a
//! `store-uri` field `spec.md` §6 names that the original never got
//! around to wiring up (it hardcoded `InMemoryStore`).

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "garden", about = "Distributed dataflow recomputation engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Listens for workers and, optionally, HTTP input.
    Gardener(GardenerOptions),
    /// Connects to a gardener and executes dispatched work.
    Worker(WorkerOptions),
}

#[derive(Debug, Args)]
pub struct GardenerOptions {
    /// Endpoint on which to listen for worker connections.
    #[arg(long = "worker-endpoint", short = 'e', default_value = "127.0.0.1:9990")]
    pub worker_endpoint: String,

    /// Endpoint on which to accept HTTP input. Omit to run without an
    /// input front end.
    #[arg(long = "input-endpoint", short = 'd')]
    pub input_endpoint: Option<String>,

    /// `memory` for an in-process store, or a file path for a SQLite store.
    #[arg(long = "store-uri", short = 's', default_value = "memory")]
    pub store_uri: String,

    /// Name of the plugin module supplying the Garden's paths. Only the
    /// bundled `demo` plugin is addressable today; unrecognised names fall
    /// back to it with a warning.
    #[arg(long = "plugin-module", short = 'm')]
    pub plugin_module: Option<String>,
}

#[derive(Debug, Args)]
pub struct WorkerOptions {
    /// Endpoint of the gardener to connect to for work.
    #[arg(long = "endpoint", short = 'e', default_value = "127.0.0.1:9990")]
    pub endpoint: String,

    /// Name of the plugin module supplying registered functions. Only the
    /// bundled `demo` plugin is addressable today; unrecognised names fall
    /// back to it with a warning.
    #[arg(long = "plugin-module", short = 'm')]
    pub plugin_module: Option<String>,
}
