//! The `gardener`/`worker` CLI surface described in `spec.md` §6. Each
//! subcommand wires the library crates together; neither owns any
//! engineering of its own. This is the idiomatic Rust restatement of the
//! original's Twisted `tap` plugins
//! (`examples/original_source/garden/service/gardener.py`,
//! `garden/service/worker.py`).

mod error;
mod options;
mod plugin;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use garden_gardener::Gardener;
use garden_store::{DataStore, InMemoryStore, SqliteStore};
use garden_transport::{GardenerTransport, WorkerClient};
use garden_worker::{ExecutionPolicy, Worker};

use error::CliError;
use options::{Cli, Command, GardenerOptions, WorkerOptions};

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Gardener(opts) => run_gardener(opts).await,
        Command::Worker(opts) => run_worker(opts).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn build_store(uri: &str) -> Result<Arc<dyn DataStore>, CliError> {
    if uri == "memory" {
        Ok(Arc::new(InMemoryStore::new()))
    } else {
        Ok(Arc::new(SqliteStore::open(uri)?))
    }
}

/// Listens for workers and, optionally, HTTP input. Mutually subscribes a
/// `Gardener` and a `GardenerTransport` so derived `Work` reaches whichever
/// worker sessions are attached and their replies flow back through
/// validation, exactly as `spec.md` §4.10 describes.
async fn run_gardener(opts: GardenerOptions) -> Result<(), CliError> {
    let garden = Arc::new(plugin::garden_for(opts.plugin_module.as_deref()));
    let store = build_store(&opts.store_uri)?;
    let gardener = Gardener::new(garden, store)?;

    let transport = GardenerTransport::new();
    gardener.subscribe_work_sink(transport.clone())?;
    transport.subscribe(gardener.clone())?;

    let worker_endpoint = opts.worker_endpoint.clone();
    let listening_transport = transport.clone();
    let listen_task = tokio::spawn(async move {
        if let Err(err) = listening_transport.listen(worker_endpoint).await {
            log::error!("worker listener stopped: {err}");
        }
    });

    match opts.input_endpoint {
        Some(input_endpoint) => {
            let addr: std::net::SocketAddr = input_endpoint.parse()?;
            garden_http::serve(gardener, addr).await?;
        }
        None => {
            listen_task.await?;
        }
    }

    Ok(())
}

/// Connects to a gardener's worker endpoint and runs dispatched `Work`
/// through a blocking worker, forever, reconnecting on disconnect.
async fn run_worker(opts: WorkerOptions) -> Result<(), CliError> {
    let mut worker = Worker::new(ExecutionPolicy::Blocking);
    plugin::register_functions(&mut worker, opts.plugin_module.as_deref());
    let worker = Arc::new(worker);

    log::info!("connecting to gardener at {}", opts.endpoint);
    let client = WorkerClient::new(opts.endpoint);
    client.run(worker).await?;
    Ok(())
}
