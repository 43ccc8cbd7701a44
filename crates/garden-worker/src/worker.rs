use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use garden_bus::{BusError, GardenMessage, MessageKind, Receiver, Source};
use garden_core::Work;

use crate::registry::{FunctionRegistry, WorkerFn};

/// Which thread the registered function runs on. Both policies expose the
/// same receive/emit contract; the choice is a policy of the host process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionPolicy {
    /// Runs the function inline on the caller's task. Intended for tests
    /// and trivially-fast functions.
    Blocking,
    /// Runs the function on the tokio blocking thread pool via
    /// `spawn_blocking`. The registered function is assumed thread-safe,
    /// or the pool is effectively sized 1 by the caller's own scheduling.
    Pooled,
}

/// Executes registered functions against incoming `Work` and emits the
/// `Result`/`ResultError` it produces. A `Worker` is both a bus `Source`
/// (it provides `Result` and `ResultError`) and a bus `Receiver` (it
/// accepts `Work`).
pub struct Worker {
    registry: FunctionRegistry,
    policy: ExecutionPolicy,
    source: Source,
}

impl Worker {
    pub fn new(policy: ExecutionPolicy) -> Self {
        Self {
            registry: FunctionRegistry::new(),
            policy,
            source: Source::new([MessageKind::Result, MessageKind::ResultError]),
        }
    }

    pub fn register_function(
        &mut self,
        name: impl Into<String>,
        version: impl Into<String>,
        function: WorkerFn,
    ) {
        self.registry.register_function(name, version, function);
    }

    /// Connects `receiver` to this worker's `Result`/`ResultError` output.
    pub fn subscribe(&self, receiver: Arc<dyn Receiver>) -> Result<Vec<MessageKind>, BusError> {
        self.source.subscribe(receiver)
    }

    async fn run(&self, function: WorkerFn, args: Vec<String>) -> Result<String, String> {
        match self.policy {
            ExecutionPolicy::Blocking => function(&args),
            ExecutionPolicy::Pooled => tokio::task::spawn_blocking(move || function(&args))
                .await
                .expect("worker pool task panicked"),
        }
    }

    /// Resolves the registered function for `work`, executes it, and emits
    /// the resulting `Result` or `ResultError`. Resolution failure (no
    /// function registered) is a fatal programmer error: it is reported
    /// and nothing is emitted that could loop.
    pub async fn receive_work(&self, work: Work) -> Result<(), BusError> {
        let function = self
            .registry
            .get(&work.name, &work.version)
            .unwrap_or_else(|| {
                panic!(
                    "no function registered for path ({}, {})",
                    work.name, work.version
                )
            });
        let args: Vec<String> = work.inputs.iter().map(|i| i.value.clone()).collect();

        let message = match self.run(function, args).await {
            Ok(value) => {
                log::debug!(
                    "worker produced result for {}/{}/{} lineage {}",
                    work.entity,
                    work.name,
                    work.version,
                    work.lineage
                );
                GardenMessage::Result(work.into_result(value))
            }
            Err(error) => {
                log::warn!(
                    "worker function failed for {}/{}/{} lineage {}: {error}",
                    work.entity,
                    work.name,
                    work.version,
                    work.lineage
                );
                GardenMessage::ResultError(work.into_result_error(error))
            }
        };
        self.source.emit(message).await
    }
}

#[async_trait]
impl Receiver for Worker {
    fn receiver_mapping(&self) -> HashSet<MessageKind> {
        [MessageKind::Work].into_iter().collect()
    }

    async fn receive(&self, message: GardenMessage) -> Result<(), BusError> {
        match message {
            GardenMessage::Work(work) => self.receive_work(work).await,
            other => panic!(
                "worker received a message kind it never subscribed to: {:?}",
                other.kind()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use garden_core::WorkInput;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct CollectingReceiver {
        messages: Mutex<Vec<GardenMessage>>,
    }

    #[async_trait]
    impl Receiver for CollectingReceiver {
        fn receiver_mapping(&self) -> HashSet<MessageKind> {
            [MessageKind::Result, MessageKind::ResultError].into_iter().collect()
        }

        async fn receive(&self, message: GardenMessage) -> Result<(), BusError> {
            self.messages.lock().unwrap().push(message);
            Ok(())
        }
    }

    fn sample_work() -> Work {
        Work::new(
            "joe",
            "cake",
            "1",
            "L",
            vec![WorkInput::new("flour", "1", "Lf", "wheat")],
        )
    }

    #[tokio::test]
    async fn blocking_worker_emits_result_on_success() {
        let mut worker = Worker::new(ExecutionPolicy::Blocking);
        worker.register_function(
            "cake",
            "1",
            Arc::new(|args: &[String]| Ok(format!("baked:{}", args[0]))),
        );
        let sink = Arc::new(CollectingReceiver {
            messages: Mutex::new(Vec::new()),
        });
        worker.subscribe(sink.clone()).unwrap();

        worker.receive_work(sample_work()).await.unwrap();

        let messages = sink.messages.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert!(matches!(&messages[0], GardenMessage::Result(r) if r.value == "baked:wheat"));
    }

    #[tokio::test]
    async fn blocking_worker_emits_result_error_on_failure() {
        let mut worker = Worker::new(ExecutionPolicy::Blocking);
        worker.register_function("cake", "1", Arc::new(|_: &[String]| Err("oven broke".to_string())));
        let sink = Arc::new(CollectingReceiver {
            messages: Mutex::new(Vec::new()),
        });
        worker.subscribe(sink.clone()).unwrap();

        worker.receive_work(sample_work()).await.unwrap();

        let messages = sink.messages.lock().unwrap();
        assert!(matches!(&messages[0], GardenMessage::ResultError(e) if e.error == "oven broke"));
    }

    #[tokio::test]
    async fn pooled_worker_runs_function_off_the_caller_task() {
        let mut worker = Worker::new(ExecutionPolicy::Pooled);
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        worker.register_function(
            "cake",
            "1",
            Arc::new(move |args: &[String]| {
                calls_clone.fetch_add(1, Ordering::SeqCst);
                Ok(args[0].clone())
            }),
        );
        let sink = Arc::new(CollectingReceiver {
            messages: Mutex::new(Vec::new()),
        });
        worker.subscribe(sink.clone()).unwrap();

        worker.receive_work(sample_work()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    #[should_panic(expected = "no function registered")]
    async fn unresolved_function_is_a_fatal_programmer_error() {
        let worker = Worker::new(ExecutionPolicy::Blocking);
        let _ = worker.receive_work(sample_work()).await;
    }
}
