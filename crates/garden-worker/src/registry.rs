use std::collections::HashMap;
use std::sync::Arc;

/// A registered computation: takes the ordered argument values a `Work`
/// carries and produces a value, or an error string, matching the
/// original's plugin functions (which return a value or raise).
pub type WorkerFn = Arc<dyn Fn(&[String]) -> Result<String, String> + Send + Sync>;

/// Maps `(name, version)` to the function that computes that path.
#[derive(Default, Clone)]
pub struct FunctionRegistry {
    functions: HashMap<(String, String), WorkerFn>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_function(
        &mut self,
        name: impl Into<String>,
        version: impl Into<String>,
        function: WorkerFn,
    ) {
        self.functions.insert((name.into(), version.into()), function);
    }

    pub fn get(&self, name: &str, version: &str) -> Option<WorkerFn> {
        self.functions
            .get(&(name.to_string(), version.to_string()))
            .cloned()
    }
}
