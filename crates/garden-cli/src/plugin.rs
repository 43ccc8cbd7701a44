//! Loading a "plugin module" (`spec.md` §6's `plugin-module` option).
//!
//! User-supplied computation functions are a pure black box per `spec.md`
//! §1's scope — this workspace does not implement dynamic module loading
//! for them. What it does provide is one bundled demo plugin, addressed by
//! name, standing in for the module the original imports with `__import__`
//! in `examples/original_source/garden/service/gardener.py`.

use std::sync::Arc;

use garden_core::Garden;
use garden_worker::Worker;

const DEMO: &str = "demo";

/// Builds the `Garden` a named plugin module declares. Unknown names fall
/// back to the demo garden with a warning rather than failing outright —
/// a missing plugin shouldn't prevent the gardener from starting with
/// whatever paths it does know.
pub fn garden_for(plugin_module: Option<&str>) -> Garden {
    match plugin_module {
        None | Some(DEMO) => demo_garden(),
        Some(other) => {
            log::warn!("unknown plugin module {other:?}; falling back to the demo garden");
            demo_garden()
        }
    }
}

/// Registers the functions a named plugin module supplies on `worker`.
pub fn register_functions(worker: &mut Worker, plugin_module: Option<&str>) {
    match plugin_module {
        None | Some(DEMO) => register_demo_functions(worker),
        Some(other) => {
            log::warn!("unknown plugin module {other:?}; falling back to the demo functions");
            register_demo_functions(worker);
        }
    }
}

fn demo_garden() -> Garden {
    let mut garden = Garden::new();
    garden
        .add_path("cake", "1", vec![("flour".into(), "1".into())])
        .expect("the bundled demo garden has no cycles");
    garden
}

fn register_demo_functions(worker: &mut Worker) {
    worker.register_function(
        "cake",
        "1",
        Arc::new(|args: &[String]| Ok(format!("baked:{}", args[0]))),
    );
}
