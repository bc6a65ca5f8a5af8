//! Type name to processor dispatch table.
//!
//! Registration is an explicit map owned by the [`Inliner`], never shared
//! global state. Custom tasks appended to a type run after its built-in
//! tasks and are removed by the handle returned at registration, not by
//! function identity.
//!
//! [`Inliner`]: crate::Inliner

use std::collections::HashMap;
use std::sync::Arc;

use crate::options::{CompressConfig, InlineOptions};
use crate::resolver::FileRecord;

use super::Engine;

/// Task enable condition, evaluated once when the file's task list is built.
pub type EnableFn = Arc<dyn Fn(&FileRecord, &InlineOptions) -> bool + Send + Sync>;

/// One rewrite pass over a file's content. The returned text replaces the
/// file's content before the next task runs.
pub type TaskFn = Arc<
    dyn Fn(&mut Engine<'_>, &mut FileRecord, &InlineOptions) -> anyhow::Result<String>
        + Send
        + Sync,
>;

/// A type's built-in compression hook.
pub type ProcessorCompressFn =
    Arc<dyn Fn(&FileRecord, &CompressConfig) -> anyhow::Result<String> + Send + Sync>;

/// A task paired with its enable condition.
#[derive(Clone)]
pub struct TaskDecl {
    pub enabled: EnableFn,
    pub run: TaskFn,
}

impl TaskDecl {
    #[must_use]
    pub fn new(enabled: EnableFn, run: TaskFn) -> Self {
        TaskDecl { enabled, run }
    }

    /// A task that is always enabled.
    #[must_use]
    pub fn always(run: TaskFn) -> Self {
        TaskDecl {
            enabled: Arc::new(|_, _| true),
            run,
        }
    }
}

/// Everything the engine needs to process one semantic type.
#[derive(Clone, Default)]
pub struct ProcessorSpec {
    /// Built-in tasks, in execution order.
    pub tasks: Vec<TaskDecl>,
    /// Fallback compressor when the run options carry no custom one.
    pub compress: Option<ProcessorCompressFn>,
}

/// Stable identity of a custom-registered task.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskHandle {
    type_name: String,
    id: u64,
}

impl TaskHandle {
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }
}

/// The dispatch table: semantic type name to [`ProcessorSpec`], plus the
/// per-type custom task lists.
pub struct ProcessorRegistry {
    processors: HashMap<String, ProcessorSpec>,
    custom_tasks: HashMap<String, Vec<(u64, TaskDecl)>>,
    next_task_id: u64,
}

impl ProcessorRegistry {
    /// An empty registry with no types at all.
    #[must_use]
    pub fn empty() -> Self {
        ProcessorRegistry {
            processors: HashMap::new(),
            custom_tasks: HashMap::new(),
            next_task_id: 0,
        }
    }

    /// The registry with the six built-in types.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = ProcessorRegistry::empty();
        registry.register("css", crate::processors::style::spec());
        registry.register("html", crate::processors::markup::spec());
        registry.register("js", crate::processors::script::spec());
        registry.register("img", crate::processors::binary::img_spec());
        registry.register("font", crate::processors::binary::font_spec());
        registry.register("svg", crate::processors::vector::spec());
        registry
    }

    /// Register (or replace) the processor for a type name.
    pub fn register(&mut self, type_name: impl Into<String>, spec: ProcessorSpec) {
        self.processors.insert(type_name.into(), spec);
    }

    #[must_use]
    pub fn get(&self, type_name: &str) -> Option<&ProcessorSpec> {
        self.processors.get(type_name)
    }

    /// Append a custom task to a type; it runs after the built-in tasks.
    pub fn add_task(&mut self, type_name: impl Into<String>, task: TaskDecl) -> TaskHandle {
        let type_name = type_name.into();
        let id = self.next_task_id;
        self.next_task_id += 1;
        self.custom_tasks
            .entry(type_name.clone())
            .or_default()
            .push((id, task));
        TaskHandle { type_name, id }
    }

    /// Remove a previously added custom task. Returns whether it was found.
    pub fn remove_task(&mut self, handle: &TaskHandle) -> bool {
        match self.custom_tasks.get_mut(&handle.type_name) {
            Some(tasks) => {
                let before = tasks.len();
                tasks.retain(|(id, _)| *id != handle.id);
                tasks.len() != before
            }
            None => false,
        }
    }

    /// The custom tasks registered for a type, in registration order.
    pub fn custom_tasks(&self, type_name: &str) -> impl Iterator<Item = &TaskDecl> {
        self.custom_tasks
            .get(type_name)
            .into_iter()
            .flat_map(|tasks| tasks.iter().map(|(_, task)| task))
    }
}

impl Default for ProcessorRegistry {
    fn default() -> Self {
        ProcessorRegistry::with_builtins()
    }
}
