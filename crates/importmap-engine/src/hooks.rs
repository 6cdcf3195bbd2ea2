use serde_json::Value;
use std::sync::Arc;

/// Receives the wrapped import map and returns the value to continue with
pub type BeforeEmitHook = Arc<dyn Fn(Value) -> Value + Send + Sync>;
pub type AfterEmitHook = Arc<dyn Fn(&Value) + Send + Sync>;

/// Extension points around emission. `before_emit` hooks run in order on
/// every pass, each receiving the previous hook's result; `after_emit` hooks
/// observe the value of every pass once it is done.
#[derive(Clone, Default)]
pub struct EmitHooks {
    before_emit: Vec<BeforeEmitHook>,
    after_emit: Vec<AfterEmitHook>,
}

impl EmitHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tap_before_emit(&mut self, hook: impl Fn(Value) -> Value + Send + Sync + 'static) {
        self.before_emit.push(Arc::new(hook));
    }

    pub fn tap_after_emit(&mut self, hook: impl Fn(&Value) + Send + Sync + 'static) {
        self.after_emit.push(Arc::new(hook));
    }

    pub(crate) fn before_emit(&self, import_map: Value) -> Value {
        self.before_emit
            .iter()
            .fold(import_map, |value, hook| hook(value))
    }

    pub(crate) fn after_emit(&self, import_map: &Value) {
        for hook in &self.after_emit {
            hook(import_map);
        }
    }
}
