//! Runtime tracing infrastructure.
//!
//! The [`RuntimeTracer`] trait defines hook points at the interesting events of the object
//! model: function calls and returns, class construction, instantiation, operator dispatch,
//! raises and module loads. Every hook has a no-op default, so implementations only
//! override what they care about.
//!
//! | Tracer | Purpose |
//! |--------|---------|
//! | [`NoopTracer`] | No-op (default) |
//! | [`StderrTracer`] | Human-readable execution log to stderr |
//! | [`RecordingTracer`] | Full event recording for tests or post-mortem analysis |
//!
//! ```ignore
//! let tracer = RecordingTracer::new();
//! let mut rt = Runtime::new();
//! rt.set_tracer(tracer.clone());
//! // ... run ...
//! let events = tracer.events();
//! ```

use std::{cell::RefCell, fmt, rc::Rc};

use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};

/// Which step of operator dispatch produced the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
pub enum DispatchStrategy {
    /// The left operand's special method handled it.
    Forward,
    /// The right operand's reflected special method handled it.
    Reflected,
    /// Both operands were primitives and the native operator applied.
    Native,
    /// Equality fell back to identity.
    Identity,
    /// Nothing handled the operation; a `TypeError` follows.
    Unsupported,
}

/// Trace event emitted by the runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TraceEvent {
    /// A function call pushed a new frame.
    Call {
        /// Function name.
        name: String,
        /// Call stack depth after the push.
        depth: usize,
    },
    /// A function return popped a frame.
    Return {
        /// Call stack depth after the pop.
        depth: usize,
    },
    /// A class record was built.
    ClassBuilt {
        name: String,
        /// Number of direct bases.
        bases: usize,
        /// Number of resolved attributes.
        attrs: usize,
    },
    /// An instance was allocated.
    Instantiate { class_name: String },
    /// An operator was dispatched.
    Dispatch { op: String, strategy: DispatchStrategy },
    /// An exception was raised (or a native error first crossed a call boundary).
    Raise { exc_type: String },
    /// A module's initializer ran.
    ModuleLoaded { name: String, file: String },
}

/// Trait for runtime tracing. All hooks default to no-ops.
pub trait RuntimeTracer: fmt::Debug {
    /// Called after a frame is pushed.
    #[inline(always)]
    fn on_call(&mut self, _name: &str, _depth: usize) {}

    /// Called after a frame is popped.
    #[inline(always)]
    fn on_return(&mut self, _depth: usize) {}

    #[inline(always)]
    fn on_class_built(&mut self, _name: &str, _bases: usize, _attrs: usize) {}

    #[inline(always)]
    fn on_instantiate(&mut self, _class_name: &str) {}

    /// Called once per operator with the strategy that decided the result.
    #[inline(always)]
    fn on_dispatch(&mut self, _op: &str, _strategy: DispatchStrategy) {}

    #[inline(always)]
    fn on_raise(&mut self, _exc_type: &str) {}

    /// Called before a module initializer runs, on first import and on reload.
    #[inline(always)]
    fn on_module_loaded(&mut self, _name: &str, _file: &str) {}
}

// ============================================================================
// NoopTracer
// ============================================================================

/// Tracer that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl RuntimeTracer for NoopTracer {}

// ============================================================================
// StderrTracer: human-readable log
// ============================================================================

/// Tracer that prints every event to stderr, indented by call depth.
///
/// An optional event limit stops output after that many lines, which keeps runaway loops
/// from flooding the terminal.
#[derive(Debug, Default)]
pub struct StderrTracer {
    limit: Option<usize>,
    emitted: usize,
    depth: usize,
}

impl StderrTracer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stops printing after `limit` events.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    fn emit(&mut self, line: fmt::Arguments<'_>) {
        if self.limit.is_some_and(|limit| self.emitted >= limit) {
            return;
        }
        self.emitted += 1;
        eprintln!("{:indent$}{line}", "", indent = self.depth * 2);
    }
}

impl RuntimeTracer for StderrTracer {
    fn on_call(&mut self, name: &str, depth: usize) {
        self.emit(format_args!("--> CALL {name} (depth={depth})"));
        self.depth = depth;
    }

    fn on_return(&mut self, depth: usize) {
        self.depth = depth;
        self.emit(format_args!("<-- RETURN (depth={depth})"));
    }

    fn on_class_built(&mut self, name: &str, bases: usize, attrs: usize) {
        self.emit(format_args!("+++ CLASS {name} bases={bases} attrs={attrs}"));
    }

    fn on_instantiate(&mut self, class_name: &str) {
        self.emit(format_args!("+++ NEW {class_name}"));
    }

    fn on_dispatch(&mut self, op: &str, strategy: DispatchStrategy) {
        self.emit(format_args!("    OP {op} via {strategy}"));
    }

    fn on_raise(&mut self, exc_type: &str) {
        self.emit(format_args!("!!! RAISE {exc_type}"));
    }

    fn on_module_loaded(&mut self, name: &str, file: &str) {
        self.emit(format_args!("+++ MODULE {name} from {file}"));
    }
}

// ============================================================================
// RecordingTracer: full event log
// ============================================================================

/// Tracer that records every event.
///
/// Clones share the same log, so a caller can keep one handle and install the other in the
/// runtime.
#[derive(Debug, Clone, Default)]
pub struct RecordingTracer {
    events: Rc<RefCell<Vec<TraceEvent>>>,
}

impl RecordingTracer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all events recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.borrow().clone()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    fn push(&self, event: TraceEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl RuntimeTracer for RecordingTracer {
    fn on_call(&mut self, name: &str, depth: usize) {
        self.push(TraceEvent::Call {
            name: name.to_owned(),
            depth,
        });
    }

    fn on_return(&mut self, depth: usize) {
        self.push(TraceEvent::Return { depth });
    }

    fn on_class_built(&mut self, name: &str, bases: usize, attrs: usize) {
        self.push(TraceEvent::ClassBuilt {
            name: name.to_owned(),
            bases,
            attrs,
        });
    }

    fn on_instantiate(&mut self, class_name: &str) {
        self.push(TraceEvent::Instantiate {
            class_name: class_name.to_owned(),
        });
    }

    fn on_dispatch(&mut self, op: &str, strategy: DispatchStrategy) {
        self.push(TraceEvent::Dispatch {
            op: op.to_owned(),
            strategy,
        });
    }

    fn on_raise(&mut self, exc_type: &str) {
        self.push(TraceEvent::Raise {
            exc_type: exc_type.to_owned(),
        });
    }

    fn on_module_loaded(&mut self, name: &str, file: &str) {
        self.push(TraceEvent::ModuleLoaded {
            name: name.to_owned(),
            file: file.to_owned(),
        });
    }
}
