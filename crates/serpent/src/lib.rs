//! A class-based dynamic object runtime.
//!
//! `serpent` provides the object model of a dynamically typed, class-based language as a
//! library: classes with multiple inheritance, descriptor-based method binding, a
//! left/right operator dispatch protocol with a `NotImplemented` sentinel, the iterator
//! protocol, and the built-in `list`, `tuple`, `dict` and `str` containers built on top of
//! those primitives. Everything is driven through a [`Runtime`] value which owns the class
//! arena, the module registry and the diagnostics hooks.
#![expect(clippy::cast_possible_truncation, reason = "numeric narrowing is checked")]
#![expect(clippy::cast_sign_loss, reason = "sign-changing casts are intentional")]
#![expect(clippy::cast_possible_wrap, reason = "index arithmetic mirrors the language")]
#![expect(clippy::needless_pass_by_value, reason = "native call signatures are uniform")]
#![expect(clippy::unnecessary_wraps, reason = "dispatch signatures are uniform")]

mod heap;

mod builtins;
mod exception_private;
mod exception_public;
mod function;
mod io;
mod modules;
mod namespace;
mod resource;
mod runtime;
pub mod tracer;
mod types;
mod value;

pub use crate::{
    builtins::BuiltinFunction,
    exception_private::{ExcType, RunError, RunResult, SimpleException},
    exception_public::{Exception, StackFrame},
    function::{Function, Signature, unpack},
    heap::{ClassId, Heap, HeapStats},
    io::{CollectStringPrint, NoPrint, PrintWriter, StdPrint},
    modules::{ModuleInit, ModuleRef, path},
    namespace::Namespace,
    resource::{
        LARGE_RESULT_THRESHOLD, LimitedTracker, NoLimitTracker, ResourceError, ResourceLimits, ResourceTracker,
    },
    runtime::{AttributeBinding, BinaryOp, CompareOp, OperatorResult, Runtime, RuntimeConfig},
    tracer::{DispatchStrategy, NoopTracer, RecordingTracer, RuntimeTracer, StderrTracer, TraceEvent},
    types::{BindTarget, ClassAttr, ClassRecord, Descriptor, ForIter, InstanceRef, Slice, bind},
    value::Value,
};
