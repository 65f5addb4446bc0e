use std::fmt::{self, Write as _};

use serde::{Deserialize, Serialize};

/// One entry of the runtime call stack.
///
/// Frames are pushed on function entry and popped on return; exceptions keep a copy of the
/// stack as it was when they were raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackFrame {
    name: String,
    module: Option<String>,
}

impl StackFrame {
    #[must_use]
    pub fn new(name: impl Into<String>, module: Option<&str>) -> Self {
        Self {
            name: name.into(),
            module: module.map(str::to_owned),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let module = self.module.as_deref().unwrap_or("<native>");
        write!(f, "  File \"{module}\", in {}", self.name)
    }
}

/// A raised exception detached from the runtime that produced it.
///
/// Built by [`Runtime::describe_error`](crate::Runtime::describe_error); it carries only
/// strings so it can be logged, serialized or returned across an API boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exception {
    type_name: String,
    message: Option<String>,
    traceback: Vec<StackFrame>,
}

impl Exception {
    #[must_use]
    pub fn new(type_name: impl Into<String>, message: Option<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message,
            traceback: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_traceback(mut self, traceback: Vec<StackFrame>) -> Self {
        self.traceback = traceback;
        self
    }

    /// Class name of the exception, e.g. `"KeyError"` or a user-defined class name.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    #[must_use]
    pub fn into_message(self) -> Option<String> {
        self.message
    }

    /// Call stack at raise time, outermost frame first.
    #[must_use]
    pub fn traceback(&self) -> &[StackFrame] {
        &self.traceback
    }

    /// Renders the familiar multi-line traceback ending with the summary line.
    #[must_use]
    pub fn format_traceback(&self) -> String {
        let mut out = String::from("Traceback (most recent call last):\n");
        for frame in &self.traceback {
            // writing to a String cannot fail
            let _ = writeln!(out, "{frame}");
        }
        let _ = write!(out, "{self}");
        out
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message.as_deref() {
            Some(msg) if !msg.is_empty() => write!(f, "{}: {msg}", self.type_name),
            _ => f.write_str(&self.type_name),
        }
    }
}

impl std::error::Error for Exception {}
