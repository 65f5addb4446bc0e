use std::{
    cell::RefCell,
    io::{self, Write as _},
    rc::Rc,
};

/// Trait for handling output from the `print` builtin.
///
/// Implement this trait to capture or redirect output. The default implementation
/// [`StdPrint`] writes to stdout.
pub trait PrintWriter {
    /// Called once for each formatted argument passed to `print`.
    ///
    /// Writes only the argument's text; separators and the trailing newline are emitted via
    /// [`stdout_push`](Self::stdout_push).
    fn stdout_write(&mut self, output: &str);

    /// Adds a single character, used for separators and line ends.
    fn stdout_push(&mut self, end: char);
}

/// Default `PrintWriter` that writes to stdout.
#[derive(Debug, Default)]
pub struct StdPrint;

impl PrintWriter for StdPrint {
    fn stdout_write(&mut self, output: &str) {
        let _ = io::stdout().write_all(output.as_bytes());
    }

    fn stdout_push(&mut self, end: char) {
        let mut buf = [0; 4];
        let _ = io::stdout().write_all(end.encode_utf8(&mut buf).as_bytes());
        if end == '\n' {
            let _ = io::stdout().flush();
        }
    }
}

/// A `PrintWriter` that collects all output into a string.
///
/// Clones share the buffer: keep one handle and install the other in the runtime.
#[derive(Debug, Clone, Default)]
pub struct CollectStringPrint {
    output: Rc<RefCell<String>>,
}

impl CollectStringPrint {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything printed so far.
    #[must_use]
    pub fn output(&self) -> String {
        self.output.borrow().clone()
    }
}

impl PrintWriter for CollectStringPrint {
    fn stdout_write(&mut self, output: &str) {
        self.output.borrow_mut().push_str(output);
    }

    fn stdout_push(&mut self, end: char) {
        self.output.borrow_mut().push(end);
    }
}

/// `PrintWriter` that ignores all output.
#[derive(Debug, Default)]
pub struct NoPrint;

impl PrintWriter for NoPrint {
    fn stdout_write(&mut self, _output: &str) {}

    fn stdout_push(&mut self, _end: char) {}
}
