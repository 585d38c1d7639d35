use std::io::{self, Write};
use std::sync::Mutex;

use log::info;

/// Sink for the message the allocator emits on every call.
///
/// The allocator does not care where the message goes: the
/// default writes it to standard output, but it can be routed
/// through the logger, recorded for tests, or dropped.
pub trait Diagnostic: Send + Sync {
    fn emit(&self, message: &str);
}

/// Writes each message on its own line to standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct Stdout;

impl Diagnostic for Stdout {
    fn emit(&self, message: &str) {
        // Locking stdout keeps the message and its newline
        // together when several threads allocate at once. A
        // closed or broken stream must not turn an allocation
        // into a panic, so write errors are dropped.
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "{message}");
        let _ = stdout.flush();
    }
}

/// Routes each message through the `log` facade at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct Log;

impl Diagnostic for Log {
    fn emit(&self, message: &str) {
        info!(target: "bufalloc", "{message}");
    }
}

/// Discards every message.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Diagnostic for Silent {
    fn emit(&self, _message: &str) {}
}

/// Keeps every emitted message in memory.
///
/// Useful in tests to assert on emission without capturing a
/// real output stream.
#[derive(Debug, Default)]
pub struct Recorder {
    messages: Mutex<Vec<String>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all messages recorded so far, oldest first.
    pub fn messages(&self) -> Vec<String> {
        self.lock().clone()
    }

    /// Number of messages recorded so far.
    pub fn count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        // A panic while holding the lock cannot leave the vector
        // half-written, so a poisoned lock is still usable.
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Diagnostic for Recorder {
    fn emit(&self, message: &str) {
        self.lock().push(message.to_owned());
    }
}

impl<T: Diagnostic + ?Sized> Diagnostic for &T {
    fn emit(&self, message: &str) {
        (**self).emit(message)
    }
}

impl<T: Diagnostic + ?Sized> Diagnostic for Box<T> {
    fn emit(&self, message: &str) {
        (**self).emit(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_keeps_messages_in_order() {
        let recorder = Recorder::new();
        recorder.emit("first");
        recorder.emit("second");

        assert_eq!(recorder.count(), 2);
        assert_eq!(recorder.messages(), vec!["first", "second"]);
    }

    #[test]
    fn borrowed_recorder_records_into_the_original() {
        let recorder = Recorder::new();
        let borrowed: &Recorder = &recorder;
        Diagnostic::emit(&borrowed, "garbage compiler");

        assert_eq!(recorder.count(), 1);
    }

    #[test]
    fn boxed_diagnostic_forwards() {
        let recorder = Recorder::new();
        {
            let boxed: Box<dyn Diagnostic + '_> = Box::new(&recorder);
            boxed.emit("boxed");
        }
        assert_eq!(recorder.messages(), vec!["boxed"]);
    }

    #[test]
    fn silent_and_log_do_not_panic() {
        Silent.emit("nothing");
        Log.emit("logged");
    }
}
