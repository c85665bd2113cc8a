//! Progress reporting

use crate::backend::Algorithm;

/// Receives progress callbacks while a recognizer consumes input.
///
/// Callbacks are informational only; they cannot cancel a parse.
pub trait ProgressMonitor: Send {
    /// Called once before parsing. Returns how many input positions should
    /// pass between [`progress`](Self::progress) calls; 0 disables them.
    fn starting(&mut self, algorithm: Algorithm, input_len: usize) -> usize;

    /// Called every `frequency` positions with the number processed so far.
    fn progress(&mut self, algorithm: Algorithm, tokens_processed: usize);

    /// Called once after parsing.
    fn finished(&mut self, algorithm: Algorithm);
}

/// Reports progress through the `log` facade at info level.
#[derive(Debug, Clone)]
pub struct LoggingMonitor {
    frequency: usize,
    total: usize,
}

impl LoggingMonitor {
    #[must_use]
    pub const fn new(frequency: usize) -> Self {
        Self {
            frequency,
            total: 0,
        }
    }
}

impl Default for LoggingMonitor {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl ProgressMonitor for LoggingMonitor {
    fn starting(&mut self, algorithm: Algorithm, input_len: usize) -> usize {
        self.total = input_len;
        log::info!("{algorithm} parse of {input_len} tokens starting");
        self.frequency
    }

    fn progress(&mut self, algorithm: Algorithm, tokens_processed: usize) {
        log::info!("{algorithm} parse at {tokens_processed} of {} tokens", self.total);
    }

    fn finished(&mut self, algorithm: Algorithm) {
        log::info!("{algorithm} parse finished");
    }
}

/// Calls the monitor every `frequency` positions.
pub(crate) struct ProgressTicker<'m> {
    monitor: Option<&'m mut (dyn ProgressMonitor + 'static)>,
    algorithm: Algorithm,
    frequency: usize,
    next: usize,
}

impl<'m> ProgressTicker<'m> {
    pub(crate) fn start(
        monitor: Option<&'m mut (dyn ProgressMonitor + 'static)>,
        algorithm: Algorithm,
        input_len: usize,
    ) -> Self {
        let mut ticker = Self {
            monitor,
            algorithm,
            frequency: 0,
            next: 0,
        };
        if let Some(monitor) = ticker.monitor.as_deref_mut() {
            ticker.frequency = monitor.starting(algorithm, input_len);
            ticker.next = ticker.frequency;
        }
        ticker
    }

    pub(crate) fn tick(&mut self, processed: usize) {
        if self.frequency == 0 || processed < self.next {
            return;
        }
        if let Some(monitor) = self.monitor.as_deref_mut() {
            monitor.progress(self.algorithm, processed);
        }
        while self.next <= processed {
            self.next += self.frequency;
        }
    }

    pub(crate) fn finish(mut self) {
        if let Some(monitor) = self.monitor.as_deref_mut() {
            monitor.finished(self.algorithm);
        }
    }
}
