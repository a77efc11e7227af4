//! Normalized progress reporting for long-running I/O.

/// Optional sink for progress updates in `[0, 1]`.
///
/// The callback runs on whichever thread performs the I/O.
pub type ProgressCallback<'a> = Option<&'a mut dyn FnMut(f32)>;

/// Turns byte counts into monotonic `[0, 1]` progress updates.
pub(crate) struct ProgressReporter<'a> {
    callback: ProgressCallback<'a>,
    total: u64,
    last: f32,
}

impl<'a> ProgressReporter<'a> {
    pub(crate) fn new(callback: ProgressCallback<'a>, total: u64) -> Self {
        Self {
            callback,
            total,
            last: 0.0,
        }
    }

    /// Reports `done / total`, clamped to `[0, 1]` and never below the last value.
    pub(crate) fn report(&mut self, done: u64) {
        let fraction = if self.total == 0 {
            1.0
        } else {
            (done as f64 / self.total as f64).min(1.0) as f32
        };
        self.emit(fraction);
    }

    /// Reports completion.
    pub(crate) fn finish(&mut self) {
        self.emit(1.0);
    }

    fn emit(&mut self, fraction: f32) {
        let fraction = fraction.max(self.last);
        self.last = fraction;
        if let Some(callback) = self.callback.as_mut() {
            callback(fraction);
        }
    }
}
