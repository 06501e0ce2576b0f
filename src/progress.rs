//! Progress-callback trait for per-page conversion events.
//!
//! Inject an [`Arc<dyn ProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! an event each time a page's Markdown fragment has been written to the
//! output sink.
//!
//! Because the page source is lazy the total page count is not known up
//! front; the counter simply advances by one per completed page, like a
//! spinner with a running tally. Methods have default no-op implementations
//! so callers only override what they care about, and implementations must
//! be `Send + Sync` — within a group pages are transcribed concurrently.

/// Called by the orchestrator as conversion proceeds.
pub trait ProgressCallback: Send + Sync {
    /// Called once before the first group is dispatched.
    fn on_start(&self) {}

    /// Called after a page's fragment (and separator) has been flushed.
    ///
    /// `pages_done` is the running total of completed pages, starting at 1.
    fn on_page_complete(&self, pages_done: usize) {
        let _ = pages_done;
    }

    /// Called once after the final group, with the total page count.
    ///
    /// Not called when the run aborts on an error.
    fn on_finish(&self, pages_done: usize) {
        let _ = pages_done;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct TrackingProgress {
        pages: AtomicUsize,
        finished_at: AtomicUsize,
    }

    impl ProgressCallback for TrackingProgress {
        fn on_page_complete(&self, pages_done: usize) {
            self.pages.store(pages_done, Ordering::SeqCst);
        }

        fn on_finish(&self, pages_done: usize) {
            self.finished_at.store(pages_done, Ordering::SeqCst);
        }
    }

    struct Silent;

    impl ProgressCallback for Silent {}

    #[test]
    fn default_methods_are_no_ops() {
        let cb = Silent;
        cb.on_start();
        cb.on_page_complete(1);
        cb.on_finish(1);
    }

    #[test]
    fn tracking_callback_receives_running_total() {
        let cb = TrackingProgress {
            pages: AtomicUsize::new(0),
            finished_at: AtomicUsize::new(0),
        };
        cb.on_start();
        cb.on_page_complete(1);
        cb.on_page_complete(2);
        cb.on_page_complete(3);
        cb.on_finish(3);
        assert_eq!(cb.pages.load(Ordering::SeqCst), 3);
        assert_eq!(cb.finished_at.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: Arc<dyn ProgressCallback> = Arc::new(Silent);
        cb.on_start();
        cb.on_page_complete(1);
    }
}
