//! Adapts any refreshable stream to retry past end-of-data, for following a
//! `blk*.dat` file that a node is still actively writing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How often to retry after hitting end-of-data, and how long to keep
/// retrying before giving up.
#[derive(Clone, Debug)]
pub struct TailableConfig {
    pub polling_interval: Duration,
    pub timeout: Option<Duration>,
}

impl Default for TailableConfig {
    fn default() -> Self {
        TailableConfig {
            polling_interval: Duration::from_secs(5),
            timeout: None,
        }
    }
}

/// A handle to cooperatively cancel a `Tailable` adapter from another
/// thread or signal handler.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        StopHandle(Arc::new(AtomicBool::new(false)))
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Wraps any iterator whose `None` may mean "nothing more *yet*" rather
/// than "nothing more, ever": on `None`, sleeps for `polling_interval` and
/// retries, until `timeout` elapses or `stop()` is called.
///
/// `inner` must itself be able to notice new data on a retried `next()`
/// call — for the streams in this crate, that means it's built over a
/// `RawFileSource` configured with `refresh: true`.
pub struct Tailable<I> {
    inner: I,
    config: TailableConfig,
    stop: StopHandle,
}

impl<I> Tailable<I> {
    pub fn new(inner: I, config: TailableConfig) -> Self {
        Tailable {
            inner,
            config,
            stop: StopHandle::new(),
        }
    }

    /// A cloneable handle that can stop this adapter's retry loop from
    /// another thread.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }
}

impl<I, T> Iterator for Tailable<I>
where
    I: Iterator<Item = T>,
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let deadline = self.config.timeout.map(|t| Instant::now() + t);
        loop {
            if let Some(item) = self.inner.next() {
                return Some(item);
            }
            if self.stop.is_stopped() {
                return None;
            }
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    return None;
                }
            }
            std::thread::sleep(self.config.polling_interval);
        }
    }
}
