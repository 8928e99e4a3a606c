use std::cell::Cell;
use std::sync::mpsc;
use std::sync::mpsc::{Receiver, Sender};
use std::time::{Duration, Instant};

/// Sending half of the shutdown signal. This is what gets moved into the
/// Ctrl-C handler.
#[derive(Clone)]
pub struct ShutdownHandle {
    tx: Sender<()>,
}

impl ShutdownHandle {
    pub fn request(&self) {
        // The receiver only goes away once the main loop has finished, at
        // which point nobody cares about further requests.
        let _ = self.tx.send(());
    }
}

/// Receiving half of the shutdown signal. Everything runs on one thread, the
/// only thing that ever happens concurrently is a signal handler firing -
/// hence a plain channel and a Cell rather than anything fancier.
pub struct Shutdown {
    rx: Receiver<()>,
    requested: Cell<bool>,
}

impl Shutdown {
    pub fn channel() -> (ShutdownHandle, Shutdown) {
        let (tx, rx) = mpsc::channel();
        (
            ShutdownHandle { tx },
            Shutdown {
                rx,
                requested: Cell::new(false),
            },
        )
    }

    /// Returns true if shutdown has been requested. Once true, stays true.
    pub fn is_requested(&self) -> bool {
        if !self.requested.get() && self.rx.try_recv().is_ok() {
            self.requested.set(true);
        }
        self.requested.get()
    }

    /// Sleep for up to `duration`, returning early (with true) if shutdown is
    /// requested in the meantime.
    pub fn wait(&self, duration: Duration) -> bool {
        if self.is_requested() {
            return true;
        }
        let deadline = Instant::now() + duration;
        match self.rx.recv_timeout(duration) {
            Ok(()) => {
                self.requested.set(true);
                true
            }
            Err(mpsc::RecvTimeoutError::Timeout) => false,
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                // All handles are gone, so no request can ever arrive. Still
                // honour the requested delay, otherwise polling loops spin.
                std::thread::sleep(deadline.saturating_duration_since(Instant::now()));
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_is_sticky() {
        let (handle, shutdown) = Shutdown::channel();
        assert!(!shutdown.is_requested());
        handle.request();
        assert!(shutdown.is_requested());
        assert!(shutdown.is_requested());
        assert!(shutdown.wait(Duration::from_secs(60)));
    }

    #[test]
    fn test_wait_times_out() {
        let (_handle, shutdown) = Shutdown::channel();
        let start = Instant::now();
        assert!(!shutdown.wait(Duration::from_millis(20)));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_wait_wakes_on_request_from_other_thread() {
        let (handle, shutdown) = Shutdown::channel();
        let requester = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(10));
            handle.request();
        });
        assert!(shutdown.wait(Duration::from_secs(60)));
        requester.join().unwrap();
    }

    #[test]
    fn test_wait_without_handles_still_sleeps() {
        let (handle, shutdown) = Shutdown::channel();
        drop(handle);
        let start = Instant::now();
        assert!(!shutdown.wait(Duration::from_millis(20)));
        assert!(start.elapsed() >= Duration::from_millis(20));
        assert!(!shutdown.is_requested());
    }
}
