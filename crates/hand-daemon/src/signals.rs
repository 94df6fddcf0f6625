//! Signal handling for graceful daemon shutdown.
//!
//! SIGTERM and SIGINT request shutdown; SIGHUP requests a joint-topology
//! reload. Handlers only touch atomic flags, which the main loop polls.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Shared flags set by signal handlers and polled by the main loop.
#[derive(Debug, Default)]
pub struct SignalState {
    shutdown_requested: AtomicBool,
    reload_requested: AtomicBool,
}

impl SignalState {
    /// Check if shutdown has been requested.
    #[inline]
    pub fn shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::Relaxed)
    }

    /// Check if reload has been requested, clearing the flag.
    #[inline]
    pub fn take_reload_request(&self) -> bool {
        self.reload_requested.swap(false, Ordering::Relaxed)
    }

    /// Request shutdown (can be called from any thread).
    pub fn request_shutdown(&self) {
        self.shutdown_requested.store(true, Ordering::Relaxed);
    }

    /// Request reload (can be called from any thread).
    pub fn request_reload(&self) {
        self.reload_requested.store(true, Ordering::Relaxed);
    }
}

/// Handle for signal management.
#[derive(Clone)]
pub struct SignalHandler {
    state: Arc<SignalState>,
}

impl SignalHandler {
    /// Create a handler and register the process signal handlers.
    ///
    /// On Unix this registers SIGTERM, SIGINT, and SIGHUP. Elsewhere the
    /// handler only supports manual shutdown requests.
    pub fn new() -> std::io::Result<Self> {
        let handler = Self {
            state: Arc::new(SignalState::default()),
        };

        #[cfg(unix)]
        handler.register_unix_handlers();

        Ok(handler)
    }

    /// Register Unix signal handlers.
    ///
    /// Handlers must be async-signal-safe, so they only store to static
    /// atomics; a poll thread forwards the flags into [`SignalState`].
    #[cfg(unix)]
    fn register_unix_handlers(&self) {
        use std::os::raw::c_int;

        static SHUTDOWN_FLAG: AtomicBool = AtomicBool::new(false);
        static RELOAD_FLAG: AtomicBool = AtomicBool::new(false);

        let state = Arc::clone(&self.state);

        std::thread::spawn(move || loop {
            if SHUTDOWN_FLAG.swap(false, Ordering::Relaxed) {
                state.request_shutdown();
            }
            if RELOAD_FLAG.swap(false, Ordering::Relaxed) {
                state.request_reload();
            }
            if state.shutdown_requested() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        });

        extern "C" fn shutdown_handler(_: c_int) {
            SHUTDOWN_FLAG.store(true, Ordering::Relaxed);
        }

        extern "C" fn reload_handler(_: c_int) {
            RELOAD_FLAG.store(true, Ordering::Relaxed);
        }

        #[allow(unsafe_code)]
        unsafe {
            libc::signal(libc::SIGTERM, shutdown_handler as libc::sighandler_t);
            libc::signal(libc::SIGINT, shutdown_handler as libc::sighandler_t);
            libc::signal(libc::SIGHUP, reload_handler as libc::sighandler_t);
        }

        debug!("Unix signal handlers registered");
    }

    /// Check if shutdown has been requested.
    #[inline]
    pub fn shutdown_requested(&self) -> bool {
        self.state.shutdown_requested()
    }

    /// Check if reload has been requested, clearing the flag.
    #[inline]
    pub fn take_reload_request(&self) -> bool {
        self.state.take_reload_request()
    }

    /// Manually request shutdown.
    pub fn request_shutdown(&self) {
        self.state.request_shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state() {
        let state = SignalState::default();
        assert!(!state.shutdown_requested());
        assert!(!state.take_reload_request());
    }

    #[test]
    fn test_shutdown_request() {
        let state = SignalState::default();
        state.request_shutdown();
        assert!(state.shutdown_requested());
    }

    #[test]
    fn test_reload_request_is_cleared_on_take() {
        let state = SignalState::default();
        state.request_reload();
        assert!(state.take_reload_request());
        assert!(!state.take_reload_request());
    }

    #[test]
    fn test_manual_shutdown_via_handler() {
        let handler = SignalHandler::new().unwrap();
        assert!(!handler.shutdown_requested());

        handler.request_shutdown();
        assert!(handler.shutdown_requested());
    }
}
