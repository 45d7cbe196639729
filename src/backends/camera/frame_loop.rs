// SPDX-License-Identifier: GPL-3.0-only

//! Capture thread lifecycle
//!
//! The per-frame callback runs on a dedicated thread owned by a small loop
//! controller: the closure is invoked repeatedly until it asks to stop or
//! the controller signals it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Action returned by one capture-loop iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    Continue,
    Stop,
}

/// Controller for the capture loop thread
pub struct CaptureLoop {
    thread_handle: Option<JoinHandle<()>>,
    stop_signal: Arc<AtomicBool>,
    name: String,
}

impl CaptureLoop {
    /// Spawn the capture thread.
    ///
    /// `loop_fn` is called repeatedly until it returns `LoopAction::Stop`
    /// or `stop()` is invoked.
    pub fn spawn<F>(name: &str, mut loop_fn: F) -> Self
    where
        F: FnMut() -> LoopAction + Send + 'static,
    {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let stop_signal_clone = Arc::clone(&stop_signal);
        let thread_name = name.to_string();

        info!(name = %name, "Starting capture loop");

        let thread_handle = thread::spawn(move || {
            debug!(name = %thread_name, "Capture loop thread started");

            loop {
                if stop_signal_clone.load(Ordering::SeqCst) {
                    debug!(name = %thread_name, "Stop signal received");
                    break;
                }

                match loop_fn() {
                    LoopAction::Continue => {}
                    LoopAction::Stop => {
                        debug!(name = %thread_name, "Loop requested stop");
                        break;
                    }
                }
            }

            info!(name = %thread_name, "Capture loop thread exiting");
        });

        Self {
            thread_handle: Some(thread_handle),
            stop_signal,
            name: name.to_string(),
        }
    }

    /// Whether the loop thread is still alive
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Set the stop signal without waiting for the thread
    pub fn request_stop(&self) {
        self.stop_signal.store(true, Ordering::SeqCst);
    }

    /// Signal the loop to stop and wait for the thread to finish
    pub fn stop(&mut self) {
        self.request_stop();
        self.join();
    }

    /// Wait for the thread without sending the stop signal
    pub fn join(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            if let Err(e) = handle.join() {
                warn!(name = %self.name, "Capture loop thread panicked: {:?}", e);
            }
        }
    }
}

impl Drop for CaptureLoop {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            debug!(name = %self.name, "CaptureLoop dropped, stopping thread");
            self.stop();
        }
    }
}
