//! Repeating timer driving the ticks

use std::sync::mpsc::{channel, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

struct Registration {
    stop: Sender<()>,
    handle: thread::JoinHandle<()>,
}

/// Owns at most one running timer.
///
/// Scheduling again stops the previous registration without waiting for it:
/// a tick already in flight finishes on the old thread, which then exits
/// without firing again. `cancel` and drop wait for the thread to exit.
#[derive(Default)]
pub struct Ticker {
    active: Option<Registration>,
    /// Replaced registrations whose last tick may still be running
    retired: Vec<thread::JoinHandle<()>>,
}

impl Ticker {
    pub fn new() -> Self {
        Ticker::default()
    }

    /// Call `callback` every `interval` until cancelled or rescheduled
    pub fn schedule<F>(&mut self, interval: Duration, mut callback: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.detach();

        let (stop, rx) = channel::<()>();
        let handle = thread::spawn(move || loop {
            match rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => callback(),
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        });

        tracing::info!("Timer scheduled every {} ms", interval.as_millis());
        self.active = Some(Registration { stop, handle });
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Stop the active registration without joining its thread
    fn detach(&mut self) {
        self.retired.retain(|handle| !handle.is_finished());
        if let Some(registration) = self.active.take() {
            let _ = registration.stop.send(());
            self.retired.push(registration.handle);
            tracing::info!("Timer replaced");
        }
    }

    /// Stop the active registration and wait for an in-flight tick to finish
    pub fn cancel(&mut self) {
        if let Some(registration) = self.active.take() {
            let _ = registration.stop.send(());
            if registration.handle.join().is_err() {
                tracing::warn!("Timer thread panicked");
            }
            tracing::info!("Timer cancelled");
        }
        for handle in self.retired.drain(..) {
            if handle.join().is_err() {
                tracing::warn!("Timer thread panicked");
            }
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancel();
    }
}
