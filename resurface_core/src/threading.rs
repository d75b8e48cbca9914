// Copyright 2026 the Resurface Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Running work on the thread that owns the device.
//!
//! Graphics contexts are usually bound to one thread. [`DeviceThread`] owns
//! the device state `S` on a dedicated worker thread and lets any other
//! thread run a closure against it with [`sync`](DeviceThread::sync),
//! blocking until the closure's result is back.
//!
//! Read-backs and restores go through here when the caller is not the
//! device thread.

use alloc::boxed::Box;
use core::fmt;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

type Job<S> = Box<dyn FnOnce(&mut S) + Send>;

/// Error returned when the device thread has exited, typically because a
/// previous job panicked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceThreadGone;

impl fmt::Display for DeviceThreadGone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("device thread is no longer running")
    }
}

impl core::error::Error for DeviceThreadGone {}

/// A worker thread owning device state `S`.
///
/// Jobs run one at a time in submission order. Dropping the handle lets the
/// queued jobs finish, then joins the thread.
pub struct DeviceThread<S> {
    jobs: Option<mpsc::Sender<Job<S>>>,
    handle: Option<JoinHandle<()>>,
}

impl<S> fmt::Debug for DeviceThread<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceThread")
            .field("running", &self.jobs.is_some())
            .finish_non_exhaustive()
    }
}

impl<S: 'static> DeviceThread<S> {
    /// Spawns the worker thread and builds its state there with `init`.
    ///
    /// `S` itself never crosses threads, so it may be `!Send`.
    pub fn spawn<F>(init: F) -> Self
    where
        F: FnOnce() -> S + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<Job<S>>();
        let handle = thread::spawn(move || {
            let mut state = init();
            for job in rx {
                job(&mut state);
            }
        });
        Self {
            jobs: Some(tx),
            handle: Some(handle),
        }
    }

    /// Runs `f` on the device thread and waits for its result.
    pub fn sync<R, F>(&self, f: F) -> Result<R, DeviceThreadGone>
    where
        R: Send + 'static,
        F: FnOnce(&mut S) -> R + Send + 'static,
    {
        let jobs = self.jobs.as_ref().ok_or(DeviceThreadGone)?;
        let (reply, result) = mpsc::sync_channel(1);
        let job: Job<S> = Box::new(move |state| {
            // The caller may have given up waiting; nothing to do then.
            let _ = reply.send(f(state));
        });
        jobs.send(job).map_err(|_| DeviceThreadGone)?;
        result.recv().map_err(|_| DeviceThreadGone)
    }
}

impl<S> Drop for DeviceThread<S> {
    fn drop(&mut self) {
        // Closing the channel ends the worker loop.
        self.jobs = None;
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn sync_returns_results_in_order() {
        let device = DeviceThread::spawn(Vec::<u32>::new);
        for i in 0..4 {
            device.sync(move |log| log.push(i)).unwrap();
        }
        let log = device.sync(|log| log.clone()).unwrap();
        assert_eq!(log, [0, 1, 2, 3]);
    }

    #[test]
    fn state_stays_on_the_worker() {
        let caller = thread::current().id();
        let device = DeviceThread::spawn(move || thread::current().id());
        let worker = device.sync(|id| *id).unwrap();
        assert_ne!(worker, caller);
        assert_eq!(device.sync(|_| thread::current().id()).unwrap(), worker);
    }

    #[test]
    fn panicking_job_reports_gone() {
        let device = DeviceThread::spawn(|| 0_u32);
        let err = device
            .sync(|_| -> u32 { panic!("device job failed") })
            .unwrap_err();
        assert_eq!(err, DeviceThreadGone);
        assert_eq!(device.sync(|n| *n), Err(DeviceThreadGone));
    }

    #[test]
    fn drop_joins_the_worker() {
        struct Flag(Arc<AtomicBool>);
        impl Drop for Flag {
            fn drop(&mut self) {
                self.0.store(true, Ordering::SeqCst);
            }
        }

        let dropped = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&dropped);
        let device = DeviceThread::spawn(move || Flag(flag));
        device.sync(|_| ()).unwrap();
        drop(device);
        assert!(dropped.load(Ordering::SeqCst));
    }
}
