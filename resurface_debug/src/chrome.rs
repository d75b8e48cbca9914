// Copyright 2026 the Resurface Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`ChromeTraceSink`] collects events as they arrive and [`export`]s them as
//! [Chrome Trace Event Format][format] JSON. A restore pass becomes a `B`/`E`
//! duration pair with one instant event per restored image inside it.
//!
//! [`export`]: ChromeTraceSink::export
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};
use std::time::Instant;

use serde_json::{Value, json};

use resurface_core::image::RestoreKind;
use resurface_core::trace::{
    ImageRestoredEvent, RestoreBeginEvent, RestoreEndEvent, StaleResolvedEvent, TraceSink,
};

/// Collects trace events for export as Chrome Trace Event Format JSON.
///
/// Timestamps are microseconds since the sink was created.
#[derive(Debug)]
pub struct ChromeTraceSink {
    origin: Instant,
    events: Vec<Value>,
}

impl Default for ChromeTraceSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ChromeTraceSink {
    /// Creates an empty sink whose clock starts now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            events: Vec::new(),
        }
    }

    /// Returns the collected events.
    #[must_use]
    pub fn events(&self) -> &[Value] {
        &self.events
    }

    /// Writes all collected events as a JSON array, suitable for loading
    /// into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
    pub fn export(&self, writer: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer_pretty(writer, &self.events)?;
        Ok(())
    }

    fn now_us(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1e6
    }
}

impl TraceSink for ChromeTraceSink {
    fn on_restore_begin(&mut self, e: &RestoreBeginEvent) {
        let ts = self.now_us();
        self.events.push(json!({
            "ph": "B",
            "name": "Restore",
            "cat": "Restore",
            "ts": ts,
            "pid": 0,
            "tid": 0,
            "args": {
                "pass": e.pass,
                "images": e.images,
            }
        }));
    }

    fn on_image_restored(&mut self, e: &ImageRestoredEvent) {
        let ts = self.now_us();
        let (kind, draws) = match e.kind {
            RestoreKind::Screen => ("Screen", 0),
            RestoreKind::Volatile => ("Volatile", 0),
            RestoreKind::Replayed { draws } => ("Replayed", draws),
        };
        self.events.push(json!({
            "ph": "i",
            "name": "ImageRestored",
            "cat": "Restore",
            "ts": ts,
            "pid": 0,
            "tid": 0,
            "s": "t",
            "args": {
                "pass": e.pass,
                "image": e.image.index(),
                "generation": e.image.generation(),
                "position": e.position,
                "kind": kind,
                "draws": draws,
            }
        }));
    }

    fn on_restore_end(&mut self, e: &RestoreEndEvent) {
        let ts = self.now_us();
        self.events.push(json!({
            "ph": "E",
            "name": "Restore",
            "cat": "Restore",
            "ts": ts,
            "pid": 0,
            "tid": 0,
            "args": {
                "pass": e.pass,
                "restored": e.restored,
            }
        }));
    }

    fn on_stale_resolved(&mut self, e: &StaleResolvedEvent) {
        let ts = self.now_us();
        self.events.push(json!({
            "ph": "i",
            "name": "StaleResolved",
            "cat": "Resolve",
            "ts": ts,
            "pid": 0,
            "tid": 0,
            "s": "t",
            "args": {
                "image": e.image.index(),
                "generation": e.image.generation(),
                "bytes": e.bytes,
            }
        }));
    }
}
