// Copyright 2026 the Resurface Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use resurface_core::image::RestoreKind;
use resurface_core::trace::{
    ImageRestoredEvent, RestoreBeginEvent, RestoreEndEvent, StaleResolvedEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Returns the destination, consuming the sink.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn kind_name(kind: RestoreKind) -> &'static str {
    match kind {
        RestoreKind::Screen => "screen",
        RestoreKind::Volatile => "volatile",
        RestoreKind::Replayed { .. } => "replayed",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_restore_begin(&mut self, e: &RestoreBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[restore:begin] pass={} images={}",
            e.pass, e.images,
        );
    }

    fn on_image_restored(&mut self, e: &ImageRestoredEvent) {
        let draws = match e.kind {
            RestoreKind::Replayed { draws } => draws,
            RestoreKind::Screen | RestoreKind::Volatile => 0,
        };
        let _ = writeln!(
            self.writer,
            "[restore:image] pass={} #{} {:?} {} draws={draws}",
            e.pass,
            e.position,
            e.image,
            kind_name(e.kind),
        );
    }

    fn on_restore_end(&mut self, e: &RestoreEndEvent) {
        let _ = writeln!(
            self.writer,
            "[restore:end] pass={} restored={}",
            e.pass, e.restored,
        );
    }

    fn on_stale_resolved(&mut self, e: &StaleResolvedEvent) {
        let _ = writeln!(
            self.writer,
            "[resolve] {:?} bytes={}",
            e.image, e.bytes,
        );
    }
}
