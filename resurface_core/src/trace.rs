// Copyright 2026 the Resurface Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for resolve and restore passes.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that
//! [`ImageSet`](crate::set::ImageSet) calls while resolving stale images and
//! restoring after context loss. All method bodies default to no-ops, so
//! implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.

use crate::image::RestoreKind;
use crate::set::ImageId;

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted before the first image of a restore pass is rebuilt.
#[derive(Clone, Copy, Debug)]
pub struct RestoreBeginEvent {
    /// Monotonic restore pass counter for the image set.
    pub pass: u64,
    /// Number of live images about to be restored.
    pub images: u32,
}

/// Emitted after one image was rebuilt.
#[derive(Clone, Copy, Debug)]
pub struct ImageRestoredEvent {
    /// Restore pass counter.
    pub pass: u64,
    /// The restored image.
    pub image: ImageId,
    /// Position of the image in the dependency-first order.
    pub position: u32,
    /// How the image was rebuilt.
    pub kind: RestoreKind,
}

/// Emitted after the last image of a restore pass is rebuilt.
#[derive(Clone, Copy, Debug)]
pub struct RestoreEndEvent {
    /// Restore pass counter.
    pub pass: u64,
    /// Number of images rebuilt.
    pub restored: u32,
}

/// Emitted when a stale image is read back so it can be restored later.
#[derive(Clone, Copy, Debug)]
pub struct StaleResolvedEvent {
    /// The resolved image.
    pub image: ImageId,
    /// Size of the read-back in bytes.
    pub bytes: u64,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from resolve and restore passes.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called before a restore pass rebuilds its first image.
    fn on_restore_begin(&mut self, e: &RestoreBeginEvent) {
        _ = e;
    }

    /// Called after each image is rebuilt.
    fn on_image_restored(&mut self, e: &ImageRestoredEvent) {
        _ = e;
    }

    /// Called after a restore pass completes.
    fn on_restore_end(&mut self, e: &RestoreEndEvent) {
        _ = e;
    }

    /// Called when a stale image is read back.
    fn on_stale_resolved(&mut self, e: &StaleResolvedEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`RestoreBeginEvent`].
    #[inline]
    pub fn restore_begin(&mut self, e: &RestoreBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_restore_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`ImageRestoredEvent`].
    #[inline]
    pub fn image_restored(&mut self, e: &ImageRestoredEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_image_restored(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`RestoreEndEvent`].
    #[inline]
    pub fn restore_end(&mut self, e: &RestoreEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_restore_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`StaleResolvedEvent`].
    #[inline]
    pub fn stale_resolved(&mut self, e: &StaleResolvedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_stale_resolved(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
