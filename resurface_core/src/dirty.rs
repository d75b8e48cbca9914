// Copyright 2026 the Resurface Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dependency-tracking channel constants.
//!
//! Draw histories implicitly form a graph: an image depends on every image it
//! recorded a composite from. Rather than maintaining that graph between
//! restores, [`ImageSet::restore`](crate::set::ImageSet::restore) builds an
//! [`understory_dirty`] tracker once per pass, adds one edge per history
//! entry on [`HISTORY`], marks every live image, and drains the channel to get
//! a dependency-first order.
//!
//! Cycles cannot be recorded: a history entry is only appended against a
//! non-stale source, and every mutation of an image invalidates every image
//! whose history references it, including the source just drawn from. The tracker is built with
//! [`CycleHandling::Error`](understory_dirty::CycleHandling::Error) so a
//! cycle surfaces as a panic instead of a silently wrong order.

use understory_dirty::Channel;

/// Edge from an image to each source in its draw history.
pub const HISTORY: Channel = Channel::new(0);
