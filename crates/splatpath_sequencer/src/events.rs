// SPDX-License-Identifier: MIT OR Apache-2.0
//! Structured events emitted on playback state transitions.

use crate::player::PlaybackState;
use std::fmt;
use std::sync::Arc;

/// A playback transition
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// State changed
    StateChanged {
        /// Previous state
        from: PlaybackState,
        /// New state
        to: PlaybackState,
        /// Playback position in seconds
        time: f32,
    },
    /// Position moved by an explicit seek
    Seeked {
        /// New position in seconds
        time: f32,
    },
    /// Looping playback wrapped back to the start
    Looped {
        /// Position after wrapping
        time: f32,
    },
    /// Playback reached the end without looping
    Finished,
}

/// Optional observer for structured events.
///
/// Hooks are informational only; nothing depends on them being installed.
pub struct EventHook<E>(Arc<dyn Fn(&E) + Send + Sync>);

impl<E> EventHook<E> {
    /// Wrap a callback
    pub fn new(callback: impl Fn(&E) + Send + Sync + 'static) -> Self {
        Self(Arc::new(callback))
    }

    /// Deliver an event
    pub fn emit(&self, event: &E) {
        (self.0)(event);
    }
}

impl<E> Clone for EventHook<E> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<E> fmt::Debug for EventHook<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EventHook(..)")
    }
}
