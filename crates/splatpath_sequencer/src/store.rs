// SPDX-License-Identifier: MIT OR Apache-2.0
//! Observable state container.
//!
//! A [`Store`] holds one value and notifies subscribers after every change.
//! Subscriptions are disposed by dropping the returned [`Subscription`].

use crate::keyframe::{Keyframe, KeyframeId};
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Inner<T> {
    value: Mutex<T>,
    listeners: Mutex<IndexMap<u64, Listener<T>>>,
    next_id: AtomicU64,
}

/// Shared, observable value
pub struct Store<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + 'static> Store<T> {
    /// Create a store holding `value`
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Inner {
                value: Mutex::new(value),
                listeners: Mutex::new(IndexMap::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Snapshot of the current value
    pub fn get(&self) -> T {
        self.inner.value.lock().clone()
    }

    /// Read part of the current value without cloning all of it
    pub fn with<R>(&self, read: impl FnOnce(&T) -> R) -> R {
        read(&self.inner.value.lock())
    }

    /// Replace the value and notify subscribers
    pub fn set(&self, value: T) {
        *self.inner.value.lock() = value;
        self.notify();
    }

    /// Modify the value in place and notify subscribers
    pub fn update(&self, change: impl FnOnce(&mut T)) {
        change(&mut self.inner.value.lock());
        self.notify();
    }

    /// Register a listener called after every change
    pub fn subscribe(&self, listener: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners.lock().insert(id, Arc::new(listener));

        let weak: Weak<Inner<T>> = Arc::downgrade(&self.inner);
        Subscription {
            dispose: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.listeners.lock().shift_remove(&id);
                }
            })),
        }
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }

    fn notify(&self) {
        // Listeners run without any lock held so they may read the store.
        let snapshot = self.get();
        let listeners: Vec<Listener<T>> = self.inner.listeners.lock().values().cloned().collect();
        for listener in listeners {
            listener(&snapshot);
        }
    }
}

/// Handle that removes its listener when dropped
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    dispose: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Remove the listener now
    pub fn unsubscribe(mut self) {
        self.dispose_now();
    }

    fn dispose_now(&mut self) {
        if let Some(dispose) = self.dispose.take() {
            dispose();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose_now();
    }
}

/// UI-facing state of the camera path editor
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathState {
    /// Keyframes in time order
    pub keyframes: Vec<Keyframe>,
    /// Selected keyframe
    pub selected_id: Option<KeyframeId>,
    /// Whether preview playback is running
    pub is_previewing: bool,
    /// Whether preview playback is paused
    pub is_paused: bool,
    /// Playback position in seconds
    pub current_time: f32,
    /// Path duration in seconds
    pub duration: f32,
    /// Whether preview loops
    pub loop_enabled: bool,
    /// Last preview error, cleared on successful actions
    pub preview_error: Option<String>,
}
