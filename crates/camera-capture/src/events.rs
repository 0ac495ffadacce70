//! Frame, error and playback-finished notifications
//!
//! Listeners run synchronously on the capture worker thread, in registration
//! order. A slow listener slows acquisition. Callbacks run outside the
//! registry lock, so a listener may register or remove listeners (itself
//! included) on the grabber that feeds it. Listeners must not call lifecycle
//! methods (`start`, `stop`, `wait_for_stop`) on that grabber.

use crate::frame::DecodedFrame;
use crate::CaptureError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

/// Handle returned by listener registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Why a capture session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum FinishReason {
    /// The caller signalled the worker to stop
    StoppedByCaller,
}

/// Notification delivered to channel subscribers
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    Frame(DecodedFrame),
    Error(CaptureError),
    Finished(FinishReason),
}

/// Returns `false` once it wants to be unregistered
type Callback<T> = Box<dyn FnMut(&T) -> bool + Send>;

struct Registry<T> {
    entries: Vec<(ListenerId, Callback<T>)>,
    /// Ids taken out of `entries` by the dispatch in progress
    dispatching: Vec<ListenerId>,
    /// Ids removed while their callback was out for dispatch
    removed: Vec<ListenerId>,
}

struct Listeners<T> {
    registry: Mutex<Registry<T>>,
    /// Serializes emitters so only one dispatch owns the taken entries
    dispatch: Mutex<()>,
}

impl<T> Listeners<T> {
    fn new() -> Self {
        Self {
            registry: Mutex::new(Registry {
                entries: Vec::new(),
                dispatching: Vec::new(),
                removed: Vec::new(),
            }),
            dispatch: Mutex::new(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Registry<T>> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn add(&self, id: ListenerId, callback: Callback<T>) {
        self.lock().entries.push((id, callback));
    }

    fn remove(&self, id: ListenerId) -> bool {
        let mut registry = self.lock();
        let before = registry.entries.len();
        registry.entries.retain(|(existing, _)| *existing != id);
        if registry.entries.len() != before {
            return true;
        }
        if registry.dispatching.contains(&id) && !registry.removed.contains(&id) {
            registry.removed.push(id);
            return true;
        }
        false
    }

    fn is_removed(&self, id: ListenerId) -> bool {
        self.lock().removed.contains(&id)
    }

    fn emit(&self, value: &T) {
        let _dispatch = self.dispatch.lock().unwrap_or_else(PoisonError::into_inner);

        let mut dispatch = {
            let mut registry = self.lock();
            registry.dispatching = registry.entries.iter().map(|(id, _)| *id).collect();
            Dispatch {
                listeners: self,
                active: std::mem::take(&mut registry.entries),
            }
        };

        dispatch
            .active
            .retain_mut(|(id, callback)| !self.is_removed(*id) && callback(value));
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.lock().entries.len()
    }
}

/// Listeners taken out for one dispatch; merged back on drop, even when a
/// callback panics
struct Dispatch<'a, T> {
    listeners: &'a Listeners<T>,
    active: Vec<(ListenerId, Callback<T>)>,
}

impl<T> Drop for Dispatch<'_, T> {
    fn drop(&mut self) {
        let mut registry = self.listeners.lock();
        let removed = std::mem::take(&mut registry.removed);
        let mut active = std::mem::take(&mut self.active);
        active.retain(|(id, _)| !removed.contains(id));
        registry.dispatching.clear();
        // Listeners registered during dispatch go after the existing ones
        active.append(&mut registry.entries);
        registry.entries = active;
    }
}

/// Registry of everything listening to one grabber
pub(crate) struct EventHub {
    next_id: AtomicU64,
    frames: Listeners<DecodedFrame>,
    errors: Listeners<CaptureError>,
    finished: Listeners<FinishReason>,
}

impl EventHub {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            frames: Listeners::new(),
            errors: Listeners::new(),
            finished: Listeners::new(),
        }
    }

    fn next_id(&self) -> ListenerId {
        ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    pub(crate) fn on_frame<F>(&self, mut listener: F) -> ListenerId
    where
        F: FnMut(&DecodedFrame) + Send + 'static,
    {
        let id = self.next_id();
        self.frames.add(id, Box::new(move |frame: &DecodedFrame| {
            listener(frame);
            true
        }));
        id
    }

    pub(crate) fn on_error<F>(&self, mut listener: F) -> ListenerId
    where
        F: FnMut(&CaptureError) + Send + 'static,
    {
        let id = self.next_id();
        self.errors.add(id, Box::new(move |err: &CaptureError| {
            listener(err);
            true
        }));
        id
    }

    pub(crate) fn on_finished<F>(&self, mut listener: F) -> ListenerId
    where
        F: FnMut(&FinishReason) + Send + 'static,
    {
        let id = self.next_id();
        self.finished.add(id, Box::new(move |reason: &FinishReason| {
            listener(reason);
            true
        }));
        id
    }

    /// Feed all three notification kinds into a bounded channel
    ///
    /// The worker blocks while the channel is full. Dropping the receiver
    /// unregisters the subscription on the next notification.
    pub(crate) fn subscribe(&self, capacity: usize) -> mpsc::Receiver<CaptureEvent> {
        let (tx, rx) = mpsc::channel(capacity.max(1));

        let frame_tx = tx.clone();
        self.frames.add(self.next_id(), Box::new(move |frame: &DecodedFrame| {
            frame_tx.blocking_send(CaptureEvent::Frame(frame.clone())).is_ok()
        }));

        let error_tx = tx.clone();
        self.errors.add(self.next_id(), Box::new(move |err: &CaptureError| {
            error_tx.blocking_send(CaptureEvent::Error(err.clone())).is_ok()
        }));

        self.finished.add(self.next_id(), Box::new(move |reason: &FinishReason| {
            tx.blocking_send(CaptureEvent::Finished(*reason)).is_ok()
        }));

        rx
    }

    pub(crate) fn remove(&self, id: ListenerId) -> bool {
        self.frames.remove(id) || self.errors.remove(id) || self.finished.remove(id)
    }

    pub(crate) fn emit_frame(&self, frame: &DecodedFrame) {
        self.frames.emit(frame);
    }

    pub(crate) fn emit_error(&self, err: &CaptureError) {
        self.errors.emit(err);
    }

    pub(crate) fn emit_finished(&self, reason: FinishReason) {
        self.finished.emit(&reason);
    }

    #[cfg(test)]
    pub(crate) fn listener_count(&self) -> usize {
        self.frames.len() + self.errors.len() + self.finished.len()
    }
}
