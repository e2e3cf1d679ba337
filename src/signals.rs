//! Observer lists attached to objects.
//!
//! Handlers get `&mut Document`, so they cannot live inside the document while they
//! run.  Emission takes the list out of the object, calls every handler, and puts
//! the list back, keeping handlers connected in the meantime and dropping the ones
//! disconnected in the meantime.  Everything is dropped with the object.

use crate::document::Document;
use crate::flags::ObjectFlags;
use crate::object::ObjectId;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SignalHandlerId(pub(crate) u64);

/// Handler for the release, delete and position-changed signals.
pub type ObjectHandler = dyn FnMut(&mut Document, ObjectId);

/// Handler for the modified signal.
pub type ModifiedHandler = dyn FnMut(&mut Document, ObjectId, ObjectFlags);

pub(crate) struct Signal<F: ?Sized> {
    handlers: Vec<(SignalHandlerId, Box<F>)>,
    emitting: usize,
    disconnected: Vec<SignalHandlerId>,
}

impl<F: ?Sized> Default for Signal<F> {
    fn default() -> Self {
        Signal {
            handlers: Vec::new(),
            emitting: 0,
            disconnected: Vec::new(),
        }
    }
}

impl<F: ?Sized> Signal<F> {
    pub fn connect(&mut self, id: SignalHandlerId, handler: Box<F>) {
        self.handlers.push((id, handler));
    }

    pub fn disconnect(&mut self, id: SignalHandlerId) -> bool {
        if let Some(pos) = self.handlers.iter().position(|(h, _)| *h == id) {
            self.handlers.remove(pos);
            true
        } else if self.emitting > 0 {
            // the handler may be out for emission
            self.disconnected.push(id);
            true
        } else {
            false
        }
    }

    pub fn take(&mut self) -> Vec<(SignalHandlerId, Box<F>)> {
        self.emitting += 1;
        std::mem::take(&mut self.handlers)
    }

    pub fn restore(&mut self, mut taken: Vec<(SignalHandlerId, Box<F>)>) {
        taken.retain(|(id, _)| !self.disconnected.contains(id));
        taken.append(&mut self.handlers);
        self.handlers = taken;

        self.emitting -= 1;
        if self.emitting == 0 {
            self.disconnected.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum ObjectSignal {
    Release,
    Delete,
    PositionChanged,
}

#[derive(Default)]
pub(crate) struct Signals {
    release: Signal<ObjectHandler>,
    delete: Signal<ObjectHandler>,
    position_changed: Signal<ObjectHandler>,
    pub modified: Signal<ModifiedHandler>,
}

impl Signals {
    pub fn object_signal(&mut self, which: ObjectSignal) -> &mut Signal<ObjectHandler> {
        match which {
            ObjectSignal::Release => &mut self.release,
            ObjectSignal::Delete => &mut self.delete,
            ObjectSignal::PositionChanged => &mut self.position_changed,
        }
    }

    pub fn disconnect(&mut self, id: SignalHandlerId) -> bool {
        self.release.disconnect(id)
            || self.delete.disconnect(id)
            || self.position_changed.disconnect(id)
            || self.modified.disconnect(id)
    }
}

impl Document {
    fn next_handler_id(&mut self) -> SignalHandlerId {
        self.handler_serial += 1;
        SignalHandlerId(self.handler_serial)
    }

    fn connect_object_signal(
        &mut self,
        obj: ObjectId,
        which: ObjectSignal,
        handler: Box<ObjectHandler>,
    ) -> SignalHandlerId {
        let id = self.next_handler_id();
        self.object_mut(obj)
            .signals
            .object_signal(which)
            .connect(id, handler);
        id
    }

    /// Called right before `obj` lets go of its repr and document.
    pub fn connect_release<F>(&mut self, obj: ObjectId, f: F) -> SignalHandlerId
    where
        F: FnMut(&mut Document, ObjectId) + 'static,
    {
        self.connect_object_signal(obj, ObjectSignal::Release, Box::new(f))
    }

    /// Called when `obj` is deleted with observer notification.
    pub fn connect_delete<F>(&mut self, obj: ObjectId, f: F) -> SignalHandlerId
    where
        F: FnMut(&mut Document, ObjectId) + 'static,
    {
        self.connect_object_signal(obj, ObjectSignal::Delete, Box::new(f))
    }

    /// Called when `obj` moves among its siblings.
    pub fn connect_position_changed<F>(&mut self, obj: ObjectId, f: F) -> SignalHandlerId
    where
        F: FnMut(&mut Document, ObjectId) + 'static,
    {
        self.connect_object_signal(obj, ObjectSignal::PositionChanged, Box::new(f))
    }

    /// Called from the modified pass with the flags `obj` was modified with.
    pub fn connect_modified<F>(&mut self, obj: ObjectId, f: F) -> SignalHandlerId
    where
        F: FnMut(&mut Document, ObjectId, ObjectFlags) + 'static,
    {
        let id = self.next_handler_id();
        self.object_mut(obj)
            .signals
            .modified
            .connect(id, Box::new(f));
        id
    }

    /// Disconnects a handler from any signal of `obj`.  Returns whether it was found.
    pub fn disconnect(&mut self, obj: ObjectId, handler: SignalHandlerId) -> bool {
        match self.objects.get_mut(obj) {
            Some(o) => o.signals.disconnect(handler),
            None => false,
        }
    }

    pub(crate) fn emit_object_signal(&mut self, obj: ObjectId, which: ObjectSignal) {
        let mut handlers = match self.objects.get_mut(obj) {
            Some(o) => o.signals.object_signal(which).take(),
            None => return,
        };

        for (_, handler) in handlers.iter_mut() {
            handler(self, obj);
        }

        if let Some(o) = self.objects.get_mut(obj) {
            o.signals.object_signal(which).restore(handlers);
        }
    }

    pub(crate) fn emit_modified_signal(&mut self, obj: ObjectId, flags: ObjectFlags) {
        let mut handlers = match self.objects.get_mut(obj) {
            Some(o) => o.signals.modified.take(),
            None => return,
        };

        for (_, handler) in handlers.iter_mut() {
            handler(self, obj, flags);
        }

        if let Some(o) = self.objects.get_mut(obj) {
            o.signals.modified.restore(handlers);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Counter = dyn FnMut(&mut u32);

    #[test]
    fn keeps_handlers_connected_during_emission() {
        let mut signal: Signal<Counter> = Signal::default();
        signal.connect(SignalHandlerId(1), Box::new(|n: &mut u32| *n += 1));

        let mut taken = signal.take();
        signal.connect(SignalHandlerId(2), Box::new(|n: &mut u32| *n += 10));
        assert!(signal.disconnect(SignalHandlerId(1)));

        let mut n = 0;
        for (_, h) in taken.iter_mut() {
            h(&mut n);
        }
        signal.restore(taken);

        assert_eq!(n, 1);
        assert_eq!(signal.len(), 1);
        assert!(!signal.disconnect(SignalHandlerId(1)));
        assert!(signal.disconnect(SignalHandlerId(2)));
    }
}
