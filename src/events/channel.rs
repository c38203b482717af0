//! Event channel over crossbeam-channel.

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};

use super::{Event, MediaEvent, MediaPhase};

/// Emitting half, handed to the pipeline and the driver.
///
/// Cloning is cheap. A sender whose listener has gone away keeps accepting
/// events and discards them, so a run never fails because nobody watches it.
#[derive(Clone, Default)]
pub struct EventSender {
    inner: Option<Sender<Event>>,
}

impl EventSender {
    pub fn new(sender: Sender<Event>) -> Self {
        Self {
            inner: Some(sender),
        }
    }

    pub fn send(&self, event: Event) {
        if let Some(sender) = &self.inner {
            let _ = sender.send(event);
        }
    }

    /// Announce the driver moving to another media phase
    pub fn phase(&self, phase: MediaPhase) {
        self.send(Event::Media(MediaEvent::PhaseChanged { phase }));
    }
}

/// Listening half
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    pub fn recv(&self) -> Option<Event> {
        self.inner.recv().ok()
    }

    /// Everything already queued, without blocking
    pub fn drain(&self) -> Vec<Event> {
        self.inner.try_iter().collect()
    }

    /// Blocking iterator that ends once every sender is dropped
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }
}

/// Connected sender/receiver pairs
pub struct EventChannel;

impl EventChannel {
    pub fn new() -> (EventSender, EventReceiver) {
        let (sender, receiver) = unbounded();
        (EventSender::new(sender), EventReceiver { inner: receiver })
    }

    /// Bounded variant. A full channel stalls the pipeline's consumer thread
    /// until the listener catches up.
    pub fn bounded(capacity: usize) -> (EventSender, EventReceiver) {
        let (sender, receiver) = bounded(capacity);
        (EventSender::new(sender), EventReceiver { inner: receiver })
    }
}

/// Sender for runs nobody listens to; events go nowhere.
pub fn null_sender() -> EventSender {
    EventSender::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::PipelineEvent;
    use std::thread;

    #[test]
    fn phases_cross_threads() {
        let (sender, receiver) = EventChannel::new();

        thread::spawn(move || sender.phase(MediaPhase::SplittingFrames))
            .join()
            .unwrap();

        match receiver.recv() {
            Some(Event::Media(MediaEvent::PhaseChanged { phase })) => {
                assert_eq!(phase, MediaPhase::SplittingFrames);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn null_sender_discards_events() {
        let sender = null_sender();
        sender.send(Event::Pipeline(PipelineEvent::Cancelled));
        sender.phase(MediaPhase::Scoring);
    }

    #[test]
    fn sending_after_listener_is_gone_is_harmless() {
        let (sender, receiver) = EventChannel::bounded(1);
        drop(receiver);
        sender.send(Event::Pipeline(PipelineEvent::Cancelled));
        sender.send(Event::Pipeline(PipelineEvent::Cancelled));
    }

    #[test]
    fn drain_returns_only_queued_events() {
        let (sender, receiver) = EventChannel::bounded(4);
        sender.phase(MediaPhase::StrippingSound);
        sender.phase(MediaPhase::SplittingFrames);

        assert_eq!(receiver.drain().len(), 2);
        assert!(receiver.drain().is_empty());

        drop(sender);
        assert!(receiver.recv().is_none());
    }
}
