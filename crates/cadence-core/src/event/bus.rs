// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use flume::{Receiver, Sender, TrySendError};

/// A generic multi-producer, single-consumer hand-off queue.
///
/// Producers hold a [`Sender`] obtained from [`EventBus::sender`]; the owner of
/// the bus drains it from inside a tick with [`EventBus::drain`].
#[derive(Debug)]
pub struct EventBus<T: Send + 'static> {
    sender: Sender<T>,
    receiver: Receiver<T>,
    capacity: Option<usize>,
}

impl<T: Send + 'static> EventBus<T> {
    /// Creates a new EventBus with an unbounded channel.
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        log::info!("EventBus initialized (unbounded).");
        Self {
            sender,
            receiver,
            capacity: None,
        }
    }

    /// Creates a new EventBus that holds at most `capacity` pending events.
    pub fn bounded(capacity: usize) -> Self {
        let (sender, receiver) = flume::bounded(capacity);
        log::info!("EventBus initialized (capacity {capacity}).");
        Self {
            sender,
            receiver,
            capacity: Some(capacity),
        }
    }

    /// Sends an event, logging an error if the receiver is disconnected.
    ///
    /// On a bounded bus this blocks while the queue is full.
    pub fn publish(&self, event: T) {
        log::trace!("Publishing an event.");

        if let Err(e) = self.sender.send(event) {
            log::error!("Failed to send event: {e}. Receiver likely disconnected.");
        }
    }

    /// Sends an event without blocking, handing it back if the queue is full.
    pub fn try_publish(&self, event: T) -> Result<(), T> {
        match self.sender.try_send(event) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(event)) => {
                log::warn!("EventBus full, event rejected.");
                Err(event)
            }
            Err(TrySendError::Disconnected(event)) => Err(event),
        }
    }

    /// Returns a clone of the sender end of the channel.
    /// Hand this to producer threads.
    pub fn sender(&self) -> Sender<T> {
        self.sender.clone()
    }

    /// Returns a reference to the receiver end of the channel.
    pub fn receiver(&self) -> &Receiver<T> {
        &self.receiver
    }

    /// Removes and returns every pending event without blocking, oldest first.
    pub fn drain(&self) -> Vec<T> {
        self.receiver.try_iter().collect()
    }

    /// Returns the number of pending events.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Returns `true` if no event is pending.
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Returns the capacity of a bounded bus, `None` if unbounded.
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }
}

impl<T: Send + 'static> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flume::{SendError, TryRecvError};
    use std::{thread, time::Duration};

    #[derive(Debug, Clone, PartialEq)]
    enum TestInput {
        Axis { index: u8, value: f64 },
        ButtonPressed(u8),
        Disconnected,
    }

    #[test]
    fn event_bus_creation() {
        let bus = EventBus::<TestInput>::new();
        let _sender = bus.sender();
        assert!(bus.is_empty());
        assert_eq!(bus.capacity(), None);
    }

    #[test]
    fn try_receive_empty() {
        let bus = EventBus::<TestInput>::new();
        match bus.receiver().try_recv() {
            Err(TryRecvError::Empty) => {}
            Ok(event) => panic!("Received unexpected event: {event:?}"),
            Err(e) => panic!("Received unexpected error: {e:?}"),
        }
    }

    #[test]
    fn drain_preserves_order() {
        let bus = EventBus::<TestInput>::new();
        bus.publish(TestInput::Axis { index: 0, value: 0.5 });
        bus.publish(TestInput::ButtonPressed(3));
        bus.publish(TestInput::Disconnected);

        assert_eq!(bus.len(), 3);
        assert_eq!(
            bus.drain(),
            vec![
                TestInput::Axis { index: 0, value: 0.5 },
                TestInput::ButtonPressed(3),
                TestInput::Disconnected,
            ]
        );
        assert!(bus.drain().is_empty());
    }

    #[test]
    fn bounded_bus_rejects_when_full() {
        let bus = EventBus::<TestInput>::bounded(1);
        assert!(bus.try_publish(TestInput::ButtonPressed(1)).is_ok());
        assert_eq!(
            bus.try_publish(TestInput::ButtonPressed(2)),
            Err(TestInput::ButtonPressed(2))
        );
        assert_eq!(bus.drain(), vec![TestInput::ButtonPressed(1)]);
    }

    #[test]
    fn send_from_thread() {
        let bus = EventBus::<TestInput>::new();
        let sender = bus.sender();

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            sender
                .send(TestInput::Axis { index: 1, value: -1.0 })
                .expect("Send from thread failed");
        });

        match bus.receiver().recv_timeout(Duration::from_secs(1)) {
            Ok(received) => assert_eq!(received, TestInput::Axis { index: 1, value: -1.0 }),
            Err(e) => panic!("Failed to receive event from thread: {e:?}"),
        }

        handle.join().expect("Thread join failed");
    }

    #[test]
    fn send_error_on_receiver_drop() {
        let bus = EventBus::<TestInput>::new();
        let sender = bus.sender();
        drop(bus);

        match sender.send(TestInput::Disconnected) {
            Err(SendError(_)) => {}
            Ok(()) => panic!("Send unexpectedly succeeded after receiver drop"),
        }
    }
}
