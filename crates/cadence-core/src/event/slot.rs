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

use std::sync::{Arc, Mutex, PoisonError};

/// A single-slot, last-writer-wins hand-off.
///
/// Cloning yields another handle to the same slot, so the producer thread and
/// the consuming Action can each own one.
#[derive(Debug)]
pub struct LatestSlot<T> {
    value: Arc<Mutex<Option<T>>>,
}

impl<T> LatestSlot<T> {
    /// Creates an empty slot.
    pub fn new() -> Self {
        Self {
            value: Arc::new(Mutex::new(None)),
        }
    }

    /// Stores `value`, returning the one it replaced if it was never taken.
    pub fn put(&self, value: T) -> Option<T> {
        let replaced = self.lock().replace(value);
        if replaced.is_some() {
            log::trace!("LatestSlot: unconsumed value overwritten.");
        }
        replaced
    }

    /// Removes and returns the stored value.
    pub fn take(&self) -> Option<T> {
        self.lock().take()
    }

    /// Returns `true` if a value is waiting.
    pub fn is_filled(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<T>> {
        // The slot holds plain data, a panicking writer cannot leave it half-updated.
        self.value.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> LatestSlot<T> {
    /// Returns a copy of the stored value without consuming it.
    pub fn peek(&self) -> Option<T> {
        self.lock().clone()
    }
}

impl<T> Clone for LatestSlot<T> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
        }
    }
}

impl<T> Default for LatestSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn last_writer_wins() {
        let slot = LatestSlot::new();
        assert_eq!(slot.put(1), None);
        assert_eq!(slot.put(2), Some(1));
        assert_eq!(slot.peek(), Some(2));
        assert_eq!(slot.take(), Some(2));
        assert!(!slot.is_filled());
    }

    #[test]
    fn producer_thread_hands_off() {
        let slot = LatestSlot::new();
        let producer = slot.clone();
        thread::spawn(move || {
            for i in 0..100 {
                producer.put(i);
            }
        })
        .join()
        .expect("producer panicked");
        assert_eq!(slot.take(), Some(99));
    }
}
