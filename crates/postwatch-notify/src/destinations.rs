//! The destination channels opened for one run.
//!
//! Each group's channel is opened once, shared by every profile routed to
//! it, and released by [`Destinations::close_all`] at the end of the run.

use std::collections::BTreeMap;

use postwatch_core::Group;

use crate::notifier::Notifier;

pub struct Destinations<N> {
    channels: BTreeMap<u32, N>,
}

impl<N: Notifier> Destinations<N> {
    pub fn new() -> Self {
        Self {
            channels: BTreeMap::new(),
        }
    }

    /// Opens one channel per group with `open`.
    ///
    /// # Errors
    ///
    /// Returns the first error from `open`. Channels opened before the
    /// failure are dropped.
    pub fn open<E, F>(groups: &[Group], mut open: F) -> Result<Self, E>
    where
        F: FnMut(&Group) -> Result<N, E>,
    {
        let mut destinations = Self::new();
        for group in groups {
            destinations.insert(group.id, open(group)?);
        }
        Ok(destinations)
    }

    pub fn insert(&mut self, group_id: u32, channel: N) {
        self.channels.insert(group_id, channel);
    }

    pub fn get(&self, group_id: u32) -> Option<&N> {
        self.channels.get(&group_id)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Releases every channel.
    pub async fn close_all(self) {
        let count = self.channels.len();
        for channel in self.channels.values() {
            channel.close().await;
        }
        tracing::debug!(count, "closed destination channels");
    }
}

impl<N: Notifier> Default for Destinations<N> {
    fn default() -> Self {
        Self::new()
    }
}
