//! The continuous position-sampling capability the recorder depends on.
//!
//! A source pushes every fix (or failed fix) into the channel it was handed on
//! `subscribe`, tagged with the subscription it belongs to. Fixes tagged with a
//! cancelled subscription may still be in flight; consumers must drop them.

use std::fmt;

use tokio::sync::mpsc::UnboundedSender;

use crate::{geo_sample::GeoSample, RecorderError, SampleError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionEvent {
    pub subscription: SubscriptionId,
    pub fix: Result<GeoSample, SampleError>,
}

pub type FixSender = UnboundedSender<PositionEvent>;

pub trait PositionSource {
    /// Whether the host offers position sampling at all.
    fn is_available(&self) -> bool;

    fn subscribe(&mut self, events: FixSender) -> Result<SubscriptionId, RecorderError>;

    fn cancel(&mut self, subscription: SubscriptionId);
}

/// Scripted source for tests: fixes are pushed by hand.
#[cfg(test)]
pub(crate) mod fake {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Default)]
    struct Inner {
        available: bool,
        next_id: u64,
        sender: Option<FixSender>,
        last: Option<SubscriptionId>,
        active: Option<SubscriptionId>,
        cancelled: Vec<SubscriptionId>,
    }

    #[derive(Clone, Default)]
    pub struct FakeSource {
        inner: Arc<Mutex<Inner>>,
    }

    impl FakeSource {
        pub fn available() -> Self {
            let source = Self::default();
            source.inner.lock().unwrap().available = true;
            source
        }

        pub fn unavailable() -> Self {
            Self::default()
        }

        /// Delivers a fix on the most recent subscription, even after it was
        /// cancelled, the way an in-flight platform callback would.
        pub fn deliver(&self, latitude: f64, longitude: f64, timestamp_ms: i64) -> bool {
            self.push(GeoSample::from_millis(latitude, longitude, timestamp_ms))
        }

        pub fn fail(&self, error: SampleError) -> bool {
            self.push(Err(error))
        }

        fn push(&self, fix: Result<GeoSample, SampleError>) -> bool {
            let inner = self.inner.lock().unwrap();
            match (&inner.sender, inner.last) {
                (Some(sender), Some(subscription)) => sender.send(PositionEvent { subscription, fix }).is_ok(),
                _ => false,
            }
        }

        pub fn active(&self) -> Option<SubscriptionId> {
            self.inner.lock().unwrap().active
        }

        pub fn cancelled(&self) -> Vec<SubscriptionId> {
            self.inner.lock().unwrap().cancelled.clone()
        }

        pub fn subscriptions(&self) -> u64 {
            self.inner.lock().unwrap().next_id
        }
    }

    impl PositionSource for FakeSource {
        fn is_available(&self) -> bool {
            self.inner.lock().unwrap().available
        }

        fn subscribe(&mut self, events: FixSender) -> Result<SubscriptionId, RecorderError> {
            let mut inner = self.inner.lock().unwrap();
            if !inner.available {
                return Err(RecorderError::CapabilityUnavailable);
            }
            inner.next_id += 1;
            let id = SubscriptionId(inner.next_id);
            inner.sender = Some(events);
            inner.last = Some(id);
            inner.active = Some(id);
            Ok(id)
        }

        fn cancel(&mut self, subscription: SubscriptionId) {
            let mut inner = self.inner.lock().unwrap();
            if inner.active == Some(subscription) {
                inner.active = None;
            }
            inner.cancelled.push(subscription);
        }
    }
}
