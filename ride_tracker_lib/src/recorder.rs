use chrono::{DateTime, Utc};

use crate::{
    clock::Clock,
    format::{estimated_distance_km, format_distance_km, format_elapsed},
    geo_sample::GeoSample,
    position::{FixSender, PositionEvent, PositionSource, SubscriptionId},
    trip::{Trip, TripPolicy},
    SampleError,
};

/// Receives completed trips. Any `FnMut(Trip)` is a sink.
pub trait TripSink {
    fn accept(&mut self, trip: Trip);
}

impl<F: FnMut(Trip)> TripSink for F {
    fn accept(&mut self, trip: Trip) {
        self(trip)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecorderState {
    Idle,
    Recording {
        subscription: SubscriptionId,
        started_at: DateTime<Utc>,
        elapsed_secs: u64,
        samples: Vec<GeoSample>,
    },
}

/// What the trip handed to the sink looked like.
#[derive(Debug, Clone, PartialEq)]
pub struct TripReceipt {
    pub trip_id: String,
    pub title: String,
    pub sample_count: usize,
    pub distance: String,
    pub duration: String,
}

/// Outcome of a lifecycle operation, for the presentation layer to announce.
#[derive(Debug, Clone, PartialEq)]
pub enum RecorderEvent {
    Started,
    AlreadyRecording,
    CapabilityUnavailable,
    Stopped(Option<TripReceipt>),
}

impl RecorderEvent {
    pub fn notice(&self) -> &'static str {
        match self {
            RecorderEvent::Started => "Gravação iniciada.",
            RecorderEvent::AlreadyRecording => "A gravação já está em andamento.",
            RecorderEvent::CapabilityUnavailable => "Geolocalização não suportada.",
            RecorderEvent::Stopped(_) => "Percurso salvo com sucesso na sede virtual!",
        }
    }
}

pub struct TripRecorder<P: PositionSource, C: Clock> {
    source: P,
    clock: C,
    policy: TripPolicy,
    fixes: FixSender,
    state: RecorderState,
}

impl<P: PositionSource, C: Clock> TripRecorder<P, C> {
    /// `fixes` is handed to the source on every subscription; whoever holds the
    /// receiving end feeds the events back through `handle_position`.
    pub fn new(source: P, clock: C, policy: TripPolicy, fixes: FixSender) -> Self {
        Self {
            source,
            clock,
            policy,
            fixes,
            state: RecorderState::Idle,
        }
    }

    pub fn state(&self) -> &RecorderState {
        &self.state
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, RecorderState::Recording { .. })
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        match &self.state {
            RecorderState::Recording { started_at, .. } => Some(*started_at),
            RecorderState::Idle => None,
        }
    }

    pub fn elapsed_secs(&self) -> u64 {
        match &self.state {
            RecorderState::Recording { elapsed_secs, .. } => *elapsed_secs,
            RecorderState::Idle => 0,
        }
    }

    pub fn elapsed_display(&self) -> String {
        format_elapsed(self.elapsed_secs())
    }

    pub fn samples(&self) -> &[GeoSample] {
        match &self.state {
            RecorderState::Recording { samples, .. } => samples,
            RecorderState::Idle => &[],
        }
    }

    /// Live estimate shown while recording.
    pub fn live_distance(&self) -> String {
        format_distance_km(estimated_distance_km(self.samples().len(), self.policy.km_per_sample))
    }

    pub fn start(&mut self) -> RecorderEvent {
        if self.is_recording() {
            tracing::debug!("Start requested while already recording");
            return RecorderEvent::AlreadyRecording;
        }

        if !self.source.is_available() {
            tracing::warn!("No position-sampling capability, recording not started");
            return RecorderEvent::CapabilityUnavailable;
        }

        let subscription = match self.source.subscribe(self.fixes.clone()) {
            Ok(subscription) => subscription,
            Err(err) => {
                tracing::warn!("Failed to subscribe to positions: {err}");
                return RecorderEvent::CapabilityUnavailable;
            }
        };

        let started_at = self.clock.now();
        self.state = RecorderState::Recording {
            subscription,
            started_at,
            elapsed_secs: 0,
            samples: Vec::new(),
        };

        tracing::info!("Recording started at {} on subscription {}", started_at, subscription);
        RecorderEvent::Started
    }

    /// Recomputes elapsed time from the clock. Called once per second while
    /// recording; a no-op when idle.
    pub fn tick(&mut self) {
        let now = self.clock.now();
        if let RecorderState::Recording { started_at, elapsed_secs, .. } = &mut self.state {
            *elapsed_secs = (now - *started_at).num_seconds().max(0) as u64;
            tracing::trace!("Elapsed {}", format_elapsed(*elapsed_secs));
        }
    }

    pub fn handle_position(&mut self, event: PositionEvent) {
        match event.fix {
            Ok(sample) => self.record_fix(event.subscription, sample),
            Err(err) => self.record_error(event.subscription, err),
        }
    }

    /// Appends a sample if it belongs to the active subscription. Anything else
    /// is a late fix from a cancelled subscription and is dropped.
    pub fn record_fix(&mut self, from: SubscriptionId, sample: GeoSample) {
        match &mut self.state {
            RecorderState::Recording { subscription, samples, .. } if *subscription == from => {
                samples.push(sample);
                tracing::debug!("Fix {} at ({}, {}), {} samples", from, sample.latitude(), sample.longitude(), samples.len());
            }
            _ => {
                tracing::warn!("Dropped fix from inactive subscription {}", from);
            }
        }
    }

    pub fn record_error(&mut self, from: SubscriptionId, error: SampleError) {
        if self.is_recording() {
            tracing::warn!("Position fix failed on subscription {}: {}", from, error);
        } else {
            tracing::debug!("Ignoring fix error from inactive subscription {}: {}", from, error);
        }
    }

    /// Ends the session. The subscription is cancelled before the samples are
    /// read, so nothing can be appended to the trip afterwards. The sink gets at
    /// most one trip, and only when at least one sample was recorded.
    pub fn stop(&mut self, sink: &mut impl TripSink) -> RecorderEvent {
        let RecorderState::Recording { subscription, started_at, samples, .. } =
            std::mem::replace(&mut self.state, RecorderState::Idle)
        else {
            tracing::debug!("Stop requested while idle");
            return RecorderEvent::Stopped(None);
        };

        self.source.cancel(subscription);

        let completed_at = self.clock.now();
        let elapsed_secs = (completed_at - started_at).num_seconds().max(0) as u64;
        let sample_count = samples.len();

        let Some(trip) = Trip::from_recording(samples, elapsed_secs, completed_at, &self.policy) else {
            tracing::info!("Recording stopped after {} with no samples, nothing saved", format_elapsed(elapsed_secs));
            return RecorderEvent::Stopped(None);
        };

        let receipt = TripReceipt {
            trip_id: trip.id.clone(),
            title: trip.title.clone(),
            sample_count,
            distance: trip.distance.clone(),
            duration: format_elapsed(elapsed_secs),
        };

        tracing::info!("Recording stopped: {} samples, {}, {}", sample_count, receipt.distance, receipt.duration);
        sink.accept(trip);

        RecorderEvent::Stopped(Some(receipt))
    }
}
