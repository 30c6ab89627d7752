//! Event loop around a [`TripRecorder`].
//!
//! Commands, position fixes and the elapsed-time ticker are all handled by one
//! task, one at a time, so the recorder needs no locking. The ticker only
//! exists while recording.

use std::time::Duration;

use tokio::{
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    time::{Instant, Interval, MissedTickBehavior},
};

use crate::{
    clock::Clock,
    position::{PositionEvent, PositionSource},
    recorder::{RecorderEvent, TripRecorder, TripSink},
    trip::TripPolicy,
    RecorderError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderCommand {
    Start,
    Stop,
    Shutdown,
}

/// Live numbers for the recording display.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub elapsed: String,
    pub samples: usize,
    pub distance: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ServiceEvent {
    Notice(RecorderEvent),
    Progress(Progress),
}

/// Cheap, cloneable way for the presentation layer to drive the service.
#[derive(Debug, Clone)]
pub struct RecorderHandle {
    commands: UnboundedSender<RecorderCommand>,
}

impl RecorderHandle {
    pub fn start(&self) -> Result<(), RecorderError> {
        self.send(RecorderCommand::Start)
    }

    pub fn stop(&self) -> Result<(), RecorderError> {
        self.send(RecorderCommand::Stop)
    }

    pub fn shutdown(&self) -> Result<(), RecorderError> {
        self.send(RecorderCommand::Shutdown)
    }

    fn send(&self, command: RecorderCommand) -> Result<(), RecorderError> {
        self.commands.send(command).map_err(|_| RecorderError::ServiceClosed)
    }
}

pub struct RecorderService<P: PositionSource, C: Clock, K: TripSink> {
    recorder: TripRecorder<P, C>,
    sink: K,
    tick_period: Duration,
    commands: UnboundedReceiver<RecorderCommand>,
    fixes: UnboundedReceiver<PositionEvent>,
    events: UnboundedSender<ServiceEvent>,
}

impl<P: PositionSource, C: Clock, K: TripSink> RecorderService<P, C, K> {
    pub fn new(source: P, clock: C, policy: TripPolicy, sink: K, tick_period: Duration) -> (Self, RecorderHandle, UnboundedReceiver<ServiceEvent>) {
        let (command_tx, commands) = mpsc::unbounded_channel();
        let (fix_tx, fixes) = mpsc::unbounded_channel();
        let (events, event_rx) = mpsc::unbounded_channel();

        let service = Self {
            recorder: TripRecorder::new(source, clock, policy, fix_tx),
            sink,
            tick_period,
            commands,
            fixes,
            events,
        };

        (service, RecorderHandle { commands: command_tx }, event_rx)
    }

    /// Runs until shut down (or every handle is dropped) and gives the sink
    /// back. A session still recording at that point is stopped first.
    pub async fn run(mut self) -> K {
        let mut ticker: Option<Interval> = None;

        tracing::info!("Recorder service running");

        loop {
            tokio::select! {
                biased;

                command = self.commands.recv() => match command {
                    Some(RecorderCommand::Start) => {
                        let event = self.recorder.start();
                        if event == RecorderEvent::Started {
                            ticker = Some(new_ticker(self.tick_period));
                        }
                        self.notify(ServiceEvent::Notice(event));
                    }
                    Some(RecorderCommand::Stop) => {
                        ticker = None;
                        self.drain_fixes();
                        let event = self.recorder.stop(&mut self.sink);
                        self.notify(ServiceEvent::Notice(event));
                    }
                    Some(RecorderCommand::Shutdown) | None => {
                        if self.recorder.is_recording() {
                            self.drain_fixes();
                            let event = self.recorder.stop(&mut self.sink);
                            self.notify(ServiceEvent::Notice(event));
                        }
                        break;
                    }
                },

                Some(event) = self.fixes.recv() => {
                    self.recorder.handle_position(event);
                }

                _ = next_tick(&mut ticker) => {
                    self.recorder.tick();
                    let progress = Progress {
                        elapsed: self.recorder.elapsed_display(),
                        samples: self.recorder.samples().len(),
                        distance: self.recorder.live_distance(),
                    };
                    self.notify(ServiceEvent::Progress(progress));
                }
            }
        }

        tracing::info!("Recorder service stopped");
        self.sink
    }

    /// Fixes already queued were sent before the stop, so they still belong to
    /// the session.
    fn drain_fixes(&mut self) {
        while let Ok(event) = self.fixes.try_recv() {
            self.recorder.handle_position(event);
        }
    }

    fn notify(&self, event: ServiceEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!("No listener for recorder events");
        }
    }
}

fn new_ticker(period: Duration) -> Interval {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}
