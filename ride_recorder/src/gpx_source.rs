use std::{collections::HashMap, io::Read, path::Path, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use ride_tracker_lib::{
    geo_sample::GeoSample,
    position::{FixSender, PositionEvent, PositionSource, SubscriptionId},
    RecorderError,
};
use thiserror::Error;
use tokio::task::JoinHandle;

/// Gap used between points that carry no time.
const UNTIMED_GAP: Duration = Duration::from_secs(1);

/// Slowest accepted replay; anything slower or invalid replays in real time.
const MIN_SPEEDUP: f64 = 0.01;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid GPX: {0}")]
    Gpx(String),
    #[error("GPX file has no track or route points")]
    Empty,
}

/// One point of a recorded GPX track, as the replay will report it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplayFix {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: Option<DateTime<Utc>>,
}

pub fn read_gpx(path: &Path) -> Result<Vec<ReplayFix>, ReplayError> {
    let file = std::fs::File::open(path).map_err(|source| ReplayError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_gpx(std::io::BufReader::new(file))
}

pub fn parse_gpx(reader: impl Read) -> Result<Vec<ReplayFix>, ReplayError> {
    let gpx = gpx::read(reader).map_err(|err| ReplayError::Gpx(err.to_string()))?;

    let track_points = gpx.tracks.iter()
        .flat_map(|track| track.segments.iter())
        .flat_map(|segment| segment.points.iter());
    let route_points = gpx.routes.iter().flat_map(|route| route.points.iter());

    let fixes: Vec<ReplayFix> = track_points
        .chain(route_points)
        .map(|point| {
            let position = point.point();
            let timestamp = point.time.as_ref()
                .and_then(|time| time.format().ok())
                .and_then(|text| DateTime::parse_from_rfc3339(&text).ok())
                .map(|time| time.with_timezone(&Utc));

            ReplayFix {
                latitude: position.y(),
                longitude: position.x(),
                timestamp,
            }
        })
        .collect();

    if fixes.is_empty() {
        return Err(ReplayError::Empty);
    }

    Ok(fixes)
}

/// Plays a GPX track back as a live position feed, `speedup` times faster than
/// it was recorded.
pub struct ReplaySource {
    fixes: Arc<Vec<ReplayFix>>,
    speedup: f64,
    next_id: u64,
    tasks: HashMap<SubscriptionId, JoinHandle<()>>,
}

impl ReplaySource {
    pub fn new(fixes: Vec<ReplayFix>, speedup: f64) -> Self {
        let speedup = if speedup.is_finite() && speedup >= MIN_SPEEDUP {
            speedup
        } else {
            tracing::warn!("Replay speed {} is out of range, using 1x", speedup);
            1.0
        };

        Self {
            fixes: Arc::new(fixes),
            speedup,
            next_id: 0,
            tasks: HashMap::new(),
        }
    }

    pub fn from_file(path: &Path, speedup: f64) -> Result<Self, ReplayError> {
        let fixes = read_gpx(path)?;
        tracing::info!("Loaded {} points from {}", fixes.len(), path.display());
        Ok(Self::new(fixes, speedup))
    }

    /// Wall-clock time a full replay takes.
    pub fn replay_duration(&self) -> Duration {
        self.fixes
            .windows(2)
            .map(|pair| gap(&pair[0], &pair[1], self.speedup))
            .fold(Duration::ZERO, Duration::saturating_add)
    }
}

fn gap(previous: &ReplayFix, next: &ReplayFix, speedup: f64) -> Duration {
    let recorded = match (previous.timestamp, next.timestamp) {
        (Some(a), Some(b)) => (b - a).to_std().unwrap_or_default(),
        _ => UNTIMED_GAP,
    };
    Duration::try_from_secs_f64(recorded.as_secs_f64() / speedup).unwrap_or(Duration::MAX)
}

impl PositionSource for ReplaySource {
    fn is_available(&self) -> bool {
        !self.fixes.is_empty()
    }

    fn subscribe(&mut self, events: FixSender) -> Result<SubscriptionId, RecorderError> {
        if self.fixes.is_empty() {
            return Err(RecorderError::CapabilityUnavailable);
        }

        self.next_id += 1;
        let subscription = SubscriptionId(self.next_id);
        let fixes = self.fixes.clone();
        let speedup = self.speedup;

        let task = tokio::spawn(async move {
            let mut previous: Option<&ReplayFix> = None;

            for fix in fixes.iter() {
                if let Some(previous) = previous {
                    tokio::time::sleep(gap(previous, fix, speedup)).await;
                }
                previous = Some(fix);

                let timestamp = fix.timestamp.unwrap_or_else(Utc::now);
                let event = PositionEvent {
                    subscription,
                    fix: GeoSample::new(fix.latitude, fix.longitude, timestamp),
                };

                if events.send(event).is_err() {
                    tracing::debug!("Replay {} has no listener, ending", subscription);
                    return;
                }
            }

            tracing::info!("Replay {} delivered all {} points", subscription, fixes.len());
        });

        self.tasks.insert(subscription, task);
        tracing::debug!("Replay subscription {} started", subscription);
        Ok(subscription)
    }

    fn cancel(&mut self, subscription: SubscriptionId) {
        if let Some(task) = self.tasks.remove(&subscription) {
            task.abort();
            tracing::debug!("Replay subscription {} cancelled", subscription);
        }
    }
}
