use std::fmt;

use chrono::{DateTime, Local, Utc};
use serde::Serialize;

use crate::{
    format::{estimated_distance_km, format_distance_km, format_elapsed},
    geo_sample::GeoSample,
};

pub const DEFAULT_THUMBNAIL: &str =
    "https://images.unsplash.com/photo-1558981403-c5f91cbba527?q=80&w=800&auto=format&fit=crop";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Difficulty {
    #[serde(rename = "Fácil")]
    Easy,
    #[serde(rename = "Moderada")]
    Moderate,
    #[serde(rename = "Difícil")]
    Hard,
    #[serde(rename = "Lendária")]
    Legendary,
}

impl Difficulty {
    /// Placeholder policy: only the number of samples counts.
    pub fn from_sample_count(sample_count: usize, moderate_threshold: usize) -> Self {
        if sample_count > moderate_threshold {
            Difficulty::Moderate
        } else {
            Difficulty::Easy
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Fácil",
            Difficulty::Moderate => "Moderada",
            Difficulty::Hard => "Difícil",
            Difficulty::Legendary => "Lendária",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TripStatus {
    #[serde(rename = "planejada")]
    Planned,
    #[serde(rename = "concluída")]
    Completed,
    #[serde(rename = "ativa")]
    Active,
}

impl TripStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TripStatus::Planned => "planejada",
            TripStatus::Completed => "concluída",
            TripStatus::Active => "ativa",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "planejada" | "planned" => Some(TripStatus::Planned),
            "concluída" | "concluida" | "completed" => Some(TripStatus::Completed),
            "ativa" | "active" => Some(TripStatus::Active),
            _ => None,
        }
    }
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Knobs used when turning a finished recording into a trip.
#[derive(Debug, Clone, PartialEq)]
pub struct TripPolicy {
    pub km_per_sample: f64,
    pub moderate_threshold: usize,
    pub thumbnail: String,
}

impl Default for TripPolicy {
    fn default() -> Self {
        Self {
            km_per_sample: 0.05,
            moderate_threshold: 50,
            thumbnail: DEFAULT_THUMBNAIL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: String,
    pub title: String,
    pub description: String,
    pub distance: String,
    pub difficulty: Difficulty,
    pub points: Vec<GeoSample>,
    pub status: TripStatus,
    pub thumbnail: Option<String>,
    pub is_official: bool,
}

impl Trip {
    pub fn new(id: String, title: String, description: String, distance: String, difficulty: Difficulty, points: Vec<GeoSample>, status: TripStatus) -> Self {
        Self {
            id,
            title,
            description,
            distance,
            difficulty,
            points,
            status,
            thumbnail: None,
            is_official: false,
        }
    }

    /// Builds the completed trip for a finished recording. Returns `None` when
    /// nothing was recorded.
    pub fn from_recording(samples: Vec<GeoSample>, elapsed_secs: u64, completed_at: DateTime<Utc>, policy: &TripPolicy) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let count = samples.len();
        let local = completed_at.with_timezone(&Local);

        let mut trip = Trip::new(
            uuid::Uuid::new_v4().to_string(),
            format!("Rota {}", local.format("%d/%m/%Y %H:%M")),
            format!("Percurso gravado ao vivo. Duração: {}.", format_elapsed(elapsed_secs)),
            format_distance_km(estimated_distance_km(count, policy.km_per_sample)),
            Difficulty::from_sample_count(count, policy.moderate_threshold),
            samples,
            TripStatus::Completed,
        );
        trip.thumbnail = Some(policy.thumbnail.clone());

        Some(trip)
    }

    /// Great-circle length of the recorded path in km.
    pub fn geodesic_km(&self) -> f64 {
        self.points
            .windows(2)
            .map(|pair| pair[0].distance_km(&pair[1]))
            .sum()
    }
}
