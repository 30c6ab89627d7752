use std::{path::{Path, PathBuf}, str::FromStr, time::Duration};

use crate::{
    insights::{DEFAULT_LOCATION, DEFAULT_MODEL},
    trip::{TripPolicy, DEFAULT_THUMBNAIL},
    ConfigError,
};

/// Settings read from a `key = value` file. Lines starting with `#` are
/// comments; unknown keys are reported and skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub km_per_sample: f64,
    pub moderate_threshold: usize,
    pub tick_interval: Duration,
    pub thumbnail: String,

    pub insights_location: String,
    pub insights_model: String,

    pub log_file: Option<PathBuf>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            km_per_sample: 0.05,
            moderate_threshold: 50,
            tick_interval: Duration::from_secs(1),
            thumbnail: DEFAULT_THUMBNAIL.to_string(),
            insights_location: DEFAULT_LOCATION.to_string(),
            insights_model: DEFAULT_MODEL.to_string(),
            log_file: None,
        }
    }
}

impl Configuration {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for (index, line) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                return Err(ConfigError::MalformedLine { line: line_no });
            };
            let key = key.trim();
            let value = value.trim();

            match key {
                "km_per_sample" => {
                    let km: f64 = parse_value(line_no, key, value)?;
                    if !km.is_finite() || km < 0.0 {
                        return Err(invalid(line_no, key, value));
                    }
                    config.km_per_sample = km;
                }
                "moderate_threshold" => config.moderate_threshold = parse_value(line_no, key, value)?,
                "tick_interval_ms" => {
                    let ms: u64 = parse_value(line_no, key, value)?;
                    if ms == 0 {
                        return Err(invalid(line_no, key, value));
                    }
                    config.tick_interval = Duration::from_millis(ms);
                }
                "thumbnail" => config.thumbnail = value.to_string(),
                "insights_location" => config.insights_location = value.to_string(),
                "insights_model" => config.insights_model = value.to_string(),
                "log_file" => config.log_file = Some(PathBuf::from(value)),
                _ => {
                    tracing::warn!("Unknown config key on line {}: {}", line_no, key);
                }
            }
        }

        Ok(config)
    }

    pub fn policy(&self) -> TripPolicy {
        TripPolicy {
            km_per_sample: self.km_per_sample,
            moderate_threshold: self.moderate_threshold,
            thumbnail: self.thumbnail.clone(),
        }
    }
}

fn parse_value<T: FromStr>(line: usize, key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| invalid(line, key, value))
}

fn invalid(line: usize, key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        line,
        key: key.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Configuration::parse("").unwrap();
        assert_eq!(config, Configuration::default());
        assert_eq!(config.policy(), TripPolicy::default());
    }

    #[test]
    fn parses_known_keys() {
        let config = Configuration::parse(
            "# club settings\n\
             km_per_sample = 0.1\n\
             moderate_threshold=20\n\
             tick_interval_ms = 500\n\
             insights_location = Goiânia, Goiás\n\
             log_file = log/recorder.log\n\
             colour = yellow\n",
        )
        .unwrap();

        assert_eq!(config.km_per_sample, 0.1);
        assert_eq!(config.moderate_threshold, 20);
        assert_eq!(config.tick_interval, Duration::from_millis(500));
        assert_eq!(config.insights_location, "Goiânia, Goiás");
        assert_eq!(config.log_file, Some(PathBuf::from("log/recorder.log")));
        assert_eq!(config.insights_model, DEFAULT_MODEL);
    }

    #[test]
    fn thumbnail_may_contain_equals_signs() {
        let config = Configuration::parse("thumbnail = https://example.org/a.png?w=800&q=80").unwrap();
        assert_eq!(config.thumbnail, "https://example.org/a.png?w=800&q=80");
    }

    #[test]
    fn rejects_bad_lines_and_values() {
        assert!(matches!(Configuration::parse("just words"), Err(ConfigError::MalformedLine { line: 1 })));
        assert!(matches!(
            Configuration::parse("\nmoderate_threshold = many"),
            Err(ConfigError::InvalidValue { line: 2, .. })
        ));
        assert!(Configuration::parse("tick_interval_ms = 0").is_err());
        assert!(matches!(
            Configuration::parse("# rates\nkm_per_sample = -1"),
            Err(ConfigError::InvalidValue { line: 2, ref key, .. }) if key == "km_per_sample"
        ));
        assert!(matches!(
            Configuration::parse("km_per_sample = NaN"),
            Err(ConfigError::InvalidValue { line: 1, .. })
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(Configuration::load("/nonexistent/ride.conf"), Err(ConfigError::Io { .. })));
    }
}
