/// `H:MM:SS` from one hour up, `MM:SS` below. Hours are not padded.
pub fn format_elapsed(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{:02}:{:02}", mins, secs)
    }
}

/// Placeholder estimate: a fixed distance per recorded sample.
pub fn estimated_distance_km(sample_count: usize, km_per_sample: f64) -> f64 {
    sample_count as f64 * km_per_sample
}

pub fn format_distance_km(km: f64) -> String {
    format!("{:.2} km", km)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_below_an_hour() {
        assert_eq!(format_elapsed(0), "00:00");
        assert_eq!(format_elapsed(45), "00:45");
        assert_eq!(format_elapsed(125), "02:05");
        assert_eq!(format_elapsed(3599), "59:59");
    }

    #[test]
    fn elapsed_with_hours() {
        assert_eq!(format_elapsed(3600), "1:00:00");
        assert_eq!(format_elapsed(3661), "1:01:01");
        assert_eq!(format_elapsed(36_000 + 59), "10:00:59");
    }

    #[test]
    fn distance_from_sample_count() {
        assert_eq!(format_distance_km(estimated_distance_km(40, 0.05)), "2.00 km");
        assert_eq!(format_distance_km(estimated_distance_km(3, 0.05)), "0.15 km");
        assert_eq!(format_distance_km(estimated_distance_km(0, 0.05)), "0.00 km");
    }
}
