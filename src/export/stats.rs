use crate::readings::repo_types::GlucoseReading;

/// Summary over a user's whole glucose history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlucoseStats {
    pub count: usize,
    pub mean: f64,
    pub min: i32,
    pub max: i32,
    /// Population standard deviation.
    pub std_dev: f64,
}

impl GlucoseStats {
    pub fn compute(readings: &[GlucoseReading]) -> Option<Self> {
        let levels: Vec<i32> = readings.iter().map(|r| r.glucose_level).collect();
        Self::from_levels(&levels)
    }

    pub fn from_levels(levels: &[i32]) -> Option<Self> {
        let min = *levels.iter().min()?;
        let max = *levels.iter().max()?;
        let n = levels.len() as f64;
        let mean = levels.iter().map(|&l| f64::from(l)).sum::<f64>() / n;
        let variance = levels
            .iter()
            .map(|&l| (f64::from(l) - mean).powi(2))
            .sum::<f64>()
            / n;
        Some(Self {
            count: levels.len(),
            mean,
            min,
            max,
            std_dev: variance.sqrt(),
        })
    }

    /// `(label, value)` lines for the report, values rounded to one decimal.
    pub fn lines(stats: Option<&Self>) -> Vec<(&'static str, String)> {
        match stats {
            Some(s) => vec![
                ("Readings", s.count.to_string()),
                ("Average (mg/dL)", format!("{:.1}", s.mean)),
                ("Minimum (mg/dL)", s.min.to_string()),
                ("Maximum (mg/dL)", s.max.to_string()),
                ("Std. deviation", format!("{:.1}", s.std_dev)),
            ],
            None => vec![
                ("Readings", "0".to_string()),
                ("Average (mg/dL)", "-".to_string()),
                ("Minimum (mg/dL)", "-".to_string()),
                ("Maximum (mg/dL)", "-".to_string()),
                ("Std. deviation", "-".to_string()),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn population_statistics() {
        let s = GlucoseStats::from_levels(&[100, 140, 180]).expect("stats");
        assert_eq!(s.mean, 140.0);
        assert_eq!((s.min, s.max), (100, 180));
        assert!((s.std_dev - 32.659_863).abs() < 1e-5, "{}", s.std_dev);
    }

    #[test]
    fn single_reading_has_zero_spread() {
        let s = GlucoseStats::from_levels(&[95]).expect("stats");
        assert_eq!(s.std_dev, 0.0);
        assert_eq!(s.mean, 95.0);
    }

    #[test]
    fn no_readings_render_dashes() {
        assert!(GlucoseStats::from_levels(&[]).is_none());
        let lines = GlucoseStats::lines(None);
        assert!(lines.iter().skip(1).all(|(_, v)| v == "-"));
    }
}
