//! Trend statistics over a subject's daily history.
//!
//! Backs the `analyzeHealthData` tool: per-vital range and mean, the
//! direction from the first to the last day, days outside normal range
//! and the heart rate / body temperature correlation.

use serde::Serialize;

use crate::models::subject::HistoricalReading;
use crate::models::vital_sign::{AlertStatus, VitalKind, VitalsState};

/// Relative change under which a series counts as stable.
const STABLE_TOLERANCE: f64 = 0.01;

/// |r| from which two series are reported as moving together.
const STRONG_CORRELATION: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub trend: TrendDirection,
    /// Days whose reading is at alert or danger level for this subject.
    pub abnormal_days: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthTrendAnalysis {
    pub subject_id: u64,
    pub readings: usize,
    pub from: Option<String>,
    pub to: Option<String>,
    pub heart_rate: Option<SeriesStats>,
    pub oxygen_saturation: Option<SeriesStats>,
    pub body_temperature: Option<SeriesStats>,
    /// Pearson r of heart rate against body temperature; `None` under two
    /// readings or for a flat series.
    pub heart_rate_temperature_correlation: Option<f64>,
    pub findings: Vec<String>,
}

/// Analyse `readings` (oldest first) against the subject's own thresholds.
pub fn analyze_history(
    subject_id: u64,
    readings: &[HistoricalReading],
    reference: &VitalsState,
) -> HealthTrendAnalysis {
    let heart: Vec<f64> = readings.iter().map(|r| r.heart_rate).collect();
    let oxygen: Vec<f64> = readings.iter().map(|r| r.oxygen_saturation).collect();
    let temperature: Vec<f64> = readings.iter().map(|r| r.body_temperature).collect();

    let heart_rate = series_stats(&heart, reference, VitalKind::HeartRate);
    let oxygen_saturation = series_stats(&oxygen, reference, VitalKind::OxygenSaturation);
    let body_temperature = series_stats(&temperature, reference, VitalKind::BodyTemperature);
    let correlation = pearson(&heart, &temperature);

    let mut findings = Vec::new();
    for (kind, stats) in [
        (VitalKind::HeartRate, &heart_rate),
        (VitalKind::OxygenSaturation, &oxygen_saturation),
        (VitalKind::BodyTemperature, &body_temperature),
    ] {
        if let Some(stats) = stats.as_ref().filter(|s| s.abnormal_days > 0) {
            findings.push(format!(
                "{} outside normal range on {} of {} days",
                kind.display_name(),
                stats.abnormal_days,
                readings.len()
            ));
        }
    }
    if let Some(r) = correlation.filter(|r| r.abs() >= STRONG_CORRELATION) {
        let relation = if r > 0.0 { "rise and fall together" } else { "move in opposite directions" };
        findings.push(format!("Heart rate and body temperature {relation} (r = {r})"));
    }

    HealthTrendAnalysis {
        subject_id,
        readings: readings.len(),
        from: readings.first().map(|r| r.date.clone()),
        to: readings.last().map(|r| r.date.clone()),
        heart_rate,
        oxygen_saturation,
        body_temperature,
        heart_rate_temperature_correlation: correlation,
        findings,
    }
}

fn series_stats(values: &[f64], reference: &VitalsState, kind: VitalKind) -> Option<SeriesStats> {
    let (first, last) = (*values.first()?, *values.last()?);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = values.iter().sum::<f64>() / values.len() as f64;

    let trend = if (last - first).abs() <= first.abs() * STABLE_TOLERANCE {
        TrendDirection::Stable
    } else if last > first {
        TrendDirection::Up
    } else {
        TrendDirection::Down
    };

    let vital = reference.get(kind);
    let abnormal_days = values
        .iter()
        .filter(|value| {
            let mut sample = vital.clone();
            sample.value = **value;
            sample.status() != AlertStatus::Normal
        })
        .count();

    Some(SeriesStats {
        min,
        max,
        mean: round2(mean),
        trend,
        abnormal_days,
    })
}

fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    let mean_x = xs[..n].iter().sum::<f64>() / n as f64;
    let mean_y = ys[..n].iter().sum::<f64>() / n as f64;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in xs[..n].iter().zip(&ys[..n]) {
        let (dx, dy) = (x - mean_x, y - mean_y);
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(round2(cov / (var_x.sqrt() * var_y.sqrt())))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(date: &str, heart_rate: f64, oxygen_saturation: f64, body_temperature: f64) -> HistoricalReading {
        HistoricalReading {
            date: date.into(),
            heart_rate,
            oxygen_saturation,
            body_temperature,
        }
    }

    #[test]
    fn fever_with_rising_pulse_is_flagged() {
        let readings = vec![
            reading("2025-01-01", 70.0, 98.0, 36.8),
            reading("2025-01-02", 80.0, 97.5, 37.4),
            reading("2025-01-03", 95.0, 97.0, 38.1),
            reading("2025-01-04", 105.0, 97.2, 38.6),
        ];
        let analysis = analyze_history(1, &readings, &VitalsState::baseline());

        assert_eq!(analysis.readings, 4);
        assert_eq!(analysis.from.as_deref(), Some("2025-01-01"));
        assert_eq!(analysis.to.as_deref(), Some("2025-01-04"));

        let heart = analysis.heart_rate.as_ref().unwrap();
        assert_eq!((heart.min, heart.max, heart.mean), (70.0, 105.0, 87.5));
        assert_eq!(heart.trend, TrendDirection::Up);
        assert_eq!(heart.abnormal_days, 1);

        let temperature = analysis.body_temperature.as_ref().unwrap();
        assert_eq!(temperature.abnormal_days, 2);
        assert_eq!(analysis.oxygen_saturation.as_ref().unwrap().trend, TrendDirection::Stable);

        assert!(analysis.heart_rate_temperature_correlation.unwrap() > 0.9);
        assert!(analysis
            .findings
            .iter()
            .any(|f| f.starts_with("Heart rate and body temperature rise and fall together")));
        assert!(analysis
            .findings
            .contains(&"Body Temperature outside normal range on 2 of 4 days".to_string()));
    }

    #[test]
    fn falling_series_trends_down() {
        let readings = vec![
            reading("2025-01-01", 90.0, 98.0, 37.0),
            reading("2025-01-02", 70.0, 98.0, 37.0),
        ];
        let analysis = analyze_history(2, &readings, &VitalsState::baseline());
        assert_eq!(analysis.heart_rate.unwrap().trend, TrendDirection::Down);
        assert_eq!(analysis.heart_rate_temperature_correlation, None);
        assert!(analysis.findings.is_empty());
    }

    #[test]
    fn empty_history_has_no_stats() {
        let analysis = analyze_history(3, &[], &VitalsState::baseline());
        assert_eq!(analysis.readings, 0);
        assert!(analysis.heart_rate.is_none());
        assert!(analysis.from.is_none());
        assert!(analysis.heart_rate_temperature_correlation.is_none());
    }
}
