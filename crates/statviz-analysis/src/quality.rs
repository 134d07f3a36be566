//! Local data-quality statistics: descriptive summary, a Kolmogorov-Smirnov
//! normality screen, Levene's test and a histogram.
//!
//! These are quick screens computed in-process; p-values are approximations.

use std::collections::BTreeMap;

use serde::Serialize;

use statviz_model::Dataset;

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

fn median_of_sorted(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Descriptive statistics; variance is the population variance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Descriptive {
    pub mean: f64,
    pub median: f64,
    pub mode: f64,
    pub variance: f64,
    pub standard_deviation: f64,
    pub count: usize,
    pub min: f64,
    pub max: f64,
}

/// Summarize `values`, rounding mean, median, variance and SD to 4 places.
pub fn describe(values: &[f64]) -> Option<Descriptive> {
    if values.is_empty() {
        return None;
    }
    let sorted = sorted(values);
    let avg = mean(values);
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;

    // Ties go to the smallest value.
    let mut mode = sorted[0];
    let mut best = 0usize;
    let mut run_start = 0usize;
    for idx in 1..=sorted.len() {
        if idx == sorted.len() || sorted[idx] != sorted[run_start] {
            let run = idx - run_start;
            if run > best {
                best = run;
                mode = sorted[run_start];
            }
            run_start = idx;
        }
    }

    Some(Descriptive {
        mean: round4(avg),
        median: round4(median_of_sorted(&sorted)),
        mode,
        variance: round4(variance),
        standard_deviation: round4(variance.sqrt()),
        count: values.len(),
        min: sorted[0],
        max: sorted[sorted.len() - 1],
    })
}

/// Error function, Abramowitz and Stegun 7.1.26 (max error 1.5e-7).
pub fn erf(x: f64) -> f64 {
    const A1: f64 = 0.254_829_592;
    const A2: f64 = -0.284_496_736;
    const A3: f64 = 1.421_413_741;
    const A4: f64 = -1.453_152_027;
    const A5: f64 = 1.061_405_429;
    const P: f64 = 0.327_591_1;

    let sign = if x >= 0.0 { 1.0 } else { -1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + P * x);
    let y = 1.0 - ((((A5 * t + A4) * t + A3) * t + A2) * t + A1) * t * (-x * x).exp();
    sign * y
}

fn normal_cdf(x: f64, mean: f64, std: f64) -> f64 {
    0.5 * (1.0 + erf((x - mean) / (std * std::f64::consts::SQRT_2)))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KsResult {
    pub d: f64,
    /// Large-sample approximation `exp(-2 n d²)`.
    pub p_value: f64,
}

/// One-sample KS test against a normal with the sample's mean and SD.
///
/// `None` for an empty or constant sample.
pub fn ks_normality(values: &[f64]) -> Option<KsResult> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let sorted = sorted(values);
    let avg = mean(&sorted);
    let std = (sorted.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / n).sqrt();
    if std == 0.0 || !std.is_finite() {
        return None;
    }
    let d = sorted
        .iter()
        .enumerate()
        .map(|(idx, value)| ((idx + 1) as f64 / n - normal_cdf(*value, avg, std)).abs())
        .fold(0.0, f64::max);
    Some(KsResult {
        d,
        p_value: (-2.0 * n * d * d).exp(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LeveneResult {
    pub w: f64,
    /// Not computed.
    pub p_value: Option<f64>,
}

/// Median-centred Levene (Brown-Forsythe) statistic.
///
/// `None` when the inputs are empty or of different lengths, when there are
/// fewer than two groups, or when the statistic is undefined.
pub fn levene(values: &[f64], groups: &[String]) -> Option<LeveneResult> {
    if values.is_empty() || values.len() != groups.len() {
        return None;
    }
    let mut by_group: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for (value, group) in values.iter().zip(groups) {
        by_group.entry(group.as_str()).or_default().push(*value);
    }
    let k = by_group.len();
    if k < 2 {
        return None;
    }

    let deviations: Vec<Vec<f64>> = by_group
        .values()
        .map(|members| {
            let median = median_of_sorted(&sorted(members));
            members.iter().map(|v| (v - median).abs()).collect()
        })
        .collect();
    let n: usize = deviations.iter().map(Vec::len).sum();
    let overall = deviations.iter().flatten().sum::<f64>() / n as f64;
    let group_means: Vec<f64> = deviations.iter().map(|d| mean(d)).collect();

    let ss_between: f64 = deviations
        .iter()
        .zip(&group_means)
        .map(|(d, m)| d.len() as f64 * (m - overall).powi(2))
        .sum();
    let ss_within: f64 = deviations
        .iter()
        .zip(&group_means)
        .map(|(d, m)| d.iter().map(|v| (v - m).powi(2)).sum::<f64>())
        .sum();
    let w = (ss_between / (k - 1) as f64) / (ss_within / (n - k) as f64);
    w.is_finite().then_some(LeveneResult { w, p_value: None })
}

/// Levene's test over two dataset columns, pairing values row by row.
pub fn levene_by_column(
    dataset: &Dataset,
    value_col: &str,
    group_col: &str,
) -> Option<LeveneResult> {
    let (values, groups): (Vec<f64>, Vec<String>) = dataset
        .rows
        .iter()
        .filter_map(|row| {
            let value = row.get(value_col)?.as_f64()?;
            let group = row.get(group_col).filter(|g| !g.is_blank())?;
            Some((value, group.to_string()))
        })
        .unzip();
    levene(&values, &groups)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Equal-width histogram over `[min, max]`; the max lands in the last bin.
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for value in values {
        let idx = if width > 0.0 {
            (((value - min) / width).floor() as usize).min(bins - 1)
        } else {
            0
        };
        counts[idx] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(idx, count)| HistogramBin {
            lower: min + idx as f64 * width,
            upper: min + (idx + 1) as f64 * width,
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use statviz_model::DataRow;

    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn describe_matches_hand_computation() {
        let stats = describe(&[2.0, 4.0, 4.0, 5.0, 7.0, 9.0]).expect("stats");
        assert!(close(stats.mean, 5.1667));
        assert!(close(stats.median, 4.5));
        assert!(close(stats.mode, 4.0));
        assert!(close(stats.variance, 5.1389));
        assert!(close(stats.standard_deviation, 2.2669));
        assert_eq!(stats.count, 6);
        assert!(close(stats.min, 2.0));
        assert!(close(stats.max, 9.0));
        assert!(describe(&[]).is_none());
    }

    #[test]
    fn erf_reference_points() {
        assert!(erf(0.0).abs() < 1e-7);
        assert!((erf(1.0) - 0.842_700_79).abs() < 2e-7);
        assert!((erf(-1.0) + 0.842_700_79).abs() < 2e-7);
    }

    #[test]
    fn ks_on_symmetric_sample() {
        let result = ks_normality(&[1.0, 2.0, 3.0, 4.0, 5.0]).expect("ks");
        assert!(result.d > 0.0 && result.d < 0.5);
        assert!(close(result.p_value, (-2.0 * 5.0 * result.d * result.d).exp()));
        assert!(ks_normality(&[3.0, 3.0]).is_none());
    }

    #[test]
    fn levene_needs_two_groups_and_matching_lengths() {
        let values = [1.0, 2.0, 3.0, 10.0, 20.0, 30.0];
        let groups: Vec<String> = ["a", "a", "a", "b", "b", "b"].map(String::from).to_vec();
        let result = levene(&values, &groups).expect("levene");
        // deviations: a = [1,0,1], b = [10,0,10]
        assert!(close(result.w, 3.207_920_792));
        assert_eq!(result.p_value, None);

        assert!(levene(&values, &groups[..5]).is_none());
        let one_group = vec!["a".to_string(); 6];
        assert!(levene(&values, &one_group).is_none());
    }

    #[test]
    fn levene_by_column_pairs_rows() {
        let rows = vec![
            DataRow::new().with("Yield", 1.0).with("Variety", "A"),
            DataRow::new().with("Yield", "n/a").with("Variety", "A"),
            DataRow::new().with("Yield", 2.0).with("Variety", "A"),
            DataRow::new().with("Yield", 3.0).with("Variety", "A"),
            DataRow::new().with("Yield", 10.0).with("Variety", "B"),
            DataRow::new().with("Yield", 20.0).with("Variety", "B"),
            DataRow::new().with("Yield", 30.0).with("Variety", "B"),
        ];
        let dataset = Dataset::new("trial.csv", Vec::new(), rows);
        let result = levene_by_column(&dataset, "Yield", "Variety").expect("levene");
        assert!(close(result.w, 3.207_920_792));
    }

    #[test]
    fn histogram_puts_max_in_last_bin() {
        let bins = histogram(&[0.0, 1.0, 2.0, 10.0], 10);
        assert_eq!(bins.len(), 10);
        assert_eq!(bins[0].count, 1);
        assert_eq!(bins[1].count, 1);
        assert_eq!(bins[2].count, 1);
        assert_eq!(bins[9].count, 1);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 4);

        let flat = histogram(&[5.0, 5.0], 4);
        assert_eq!(flat[0].count, 2);
    }
}
