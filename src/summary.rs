//! Per-column statistical summary of the dataset (the home view's
//! `describe` table).

use crate::dataset::CrimeDataset;
use crate::types::indicators::Indicator;

/// Descriptive statistics for one numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (ddof = 1); NaN for fewer than two rows.
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Linear-interpolated quantile over an already sorted, non-empty slice.
pub(crate) fn quantile(sorted: &[f64], q: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    debug_assert!((0.0..=1.0).contains(&q));

    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }

    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

fn summarize(column: &str, mut values: Vec<f64>) -> ColumnSummary {
    // CSV loading rejects non-finite columns; total order keeps this a pure
    // query even for hand-built in-memory datasets.
    values.sort_by(f64::total_cmp);

    let count = values.len();
    let mean = values.iter().sum::<f64>() / count as f64;

    let std = if count < 2 {
        f64::NAN
    } else {
        let variance =
            values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
        variance.sqrt()
    };

    ColumnSummary {
        column: column.to_string(),
        count,
        mean,
        std,
        min: values[0],
        q25: quantile(&values, 0.25),
        median: quantile(&values, 0.5),
        q75: quantile(&values, 0.75),
        max: values[count - 1],
    }
}

impl CrimeDataset {
    /// Descriptive statistics for every numeric column: year, cases and the
    /// fourteen indicators, in dataset column order.
    ///
    /// Empty for an empty dataset.
    pub fn describe(&self) -> Vec<ColumnSummary> {
        if self.is_empty() {
            return Vec::new();
        }

        let records = self.records();
        let mut summaries = Vec::with_capacity(2 + Indicator::ALL.len());

        summaries.push(summarize(
            "Year",
            records.iter().map(|r| r.year as f64).collect(),
        ));
        summaries.push(summarize(
            "Cases",
            records.iter().map(|r| r.cases as f64).collect(),
        ));
        for indicator in Indicator::ALL {
            summaries.push(summarize(
                indicator.name(),
                records.iter().map(|r| r.indicator(indicator)).collect(),
            ));
        }

        summaries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::CrimeRecord;

    #[test]
    fn test_quantile_interpolates_linearly() {
        let values = [10.0, 20.0, 30.0, 40.0];
        assert_eq!(quantile(&values, 0.0), 10.0);
        assert_eq!(quantile(&values, 0.25), 17.5);
        assert_eq!(quantile(&values, 0.5), 25.0);
        assert_eq!(quantile(&values, 0.75), 32.5);
        assert_eq!(quantile(&values, 1.0), 40.0);
    }

    #[test]
    fn test_quantile_on_exact_position() {
        let values = [1.0, 2.0, 3.0];
        assert_eq!(quantile(&values, 0.5), 2.0);
    }

    #[test]
    fn test_describe_covers_all_numeric_columns() {
        let dataset = CrimeDataset::from_records(vec![
            CrimeRecord::new("Kerala", "Theft", 2022, 100),
            CrimeRecord::new("Bihar", "Theft", 2023, 300),
        ]);

        let summaries = dataset.describe();
        assert_eq!(summaries.len(), 16);
        assert_eq!(summaries[0].column, "Year");
        assert_eq!(summaries[1].column, "Cases");
        assert_eq!(summaries[2].column, "unemployment_rate");
    }

    #[test]
    fn test_describe_cases_statistics() {
        let dataset = CrimeDataset::from_records(vec![
            CrimeRecord::new("Kerala", "Theft", 2022, 100),
            CrimeRecord::new("Bihar", "Theft", 2022, 200),
            CrimeRecord::new("Goa", "Theft", 2022, 300),
        ]);

        let cases = &dataset.describe()[1];
        assert_eq!(cases.count, 3);
        assert_eq!(cases.mean, 200.0);
        assert_eq!(cases.std, 100.0);
        assert_eq!(cases.min, 100.0);
        assert_eq!(cases.q25, 150.0);
        assert_eq!(cases.median, 200.0);
        assert_eq!(cases.q75, 250.0);
        assert_eq!(cases.max, 300.0);
    }

    #[test]
    fn test_describe_single_row_has_nan_std() {
        let dataset =
            CrimeDataset::from_records(vec![CrimeRecord::new("Kerala", "Theft", 2022, 100)]);
        let cases = &dataset.describe()[1];
        assert_eq!(cases.count, 1);
        assert!(cases.std.is_nan());
        assert_eq!(cases.min, cases.max);
    }

    #[test]
    fn test_describe_tolerates_non_finite_in_memory_values() {
        let mut records = vec![
            CrimeRecord::new("Kerala", "Theft", 2022, 100),
            CrimeRecord::new("Bihar", "Theft", 2022, 200),
        ];
        records[0].literacy_rate = f64::NAN;

        // CSV loading rejects this; in-memory datasets still summarize
        // without panicking, with NaN flowing into the affected column.
        let summaries = CrimeDataset::from_records(records).describe();
        let literacy = summaries
            .iter()
            .find(|s| s.column == "literacy_rate")
            .unwrap();
        assert!(literacy.mean.is_nan());

        let cases = summaries.iter().find(|s| s.column == "Cases").unwrap();
        assert_eq!(cases.mean, 150.0);
    }

    #[test]
    fn test_describe_empty_dataset() {
        assert!(CrimeDataset::from_records(Vec::new()).describe().is_empty());
    }
}
