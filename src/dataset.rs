//! The merged crime/socio-economic dataset and the aggregation queries the
//! dashboard charts are built from.
//!
//! Every query is a pure read over the loaded records; the dataset is loaded
//! once at startup and never mutated.

use crate::error::{PipelineError, PipelineResult};
use crate::types::indicators::{Indicator, Metric};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use tracing::info;

/// One row of the merged dataset: a (state, crime category, year) tuple with
/// its case count and socio-economic context.
#[derive(Debug, Clone, Deserialize)]
pub struct CrimeRecord {
    #[serde(rename = "State")]
    pub state: String,

    #[serde(rename = "Crime_Type")]
    pub crime_type: String,

    #[serde(rename = "Year")]
    pub year: i32,

    #[serde(rename = "Cases")]
    pub cases: u64,

    pub unemployment_rate: f64,
    pub poverty_rate: f64,
    pub per_capita_income: f64,
    pub inflation_rate: f64,
    pub population_density: f64,
    pub gender_ratio: f64,
    pub literacy_rate: f64,
    pub youth_population_percent: f64,
    pub urbanization_rate: f64,
    pub human_development_index: f64,
    pub police_stations_per_district: f64,
    pub conviction_rate: f64,
    pub police_personnel_per_100k: f64,
    pub alcohol_consumption_per_capita: f64,
}

impl CrimeRecord {
    /// Create a record with zeroed indicators, for tests and tooling.
    pub fn new(state: &str, crime_type: &str, year: i32, cases: u64) -> Self {
        Self {
            state: state.to_string(),
            crime_type: crime_type.to_string(),
            year,
            cases,
            unemployment_rate: 0.0,
            poverty_rate: 0.0,
            per_capita_income: 0.0,
            inflation_rate: 0.0,
            population_density: 0.0,
            gender_ratio: 0.0,
            literacy_rate: 0.0,
            youth_population_percent: 0.0,
            urbanization_rate: 0.0,
            human_development_index: 0.0,
            police_stations_per_district: 0.0,
            conviction_rate: 0.0,
            police_personnel_per_100k: 0.0,
            alcohol_consumption_per_capita: 0.0,
        }
    }

    /// Value of a single indicator column.
    pub fn indicator(&self, indicator: Indicator) -> f64 {
        match indicator {
            Indicator::UnemploymentRate => self.unemployment_rate,
            Indicator::PovertyRate => self.poverty_rate,
            Indicator::PerCapitaIncome => self.per_capita_income,
            Indicator::InflationRate => self.inflation_rate,
            Indicator::PopulationDensity => self.population_density,
            Indicator::GenderRatio => self.gender_ratio,
            Indicator::LiteracyRate => self.literacy_rate,
            Indicator::YouthPopulationPercent => self.youth_population_percent,
            Indicator::UrbanizationRate => self.urbanization_rate,
            Indicator::HumanDevelopmentIndex => self.human_development_index,
            Indicator::PoliceStationsPerDistrict => self.police_stations_per_district,
            Indicator::ConvictionRate => self.conviction_rate,
            Indicator::PolicePersonnelPer100k => self.police_personnel_per_100k,
            Indicator::AlcoholConsumptionPerCapita => self.alcohol_consumption_per_capita,
        }
    }
}

/// Headline counts shown on the dashboard home view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuickInsights {
    pub total_records: usize,
    pub total_states: usize,
    pub crime_categories: usize,
}

/// Total cases for one state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateCases {
    pub state: String,
    pub cases: u64,
}

/// Total cases for one crime category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCases {
    pub crime_type: String,
    pub cases: u64,
}

/// One point of a yearly trend series.
#[derive(Debug, Clone, PartialEq)]
pub struct YearlyPoint {
    pub year: i32,
    pub value: f64,
}

/// Box-plot statistics of case counts for one state.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseSpread {
    pub state: String,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// One state's aggregate for the hotspot choropleth: case total plus the
/// context indicators shown on hover.
#[derive(Debug, Clone, PartialEq)]
pub struct HotspotRow {
    pub state: String,
    pub cases: u64,
    pub literacy_rate: f64,
    pub human_development_index: f64,
    pub urbanization_rate: f64,
}

/// The loaded dataset.
pub struct CrimeDataset {
    records: Vec<CrimeRecord>,
}

impl CrimeDataset {
    /// Load the dataset from a CSV file with the merged-dataset header row.
    pub fn from_path<P: AsRef<Path>>(path: P) -> PipelineResult<Self> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path).map_err(|e| PipelineError::Dataset {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut records = Vec::new();
        for (index, row) in reader.deserialize().enumerate() {
            let record: CrimeRecord = row.map_err(|e| PipelineError::Dataset {
                path: path.to_path_buf(),
                reason: format!("row {}: {}", index + 1, e),
            })?;

            // `NaN`/`inf` parse as valid f64 literals; reject them here so
            // every query downstream can assume finite columns.
            if let Some(indicator) = Indicator::ALL
                .iter()
                .copied()
                .find(|i| !record.indicator(*i).is_finite())
            {
                return Err(PipelineError::Dataset {
                    path: path.to_path_buf(),
                    reason: format!(
                        "row {}: {} is not a finite number",
                        index + 1,
                        indicator
                    ),
                });
            }

            records.push(record);
        }

        info!(path = %path.display(), records = records.len(), "Dataset loaded");
        Ok(Self { records })
    }

    /// Wrap records already held in memory.
    pub fn from_records(records: Vec<CrimeRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[CrimeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Headline counts: records, distinct states, distinct categories.
    pub fn quick_insights(&self) -> QuickInsights {
        QuickInsights {
            total_records: self.records.len(),
            total_states: self.states().len(),
            crime_categories: self.crime_types().len(),
        }
    }

    /// States by total cases, descending, first `n`.
    pub fn top_states(&self, n: usize) -> Vec<StateCases> {
        let mut totals: BTreeMap<&str, u64> = BTreeMap::new();
        for record in &self.records {
            *totals.entry(record.state.as_str()).or_insert(0) += record.cases;
        }

        let mut ranked: Vec<StateCases> = totals
            .into_iter()
            .map(|(state, cases)| StateCases {
                state: state.to_string(),
                cases,
            })
            .collect();
        // BTreeMap iteration gives ties a stable alphabetical order.
        ranked.sort_by(|a, b| b.cases.cmp(&a.cases));
        ranked.truncate(n);
        ranked
    }

    /// Per-category case totals, descending.
    pub fn cases_by_crime_type(&self) -> Vec<CategoryCases> {
        let mut totals: BTreeMap<&str, u64> = BTreeMap::new();
        for record in &self.records {
            *totals.entry(record.crime_type.as_str()).or_insert(0) += record.cases;
        }

        let mut ranked: Vec<CategoryCases> = totals
            .into_iter()
            .map(|(crime_type, cases)| CategoryCases {
                crime_type: crime_type.to_string(),
                cases,
            })
            .collect();
        ranked.sort_by(|a, b| b.cases.cmp(&a.cases));
        ranked
    }

    /// Per-year sums of the selected metric, ascending year order.
    ///
    /// Sums are the reference trend-chart behavior for every metric, rate
    /// columns included.
    pub fn yearly_totals(&self, metric: Metric) -> Vec<YearlyPoint> {
        let mut totals: BTreeMap<i32, f64> = BTreeMap::new();
        for record in &self.records {
            let value = match metric {
                Metric::Cases => record.cases as f64,
                Metric::Indicator(indicator) => record.indicator(indicator),
            };
            *totals.entry(record.year).or_insert(0.0) += value;
        }

        totals
            .into_iter()
            .map(|(year, value)| YearlyPoint { year, value })
            .collect()
    }

    /// Per-state box-plot statistics of case counts, alphabetical by state.
    pub fn state_case_spread(&self) -> Vec<CaseSpread> {
        let mut by_state: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        for record in &self.records {
            by_state
                .entry(record.state.as_str())
                .or_default()
                .push(record.cases as f64);
        }

        by_state
            .into_iter()
            .map(|(state, mut cases)| {
                cases.sort_by(f64::total_cmp);
                CaseSpread {
                    state: state.to_string(),
                    min: cases[0],
                    q1: crate::summary::quantile(&cases, 0.25),
                    median: crate::summary::quantile(&cases, 0.5),
                    q3: crate::summary::quantile(&cases, 0.75),
                    max: cases[cases.len() - 1],
                }
            })
            .collect()
    }

    /// Per-state aggregates for the hotspot map of one (year, category)
    /// selection: case sums with mean literacy rate, HDI and urbanization.
    ///
    /// The map source has no polygon data keyed to `Jammu & Kashmir` alone,
    /// so when the selection has no `Ladakh` row one is cloned from the
    /// `Jammu & Kashmir` aggregate, exactly as the reference map does.
    pub fn hotspot_rows(&self, year: i32, crime_type: &str) -> Vec<HotspotRow> {
        struct Accumulator {
            cases: u64,
            literacy: f64,
            hdi: f64,
            urbanization: f64,
            rows: u64,
        }

        let mut by_state: BTreeMap<&str, Accumulator> = BTreeMap::new();
        for record in &self.records {
            if record.year != year || record.crime_type != crime_type {
                continue;
            }
            let acc = by_state.entry(record.state.as_str()).or_insert(Accumulator {
                cases: 0,
                literacy: 0.0,
                hdi: 0.0,
                urbanization: 0.0,
                rows: 0,
            });
            acc.cases += record.cases;
            acc.literacy += record.literacy_rate;
            acc.hdi += record.human_development_index;
            acc.urbanization += record.urbanization_rate;
            acc.rows += 1;
        }

        let mut rows: Vec<HotspotRow> = by_state
            .into_iter()
            .map(|(state, acc)| HotspotRow {
                state: state.to_string(),
                cases: acc.cases,
                literacy_rate: acc.literacy / acc.rows as f64,
                human_development_index: acc.hdi / acc.rows as f64,
                urbanization_rate: acc.urbanization / acc.rows as f64,
            })
            .collect();

        let has_ladakh = rows.iter().any(|r| r.state == "Ladakh");
        if !has_ladakh {
            if let Some(jk) = rows.iter().find(|r| r.state == "Jammu & Kashmir") {
                let mut ladakh = jk.clone();
                ladakh.state = "Ladakh".to_string();
                rows.push(ladakh);
            }
        }

        rows
    }

    /// Mean of each indicator over the whole dataset, used as the request
    /// form defaults.
    pub fn indicator_means(&self) -> HashMap<Indicator, f64> {
        let mut means = HashMap::new();
        if self.records.is_empty() {
            return means;
        }

        for indicator in Indicator::ALL {
            let sum: f64 = self.records.iter().map(|r| r.indicator(indicator)).sum();
            means.insert(indicator, sum / self.records.len() as f64);
        }
        means
    }

    /// Distinct state names, sorted.
    pub fn states(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self.records.iter().map(|r| r.state.as_str()).collect();
        set.into_iter().map(str::to_string).collect()
    }

    /// Distinct crime categories, sorted.
    pub fn crime_types(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self.records.iter().map(|r| r.crime_type.as_str()).collect();
        set.into_iter().map(str::to_string).collect()
    }

    /// Distinct years, ascending.
    pub fn years(&self) -> Vec<i32> {
        let set: BTreeSet<i32> = self.records.iter().map(|r| r.year).collect();
        set.into_iter().collect()
    }
}
