//! Socio-economic indicator and chart metric enumerations

use std::fmt;
use std::str::FromStr;

/// The fourteen socio-economic indicators attached to every dataset row and
/// every prediction request.
///
/// Variant order is the training-time numeric feature order; the feature
/// space artifact is validated against it at load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Indicator {
    UnemploymentRate,
    PovertyRate,
    PerCapitaIncome,
    InflationRate,
    PopulationDensity,
    GenderRatio,
    LiteracyRate,
    YouthPopulationPercent,
    UrbanizationRate,
    HumanDevelopmentIndex,
    PoliceStationsPerDistrict,
    ConvictionRate,
    PolicePersonnelPer100k,
    AlcoholConsumptionPerCapita,
}

impl Indicator {
    /// All indicators in feature order.
    pub const ALL: [Indicator; 14] = [
        Indicator::UnemploymentRate,
        Indicator::PovertyRate,
        Indicator::PerCapitaIncome,
        Indicator::InflationRate,
        Indicator::PopulationDensity,
        Indicator::GenderRatio,
        Indicator::LiteracyRate,
        Indicator::YouthPopulationPercent,
        Indicator::UrbanizationRate,
        Indicator::HumanDevelopmentIndex,
        Indicator::PoliceStationsPerDistrict,
        Indicator::ConvictionRate,
        Indicator::PolicePersonnelPer100k,
        Indicator::AlcoholConsumptionPerCapita,
    ];

    /// Column name in the dataset and in serialized requests.
    pub fn name(&self) -> &'static str {
        match self {
            Indicator::UnemploymentRate => "unemployment_rate",
            Indicator::PovertyRate => "poverty_rate",
            Indicator::PerCapitaIncome => "per_capita_income",
            Indicator::InflationRate => "inflation_rate",
            Indicator::PopulationDensity => "population_density",
            Indicator::GenderRatio => "gender_ratio",
            Indicator::LiteracyRate => "literacy_rate",
            Indicator::YouthPopulationPercent => "youth_population_percent",
            Indicator::UrbanizationRate => "urbanization_rate",
            Indicator::HumanDevelopmentIndex => "human_development_index",
            Indicator::PoliceStationsPerDistrict => "police_stations_per_district",
            Indicator::ConvictionRate => "conviction_rate",
            Indicator::PolicePersonnelPer100k => "police_personnel_per_100k",
            Indicator::AlcoholConsumptionPerCapita => "alcohol_consumption_per_capita",
        }
    }

    /// Look an indicator up by its column name.
    pub fn from_name(name: &str) -> Option<Indicator> {
        Indicator::ALL.iter().copied().find(|i| i.name() == name)
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A metric the dashboard's yearly trend chart can plot: the case count or
/// any single indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Cases,
    Indicator(Indicator),
}

impl Metric {
    /// All selectable metrics, cases first.
    pub fn all() -> Vec<Metric> {
        let mut metrics = vec![Metric::Cases];
        metrics.extend(Indicator::ALL.iter().copied().map(Metric::Indicator));
        metrics
    }

    pub fn name(&self) -> &'static str {
        match self {
            Metric::Cases => "Cases",
            Metric::Indicator(ind) => ind.name(),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "Cases" {
            return Ok(Metric::Cases);
        }
        Indicator::from_name(s)
            .map(Metric::Indicator)
            .ok_or_else(|| format!("unknown metric '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indicator_names_round_trip() {
        for ind in Indicator::ALL {
            assert_eq!(Indicator::from_name(ind.name()), Some(ind));
        }
        assert_eq!(Indicator::from_name("no_such_column"), None);
    }

    #[test]
    fn test_indicator_count() {
        assert_eq!(Indicator::ALL.len(), 14);
    }

    #[test]
    fn test_metric_parsing() {
        assert_eq!("Cases".parse::<Metric>(), Ok(Metric::Cases));
        assert_eq!(
            "literacy_rate".parse::<Metric>(),
            Ok(Metric::Indicator(Indicator::LiteracyRate))
        );
        assert!("velocity".parse::<Metric>().is_err());
    }

    #[test]
    fn test_metric_list_has_cases_first() {
        let all = Metric::all();
        assert_eq!(all.len(), 15);
        assert_eq!(all[0], Metric::Cases);
    }
}
