use super::ScoreError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A scoring factor derived from one or more indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    Population,
    Competitors,
    Aging,
    IncomeLevel,
    Fertility,
    Accessibility,
    Youth,
    Education,
    Transport,
    RoadDensity,
}

impl Factor {
    pub const ALL: [Factor; 10] = [
        Factor::Population,
        Factor::Competitors,
        Factor::Aging,
        Factor::IncomeLevel,
        Factor::Fertility,
        Factor::Accessibility,
        Factor::Youth,
        Factor::Education,
        Factor::Transport,
        Factor::RoadDensity,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Factor::Population => "population",
            Factor::Competitors => "competitors",
            Factor::Aging => "aging",
            Factor::IncomeLevel => "income_level",
            Factor::Fertility => "fertility",
            Factor::Accessibility => "accessibility",
            Factor::Youth => "youth",
            Factor::Education => "education",
            Factor::Transport => "transport",
            Factor::RoadDensity => "road_density",
        }
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Named factor weights in [0,1]. They need not sum to 1; the scorer
/// renormalizes over the factors a row actually carries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightScheme {
    name: String,
    weights: BTreeMap<Factor, f64>,
}

impl WeightScheme {
    pub fn new(
        name: impl Into<String>,
        weights: impl IntoIterator<Item = (Factor, f64)>,
    ) -> Result<Self, ScoreError> {
        let weights = weights
            .into_iter()
            .map(|(factor, weight)| {
                if weight.is_finite() && (0.0..=1.0).contains(&weight) {
                    Ok((factor, weight))
                } else {
                    Err(ScoreError::InvalidWeight { factor, weight })
                }
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        Ok(Self {
            name: name.into(),
            weights,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn weight(&self, factor: Factor) -> Option<f64> {
        self.weights.get(&factor).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Factor, f64)> + '_ {
        self.weights.iter().map(|(factor, weight)| (*factor, *weight))
    }
}

impl Default for WeightScheme {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            weights: BTreeMap::from([
                (Factor::Population, 0.20),
                (Factor::Competitors, 0.10),
                (Factor::Aging, 0.05),
                (Factor::IncomeLevel, 0.10),
                (Factor::Fertility, 0.05),
                (Factor::Accessibility, 0.15),
                (Factor::Youth, 0.05),
                (Factor::Education, 0.10),
                (Factor::Transport, 0.10),
                (Factor::RoadDensity, 0.10),
            ]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scheme_covers_every_factor() {
        let scheme = WeightScheme::default();
        assert_eq!(scheme.name(), "default");
        for factor in Factor::ALL {
            assert!(scheme.weight(factor).is_some(), "{factor} missing");
        }
        let total: f64 = scheme.iter().map(|(_, weight)| weight).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_out_of_range_weights() {
        let error = WeightScheme::new("bad", [(Factor::Youth, 1.5)]).expect_err("weight > 1");
        assert_eq!(
            error,
            ScoreError::InvalidWeight {
                factor: Factor::Youth,
                weight: 1.5
            }
        );
        assert!(WeightScheme::new("nan", [(Factor::Aging, f64::NAN)]).is_err());
        assert!(WeightScheme::new("ok", [(Factor::Aging, 0.0)]).is_ok());
    }

    #[test]
    fn factor_keys_serialize_snake_case() {
        let json = serde_json::to_string(&Factor::RoadDensity).expect("serializes");
        assert_eq!(json, "\"road_density\"");
        assert_eq!(Factor::IncomeLevel.to_string(), "income_level");
    }
}
