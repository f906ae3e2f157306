use super::Factor;
use crate::layers::{Indicator, IndicatorRow};

/// The indicator a factor reads from.
pub fn source_indicator(factor: Factor) -> Indicator {
    match factor {
        Factor::Population => Indicator::DensityNorm,
        Factor::Competitors => Indicator::CompetitorAtms,
        Factor::Aging => Indicator::AgingRate,
        Factor::IncomeLevel => Indicator::IncomeLevel,
        Factor::Fertility => Indicator::Fertility,
        Factor::Accessibility => Indicator::Accessibility,
        Factor::Youth => Indicator::YouthRate,
        Factor::Education => Indicator::Education,
        Factor::Transport => Indicator::Transport,
        Factor::RoadDensity => Indicator::RoadDensity,
    }
}

/// A factor's [0,1] value for `row`, or `None` when the row lacks its
/// source indicator.
pub fn factor_value(row: &IndicatorRow, factor: Factor) -> Option<f64> {
    let indicator = source_indicator(factor);
    match factor {
        Factor::Competitors => row
            .raw(indicator)
            .map(|count| 1.0 / (1.0 + count.max(0.0))),
        Factor::Aging => row.normalized().get(indicator).map(|rate| 1.0 - rate),
        _ => row.normalized().get(indicator),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::GeoPoint;
    use std::collections::BTreeMap;

    fn row(values: &[(Indicator, f64)]) -> IndicatorRow {
        IndicatorRow::new(
            None,
            "test",
            None,
            GeoPoint::new(33.6, -7.8),
            values.iter().copied().collect::<BTreeMap<_, _>>(),
        )
    }

    #[test]
    fn competitor_factor_decreases_with_count() {
        let none = row(&[(Indicator::CompetitorAtms, 0.0)]);
        let few = row(&[(Indicator::CompetitorAtms, 2.0)]);
        let many = row(&[(Indicator::CompetitorAtms, 40.0)]);
        let negative = row(&[(Indicator::CompetitorAtms, -4.0)]);

        assert_eq!(factor_value(&none, Factor::Competitors), Some(1.0));
        let few_value = factor_value(&few, Factor::Competitors).unwrap_or_default();
        assert!((few_value - 1.0 / 3.0).abs() < 1e-12);
        assert!(factor_value(&many, Factor::Competitors).unwrap_or_default() < 0.03);
        assert_eq!(factor_value(&negative, Factor::Competitors), Some(1.0));
    }

    #[test]
    fn aging_is_inverted_after_rescaling() {
        let aged = row(&[(Indicator::AgingRate, 30.0)]);
        assert!((factor_value(&aged, Factor::Aging).unwrap_or_default() - 0.7).abs() < 1e-12);
    }

    #[test]
    fn absent_indicator_is_absent_factor_but_zero_is_kept() {
        let sparse = row(&[(Indicator::Education, 0.0)]);
        assert_eq!(factor_value(&sparse, Factor::Education), Some(0.0));
        assert_eq!(factor_value(&sparse, Factor::Transport), None);
        assert_eq!(factor_value(&sparse, Factor::Competitors), None);
    }
}
