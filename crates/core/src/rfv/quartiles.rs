use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::customer::CustomerMetrics;

/// Percentile over an ascending slice, interpolating linearly at rank `(n - 1) * p`.
///
/// Returns `None` for an empty slice, a `p` outside `0..=1`, or an
/// interpolation that leaves the `Decimal` range.
pub fn percentile(sorted: &[Decimal], p: Decimal) -> Option<Decimal> {
    if sorted.is_empty() || p < Decimal::ZERO || p > Decimal::ONE {
        return None;
    }

    let rank = Decimal::from(sorted.len() - 1) * p;
    let lower_rank = rank.floor();
    let fraction = rank - lower_rank;
    let lower = lower_rank.to_usize()?;
    let lower_value = *sorted.get(lower)?;

    match sorted.get(lower + 1) {
        Some(upper_value) if !fraction.is_zero() => upper_value
            .checked_sub(lower_value)
            .and_then(|span| span.checked_mul(fraction))
            .and_then(|offset| lower_value.checked_add(offset)),
        _ => Some(lower_value),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quartiles {
    pub q25: Decimal,
    pub q50: Decimal,
    pub q75: Decimal,
}

impl Quartiles {
    pub fn from_values(values: impl IntoIterator<Item = Decimal>) -> Option<Self> {
        let mut sorted: Vec<Decimal> = values.into_iter().collect();
        sorted.sort();

        Some(Self {
            q25: percentile(&sorted, Decimal::new(25, 2))?.normalize(),
            q50: percentile(&sorted, Decimal::new(50, 2))?.normalize(),
            q75: percentile(&sorted, Decimal::new(75, 2))?.normalize(),
        })
    }
}

/// Quartile triples for the three metrics, computed once over the whole population.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    pub recency: Quartiles,
    pub frequency: Quartiles,
    pub value: Quartiles,
}

impl Thresholds {
    pub fn from_metrics(metrics: &[CustomerMetrics]) -> Option<Self> {
        Some(Self {
            recency: Quartiles::from_values(metrics.iter().map(|m| Decimal::from(m.recency_days)))?,
            frequency: Quartiles::from_values(metrics.iter().map(|m| Decimal::from(m.frequency)))?,
            value: Quartiles::from_values(metrics.iter().map(|m| m.value))?,
        })
    }
}
