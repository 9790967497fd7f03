use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::customer::{CustomerMetrics, Grade, Grades};
use crate::rfv::quartiles::{Quartiles, Thresholds};

/// Which end of a metric's distribution earns the `A` grade.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    LowerIsBetter,
    HigherIsBetter,
}

/// Buckets `value` against the quartiles. Boundaries are inclusive (`<=`), so a
/// value sitting exactly on a threshold lands in the lower-rank bucket.
pub fn grade(value: Decimal, quartiles: &Quartiles, direction: Direction) -> Grade {
    let bucket = if value <= quartiles.q25 {
        0
    } else if value <= quartiles.q50 {
        1
    } else if value <= quartiles.q75 {
        2
    } else {
        3
    };

    let ladder = match direction {
        Direction::LowerIsBetter => [Grade::A, Grade::B, Grade::C, Grade::D],
        Direction::HigherIsBetter => [Grade::D, Grade::C, Grade::B, Grade::A],
    };
    ladder[bucket]
}

pub fn grade_customer(metrics: &CustomerMetrics, thresholds: &Thresholds) -> Grades {
    Grades {
        recency: grade(
            Decimal::from(metrics.recency_days),
            &thresholds.recency,
            Direction::LowerIsBetter,
        ),
        frequency: grade(
            Decimal::from(metrics.frequency),
            &thresholds.frequency,
            Direction::HigherIsBetter,
        ),
        value: grade(metrics.value, &thresholds.value, Direction::HigherIsBetter),
    }
}
