use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::transaction::CustomerId;

/// Quartile letter grade. `A` is the best bucket, `D` the worst.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
}

impl Grade {
    pub fn as_char(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
            Self::D => 'D',
        }
    }

    pub fn from_char(value: char) -> Option<Self> {
        match value {
            'A' => Some(Self::A),
            'B' => Some(Self::B),
            'C' => Some(Self::C),
            'D' => Some(Self::D),
            _ => None,
        }
    }

    /// Strict "better than": `A` beats `B`, and so on.
    pub fn is_better_than(self, other: Self) -> bool {
        self < other
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("invalid RFV score `{0}` (expected three letters from A-D, e.g. `AAB`)")]
pub struct InvalidScore(pub String);

/// Composite key built from the recency, frequency and value grades, in that order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct RfvScore([Grade; 3]);

impl RfvScore {
    pub fn new(recency: Grade, frequency: Grade, value: Grade) -> Self {
        Self([recency, frequency, value])
    }

    pub fn recency(&self) -> Grade {
        self.0[0]
    }

    pub fn frequency(&self) -> Grade {
        self.0[1]
    }

    pub fn value(&self) -> Grade {
        self.0[2]
    }
}

impl fmt::Display for RfvScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for grade in self.0 {
            write!(f, "{grade}")?;
        }
        Ok(())
    }
}

impl FromStr for RfvScore {
    type Err = InvalidScore;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_uppercase();
        let grades: Vec<Grade> = normalized.chars().filter_map(Grade::from_char).collect();
        match grades.as_slice() {
            [recency, frequency, value] if normalized.chars().count() == 3 => {
                Ok(Self::new(*recency, *frequency, *value))
            }
            _ => Err(InvalidScore(value.to_string())),
        }
    }
}

impl From<RfvScore> for String {
    fn from(score: RfvScore) -> Self {
        score.to_string()
    }
}

impl TryFrom<String> for RfvScore {
    type Error = InvalidScore;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grades {
    pub recency: Grade,
    pub frequency: Grade,
    pub value: Grade,
}

impl Grades {
    pub fn score(&self) -> RfvScore {
        RfvScore::new(self.recency, self.frequency, self.value)
    }
}

/// Per-customer aggregate derived from the transaction table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerMetrics {
    pub customer_id: CustomerId,
    pub last_purchase: NaiveDate,
    pub recency_days: i64,
    pub frequency: u64,
    pub value: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredCustomer {
    #[serde(flatten)]
    pub metrics: CustomerMetrics,
    pub grades: Option<Grades>,
    pub rfv_score: Option<RfvScore>,
    pub action: Option<String>,
}

impl ScoredCustomer {
    pub fn customer_id(&self) -> &CustomerId {
        &self.metrics.customer_id
    }
}
