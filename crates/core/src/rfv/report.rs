use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::domain::customer::ScoredCustomer;
use crate::rfv::quartiles::Thresholds;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Scored,
    /// The input held no transactions, so no thresholds exist and nothing was graded.
    NoData,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RfvReport {
    pub reference_date: NaiveDate,
    pub status: ReportStatus,
    pub transaction_count: usize,
    pub thresholds: Option<Thresholds>,
    pub customers: Vec<ScoredCustomer>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    CustomerId,
    Recency,
    Frequency,
    Value,
    Score,
}

impl SortKey {
    pub fn column_name(self) -> &'static str {
        match self {
            Self::CustomerId => "ID_cliente",
            Self::Recency => "Recencia",
            Self::Frequency => "Frequencia",
            Self::Value => "Valor",
            Self::Score => "RFV_Score",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "customer" | "customer_id" | "id_cliente" => Ok(Self::CustomerId),
            "recency" | "recencia" => Ok(Self::Recency),
            "frequency" | "frequencia" => Ok(Self::Frequency),
            "value" | "valor" => Ok(Self::Value),
            "score" | "rfv_score" => Ok(Self::Score),
            other => Err(format!(
                "unsupported sort key `{other}` (expected customer_id|recency|frequency|value|score)"
            )),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl RfvReport {
    pub fn len(&self) -> usize {
        self.customers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }

    /// Rows ordered by `key`; ties fall back to ascending customer id so the
    /// ordering is total.
    pub fn sorted_by(&self, key: SortKey, order: SortOrder) -> Vec<&ScoredCustomer> {
        let mut rows: Vec<&ScoredCustomer> = self.customers.iter().collect();
        rows.sort_by(|left, right| {
            let primary = match order {
                SortOrder::Ascending => compare(left, right, key),
                SortOrder::Descending => compare(right, left, key),
            };
            primary.then_with(|| left.customer_id().cmp(right.customer_id()))
        });
        rows
    }

    pub fn top(&self, n: usize, key: SortKey, order: SortOrder) -> Vec<&ScoredCustomer> {
        let mut rows = self.sorted_by(key, order);
        rows.truncate(n);
        rows
    }
}

fn compare(left: &ScoredCustomer, right: &ScoredCustomer, key: SortKey) -> Ordering {
    match key {
        SortKey::CustomerId => left.customer_id().cmp(right.customer_id()),
        SortKey::Recency => left.metrics.recency_days.cmp(&right.metrics.recency_days),
        SortKey::Frequency => left.metrics.frequency.cmp(&right.metrics.frequency),
        SortKey::Value => left.metrics.value.cmp(&right.metrics.value),
        SortKey::Score => left.rfv_score.cmp(&right.rfv_score),
    }
}

/// Display formatting for monetary values: `R$ 1,234.56`.
pub fn format_currency(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let rendered = format!("{:.2}", rounded.abs());
    let (integer, fraction) = rendered.split_once('.').unwrap_or((rendered.as_str(), "00"));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (index, digit) in integer.chars().enumerate() {
        if index > 0 && (integer.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    format!("R$ {sign}{grouped}.{fraction}")
}
