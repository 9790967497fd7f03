//! Recency-Frequency-Value segmentation.
//!
//! Transactions are grouped per customer, each metric is graded against the
//! population quartiles, and the three grades form a composite score that is
//! looked up in an [`ActionTable`].

mod actions;
mod aggregate;
mod grading;
mod quartiles;
mod report;

pub use actions::ActionTable;
pub use aggregate::aggregate;
pub use grading::{grade, grade_customer, Direction};
pub use quartiles::{percentile, Quartiles, Thresholds};
pub use report::{format_currency, ReportStatus, RfvReport, SortKey, SortOrder};

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::domain::customer::ScoredCustomer;
use crate::domain::transaction::Transaction;
use crate::errors::ValidationError;

#[derive(Clone, Debug)]
pub struct RfvScorer {
    reference_date: NaiveDate,
    actions: ActionTable,
}

impl RfvScorer {
    /// Scorer anchored at `reference_date` with the default action table.
    pub fn new(reference_date: NaiveDate) -> Self {
        Self { reference_date, actions: ActionTable::default() }
    }

    pub fn with_actions(mut self, actions: ActionTable) -> Self {
        self.actions = actions;
        self
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    pub fn actions(&self) -> &ActionTable {
        &self.actions
    }

    /// Scores every customer in `transactions`. An empty slice is not an
    /// error and yields a [`ReportStatus::NoData`] report.
    pub fn score(&self, transactions: &[Transaction]) -> Result<RfvReport, ValidationError> {
        let metrics = aggregate(transactions, self.reference_date)?;
        debug!(
            event_name = "rfv.score.aggregated",
            transactions = transactions.len(),
            customers = metrics.len(),
            "transactions grouped per customer"
        );

        let future_purchases = metrics.iter().filter(|m| m.recency_days < 0).count();
        if future_purchases > 0 {
            warn!(
                event_name = "rfv.score.future_purchases",
                customers = future_purchases,
                reference_date = %self.reference_date,
                "customers have purchases after the reference date; recency is negative"
            );
        }

        if metrics.is_empty() {
            warn!(
                event_name = "rfv.score.no_data",
                reference_date = %self.reference_date,
                "no transactions to score; thresholds unavailable"
            );
            return Ok(RfvReport {
                reference_date: self.reference_date,
                status: ReportStatus::NoData,
                transaction_count: transactions.len(),
                thresholds: None,
                customers: Vec::new(),
            });
        }

        let thresholds = Thresholds::from_metrics(&metrics).ok_or_else(|| {
            ValidationError::ArithmeticOverflow { context: "computing quartile thresholds".to_string() }
        })?;

        let customers: Vec<ScoredCustomer> = metrics
            .into_iter()
            .map(|metrics| {
                let grades = grade_customer(&metrics, &thresholds);
                let score = grades.score();
                let action = self.actions.lookup(&score).map(str::to_owned);
                ScoredCustomer { metrics, grades: Some(grades), rfv_score: Some(score), action }
            })
            .collect();

        info!(
            event_name = "rfv.score.completed",
            customers = customers.len(),
            with_action = customers.iter().filter(|c| c.action.is_some()).count(),
            reference_date = %self.reference_date,
            "rfv scoring completed"
        );

        Ok(RfvReport {
            reference_date: self.reference_date,
            status: ReportStatus::Scored,
            transaction_count: transactions.len(),
            thresholds: Some(thresholds),
            customers,
        })
    }
}
