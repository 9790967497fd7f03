use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::domain::customer::CustomerMetrics;
use crate::domain::transaction::{CustomerId, Transaction};
use crate::errors::ValidationError;

struct Accumulator {
    last_purchase: NaiveDate,
    frequency: u64,
    value: Decimal,
}

/// Groups transactions per customer. Output is ordered by customer id.
///
/// Value sums are exact; a sum beyond the `Decimal` range is an error rather
/// than a rounded or wrapped total.
pub fn aggregate(
    transactions: &[Transaction],
    reference_date: NaiveDate,
) -> Result<Vec<CustomerMetrics>, ValidationError> {
    let mut groups: BTreeMap<&CustomerId, Accumulator> = BTreeMap::new();

    for transaction in transactions {
        let Some(acc) = groups.get_mut(&transaction.customer_id) else {
            groups.insert(
                &transaction.customer_id,
                Accumulator {
                    last_purchase: transaction.purchased_on,
                    frequency: 1,
                    value: transaction.amount,
                },
            );
            continue;
        };

        acc.last_purchase = acc.last_purchase.max(transaction.purchased_on);
        acc.frequency += 1;
        acc.value = acc.value.checked_add(transaction.amount).ok_or_else(|| {
            ValidationError::ArithmeticOverflow {
                context: format!("summing ValorTotal for customer `{}`", transaction.customer_id),
            }
        })?;
    }

    Ok(groups
        .into_iter()
        .map(|(customer_id, acc)| CustomerMetrics {
            customer_id: customer_id.clone(),
            last_purchase: acc.last_purchase,
            recency_days: (reference_date - acc.last_purchase).num_days(),
            frequency: acc.frequency,
            value: acc.value,
        })
        .collect())
}
