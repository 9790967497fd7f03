use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use rfv_core::{
    load_transactions, write_csv, CustomerId, Grade, ReaderOptions, ReportStatus, RfvReport,
    RfvScorer, Transaction, ValidationError,
};
use rust_decimal::Decimal;

fn reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 12, 9).expect("valid date")
}

/// Deterministic mixed population: 12 customers, uneven purchase counts,
/// cent-level amounts.
fn fixture() -> Vec<Transaction> {
    let mut transactions = Vec::new();
    for customer in 0..12u32 {
        for purchase in 0..=(customer % 4) {
            let cents = i64::from(customer * 1_337 + purchase * 251 + 7);
            let days_ago = i64::from((customer * 17 + purchase * 5) % 90);
            transactions.push(Transaction::new(
                format!("cliente-{customer:02}"),
                format!("compra-{customer}-{purchase}"),
                Decimal::new(cents, 2),
                reference_date() - Duration::days(days_ago),
            ));
        }
    }
    transactions
}

fn score(transactions: &[Transaction]) -> RfvReport {
    RfvScorer::new(reference_date()).score(transactions).expect("fixture scores")
}

#[test]
fn every_customer_appears_exactly_once() {
    let transactions = fixture();
    let report = score(&transactions);

    let mut seen: BTreeMap<&CustomerId, usize> = BTreeMap::new();
    for row in &report.customers {
        *seen.entry(row.customer_id()).or_default() += 1;
    }

    assert_eq!(seen.len(), 12);
    assert!(seen.values().all(|count| *count == 1));
    for transaction in &transactions {
        assert!(seen.contains_key(&transaction.customer_id));
    }
}

#[test]
fn frequency_value_and_recency_match_the_raw_rows() {
    let transactions = fixture();
    let report = score(&transactions);

    for row in &report.customers {
        let own: Vec<&Transaction> =
            transactions.iter().filter(|t| &t.customer_id == row.customer_id()).collect();
        let expected_value: Decimal = own.iter().map(|t| t.amount).sum();
        let last = own.iter().map(|t| t.purchased_on).max().expect("at least one purchase");

        assert_eq!(row.metrics.frequency, own.len() as u64);
        assert_eq!(row.metrics.value, expected_value);
        assert_eq!(row.metrics.recency_days, (reference_date() - last).num_days());
        assert!(row.metrics.recency_days >= 0);
    }
}

#[test]
fn reordering_rows_does_not_change_the_report() {
    let transactions = fixture();
    let mut reordered = transactions.clone();
    reordered.reverse();
    reordered.rotate_left(5);

    assert_eq!(score(&transactions), score(&reordered));
}

#[test]
fn scoring_twice_exports_identical_bytes() {
    let transactions = fixture();

    let mut first = Vec::new();
    let mut second = Vec::new();
    write_csv(&score(&transactions), &mut first).expect("first export");
    write_csv(&score(&transactions), &mut second).expect("second export");

    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn value_quartile_example_grades_d_c_b_a() {
    let transactions: Vec<Transaction> = [("w", 10), ("x", 20), ("y", 30), ("z", 100)]
        .into_iter()
        .map(|(id, value)| Transaction::new(id, "p", Decimal::from(value), reference_date()))
        .collect();

    let report = score(&transactions);
    let thresholds = report.thresholds.expect("thresholds for non-empty input");

    assert_eq!(thresholds.value.q25, Decimal::new(175, 1));
    assert_eq!(thresholds.value.q50, Decimal::from(25));
    assert_eq!(thresholds.value.q75, Decimal::new(475, 1));

    let grades: Vec<Grade> = report
        .customers
        .iter()
        .map(|row| row.grades.expect("graded").value)
        .collect();
    assert_eq!(grades, vec![Grade::D, Grade::C, Grade::B, Grade::A]);
}

#[test]
fn purchase_on_reference_date_earns_best_recency() {
    let mut transactions = fixture();
    transactions.push(Transaction::new("hoje", "p-hoje", Decimal::ONE, reference_date()));

    let report = score(&transactions);
    let row = report
        .customers
        .iter()
        .find(|row| row.customer_id().0 == "hoje")
        .expect("customer present");

    assert_eq!(row.metrics.recency_days, 0);
    assert_eq!(row.grades.expect("graded").recency, Grade::A);
}

#[test]
fn frequency_and_value_grades_never_invert() {
    let report = score(&fixture());

    for left in &report.customers {
        for right in &report.customers {
            let (l, r) = (left.grades.expect("graded"), right.grades.expect("graded"));
            if left.metrics.value > right.metrics.value {
                assert!(!r.value.is_better_than(l.value));
            }
            if left.metrics.frequency > right.metrics.frequency {
                assert!(!r.frequency.is_better_than(l.frequency));
            }
            if left.metrics.recency_days > right.metrics.recency_days {
                assert!(!l.recency.is_better_than(r.recency));
            }
        }
    }
}

#[test]
fn missing_valor_total_is_a_schema_error() {
    let input = "ID_cliente,CodigoCompra,DiaCompra\nc1,p1,2021-12-01\n";

    let error = load_transactions(input.as_bytes(), &ReaderOptions::default())
        .expect_err("schema validation should fail");

    assert!(matches!(
        error,
        ValidationError::MissingColumns { ref columns } if columns == &vec!["ValorTotal".to_string()]
    ));
    assert!(error.to_string().contains("ValorTotal"));
}

#[test]
fn empty_input_yields_empty_report() {
    let transactions =
        load_transactions("ID_cliente,CodigoCompra,ValorTotal,DiaCompra\n".as_bytes(), &ReaderOptions::default())
            .expect("header-only input is valid");

    let report = score(&transactions);

    assert_eq!(report.status, ReportStatus::NoData);
    assert!(report.customers.is_empty());
    assert!(report.thresholds.is_none());
}

#[test]
fn identical_customers_collapse_quartiles_and_share_one_score() {
    let transactions: Vec<Transaction> = ["a", "b", "c", "d", "e"]
        .into_iter()
        .map(|id| Transaction::new(id, "p", Decimal::new(1999, 2), reference_date()))
        .collect();

    let report = score(&transactions);
    let thresholds = report.thresholds.expect("thresholds for non-empty input");

    for quartiles in [thresholds.recency, thresholds.frequency, thresholds.value] {
        assert_eq!(quartiles.q25, quartiles.q50);
        assert_eq!(quartiles.q50, quartiles.q75);
    }
    assert_eq!(thresholds.value.q50, Decimal::new(1999, 2));

    assert_eq!(report.customers.len(), 5);
    for row in &report.customers {
        assert_eq!(row.rfv_score.map(|score| score.to_string()).as_deref(), Some("ADD"));
        assert_eq!(row.action, None);
    }
}

#[test]
fn loaded_amounts_that_overflow_the_customer_total_are_rejected() {
    let input = "ID_cliente,CodigoCompra,ValorTotal,DiaCompra\n\
                 c1,p1,50000000000000000000000000000,2021-12-01\n\
                 c1,p2,50000000000000000000000000000,2021-12-02\n";

    let transactions =
        load_transactions(input.as_bytes(), &ReaderOptions::default()).expect("rows are valid");
    let error = RfvScorer::new(reference_date())
        .score(&transactions)
        .expect_err("total leaves the decimal range");

    assert!(matches!(error, ValidationError::ArithmeticOverflow { .. }));
}
