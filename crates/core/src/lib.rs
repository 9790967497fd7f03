pub mod config;
pub mod domain;
pub mod errors;
pub mod export;
pub mod ingest;
pub mod rfv;

pub use domain::customer::{CustomerMetrics, Grade, Grades, InvalidScore, RfvScore, ScoredCustomer};
pub use domain::transaction::{CustomerId, PurchaseId, Transaction};
pub use errors::{ApplicationError, ValidationError};
pub use export::{write_csv, write_json, write_report, ExportFormat, EXPORT_COLUMNS};
pub use ingest::{load_transactions, load_transactions_file, ReaderOptions, REQUIRED_COLUMNS};
pub use rfv::{
    format_currency, ActionTable, Direction, Quartiles, ReportStatus, RfvReport, RfvScorer,
    SortKey, SortOrder, Thresholds,
};
