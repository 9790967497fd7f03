use std::io::Write;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::ApplicationError;
use crate::rfv::RfvReport;

/// Column layout of the exported table. Downstream sheets depend on these
/// exact names in this order.
pub const EXPORT_COLUMNS: [&str; 9] = [
    "ID_cliente",
    "Recencia",
    "Frequencia",
    "Valor",
    "R_quartil",
    "F_quartil",
    "V_quartil",
    "RFV_Score",
    "Ação de Marketing",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Csv,
    Json,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(format!("unsupported export format `{other}` (expected csv|json)")),
        }
    }
}

pub fn write_report<W: Write>(
    report: &RfvReport,
    format: ExportFormat,
    writer: W,
) -> Result<(), ApplicationError> {
    match format {
        ExportFormat::Csv => write_csv(report, writer),
        ExportFormat::Json => write_json(report, writer),
    }
}

pub fn write_csv<W: Write>(report: &RfvReport, writer: W) -> Result<(), ApplicationError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(EXPORT_COLUMNS).map_err(export_error)?;

    for customer in &report.customers {
        let grade = |pick: fn(&crate::domain::customer::Grades) -> char| {
            customer.grades.as_ref().map(|grades| pick(grades).to_string()).unwrap_or_default()
        };

        csv_writer
            .write_record([
                customer.metrics.customer_id.0.clone(),
                customer.metrics.recency_days.to_string(),
                customer.metrics.frequency.to_string(),
                customer.metrics.value.to_string(),
                grade(|grades| grades.recency.as_char()),
                grade(|grades| grades.frequency.as_char()),
                grade(|grades| grades.value.as_char()),
                customer.rfv_score.map(|score| score.to_string()).unwrap_or_default(),
                customer.action.clone().unwrap_or_default(),
            ])
            .map_err(export_error)?;
    }

    csv_writer.flush().map_err(|error| ApplicationError::Export(error.to_string()))?;
    info!(event_name = "rfv.export.csv", rows = report.len(), "report exported as csv");
    Ok(())
}

pub fn write_json<W: Write>(report: &RfvReport, writer: W) -> Result<(), ApplicationError> {
    serde_json::to_writer_pretty(writer, report)
        .map_err(|error| ApplicationError::Export(error.to_string()))?;
    info!(event_name = "rfv.export.json", rows = report.len(), "report exported as json");
    Ok(())
}

fn export_error(error: csv::Error) -> ApplicationError {
    ApplicationError::Export(error.to_string())
}
