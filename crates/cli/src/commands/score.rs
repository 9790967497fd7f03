use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::Args;
use rfv_core::config::{AppConfig, LoadOptions};
use rfv_core::{
    format_currency, load_transactions_file, write_report, ApplicationError, ExportFormat,
    Quartiles, ReportStatus, RfvReport, RfvScorer, ScoredCustomer, SortKey, SortOrder, Thresholds,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::commands::CommandResult;

#[derive(Debug, Clone, Args)]
pub struct ScoreArgs {
    #[arg(long, help = "Purchase table with ID_cliente, CodigoCompra, ValorTotal and DiaCompra")]
    pub input: PathBuf,
    #[arg(long, help = "Write the graded table to this path")]
    pub output: Option<PathBuf>,
    #[arg(long, default_value = "csv", help = "Export format: csv|json")]
    pub format: ExportFormat,
    #[arg(long, help = "Reference date for recency (YYYY-MM-DD, or `today` for the local clock)")]
    pub reference_date: Option<String>,
    #[arg(long, help = "Number of customers shown in the summary")]
    pub top: Option<usize>,
    #[arg(long, default_value = "value", help = "Summary ordering: customer_id|recency|frequency|value|score")]
    pub sort: SortKey,
    #[arg(long, help = "Sort the summary ascending instead of descending")]
    pub ascending: bool,
    #[arg(long, help = "Emit machine-readable JSON output")]
    pub json: bool,
}

impl ScoreArgs {
    pub fn for_input(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: None,
            format: ExportFormat::Csv,
            reference_date: None,
            top: None,
            sort: SortKey::Value,
            ascending: false,
            json: false,
        }
    }
}

struct ScoreOutcome {
    report: RfvReport,
    top_n: usize,
    exported_to: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ScorePayload<'a> {
    command: &'static str,
    status: &'static str,
    report_status: ReportStatus,
    reference_date: NaiveDate,
    transactions: usize,
    customers: usize,
    thresholds: Option<&'a Thresholds>,
    output: Option<String>,
    sorted_by: &'static str,
    top: Vec<&'a ScoredCustomer>,
}

pub fn run(args: &ScoreArgs, options: LoadOptions) -> CommandResult {
    match execute(args, options) {
        Ok(outcome) => render(args, &outcome),
        Err(error) => CommandResult::from_error("score", &error),
    }
}

fn execute(args: &ScoreArgs, mut options: LoadOptions) -> Result<ScoreOutcome, ApplicationError> {
    if let Some(raw) = &args.reference_date {
        options.overrides.reference_date = Some(raw.parse()?);
    }
    if let Some(top) = args.top {
        options.overrides.top_n = Some(top);
    }
    let config = AppConfig::load(options)?;

    let anchor = config.scoring.reference_date;
    if anchor.is_wall_clock() {
        warn!(
            event_name = "rfv.cli.wall_clock_reference",
            "reference date taken from the local clock; results change from day to day"
        );
    }
    let reference_date = anchor.resolve();

    let transactions = load_transactions_file(&args.input, &config.input.reader_options())?;
    let report =
        RfvScorer::new(reference_date).with_actions(config.actions.clone()).score(&transactions)?;

    if let Some(path) = &args.output {
        export(&report, args.format, path)?;
    }

    Ok(ScoreOutcome { report, top_n: config.scoring.top_n, exported_to: args.output.clone() })
}

fn export(report: &RfvReport, format: ExportFormat, path: &Path) -> Result<(), ApplicationError> {
    let file = File::create(path).map_err(|error| {
        ApplicationError::Export(format!("failed to create `{}`: {error}", path.display()))
    })?;
    let mut writer = BufWriter::new(file);
    write_report(report, format, &mut writer)?;
    writer.flush().map_err(|error| {
        ApplicationError::Export(format!("failed to flush `{}`: {error}", path.display()))
    })?;

    info!(event_name = "rfv.cli.exported", path = %path.display(), "graded table written");
    Ok(())
}

fn render(args: &ScoreArgs, outcome: &ScoreOutcome) -> CommandResult {
    let order = if args.ascending { SortOrder::Ascending } else { SortOrder::Descending };
    let top = outcome.report.top(outcome.top_n, args.sort, order);

    if args.json {
        let payload = ScorePayload {
            command: "score",
            status: "ok",
            report_status: outcome.report.status,
            reference_date: outcome.report.reference_date,
            transactions: outcome.report.transaction_count,
            customers: outcome.report.len(),
            thresholds: outcome.report.thresholds.as_ref(),
            output: outcome.exported_to.as_ref().map(|path| path.display().to_string()),
            sorted_by: args.sort.column_name(),
            top,
        };
        return match serde_json::to_string_pretty(&payload) {
            Ok(output) => CommandResult { exit_code: 0, output },
            Err(error) => CommandResult::failure("score", "serialization", error.to_string(), 4),
        };
    }

    CommandResult { exit_code: 0, output: render_human(args, outcome, &top, order) }
}

fn render_human(
    args: &ScoreArgs,
    outcome: &ScoreOutcome,
    top: &[&ScoredCustomer],
    order: SortOrder,
) -> String {
    let report = &outcome.report;
    let mut lines = Vec::new();

    if report.status == ReportStatus::NoData {
        lines.push(format!(
            "rfv: no transactions found in `{}`; nothing to score (reference date {})",
            args.input.display(),
            report.reference_date
        ));
        return lines.join("\n");
    }

    lines.push(format!(
        "rfv: scored {} customers from {} transactions (reference date {})",
        report.len(),
        report.transaction_count,
        report.reference_date
    ));

    if let Some(thresholds) = &report.thresholds {
        lines.push("thresholds (q25 / q50 / q75):".to_string());
        lines.push(render_quartiles("Recencia", &thresholds.recency));
        lines.push(render_quartiles("Frequencia", &thresholds.frequency));
        lines.push(render_quartiles("Valor", &thresholds.value));
    }

    let direction = match order {
        SortOrder::Ascending => "ascending",
        SortOrder::Descending => "descending",
    };
    lines.push(format!("top {} customers by {} ({direction}):", top.len(), args.sort));
    lines.push("ID_cliente | Recencia | Frequencia | Valor | RFV_Score | Ação de Marketing".to_string());
    for row in top {
        lines.push(format!(
            "{} | {} | {} | {} | {} | {}",
            row.customer_id(),
            row.metrics.recency_days,
            row.metrics.frequency,
            format_currency(row.metrics.value),
            row.rfv_score.map(|score| score.to_string()).unwrap_or_else(|| "-".to_string()),
            row.action.as_deref().unwrap_or("-"),
        ));
    }

    if let Some(path) = &outcome.exported_to {
        let format = match args.format {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        };
        lines.push(format!("exported {format} to `{}`", path.display()));
    }

    lines.join("\n")
}

fn render_quartiles(label: &str, quartiles: &Quartiles) -> String {
    format!("- {label}: {} / {} / {}", quartiles.q25, quartiles.q50, quartiles.q75)
}
