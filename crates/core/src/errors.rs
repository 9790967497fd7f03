use thiserror::Error;

use crate::config::ConfigError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("input is missing required column(s): {}", .columns.join(", "))]
    MissingColumns { columns: Vec<String> },
    #[error(
        "column `{column}` could not be parsed as a date on {} row(s) (first: line {}, value `{first_value}`)",
        .rows.len(),
        .rows.first().copied().unwrap_or_default()
    )]
    InvalidDate { column: String, rows: Vec<usize>, first_value: String },
    #[error("column `{column}` is empty on line {row}")]
    MissingValue { column: String, row: usize },
    #[error("column `ValorTotal` holds an invalid amount `{value}` on line {row}")]
    InvalidAmount { row: usize, value: String },
    #[error("arithmetic overflow while {context}")]
    ArithmeticOverflow { context: String },
    #[error("could not read input: {0}")]
    Read(String),
}

impl ValidationError {
    /// Column names the error refers to, in report order.
    pub fn columns(&self) -> Vec<&str> {
        match self {
            Self::MissingColumns { columns } => columns.iter().map(String::as_str).collect(),
            Self::InvalidDate { column, .. } | Self::MissingValue { column, .. } => {
                vec![column.as_str()]
            }
            Self::InvalidAmount { .. } => vec!["ValorTotal"],
            Self::ArithmeticOverflow { .. } | Self::Read(_) => Vec::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Configuration(#[from] ConfigError),
    #[error("export failure: {0}")]
    Export(String),
}

impl ApplicationError {
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Validation(ValidationError::MissingColumns { .. }) => "schema",
            Self::Validation(ValidationError::InvalidDate { .. }) => "invalid_date",
            Self::Validation(ValidationError::MissingValue { .. })
            | Self::Validation(ValidationError::InvalidAmount { .. })
            | Self::Validation(ValidationError::ArithmeticOverflow { .. }) => "invalid_value",
            Self::Validation(ValidationError::Read(_)) => "input_read",
            Self::Configuration(_) => "config_validation",
            Self::Export(_) => "export",
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Configuration(_) => 2,
            Self::Validation(ValidationError::Read(_)) | Self::Export(_) => 4,
            Self::Validation(_) => 3,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Validation(ValidationError::MissingColumns { .. }) => {
                "The file must contain the columns ID_cliente, CodigoCompra, ValorTotal and DiaCompra."
            }
            Self::Validation(ValidationError::InvalidDate { .. }) => {
                "The DiaCompra column could not be interpreted as dates."
            }
            Self::Validation(ValidationError::ArithmeticOverflow { .. }) => {
                "Purchase amounts are too large to total exactly."
            }
            Self::Validation(_) => "The input file contains invalid rows. Fix them and try again.",
            Self::Configuration(_) => "The configuration is invalid.",
            Self::Export(_) => "The result could not be written.",
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ConfigError;
    use crate::errors::{ApplicationError, ValidationError};

    #[test]
    fn missing_columns_message_names_every_column() {
        let error = ValidationError::MissingColumns {
            columns: vec!["ValorTotal".to_owned(), "DiaCompra".to_owned()],
        };

        assert_eq!(
            error.to_string(),
            "input is missing required column(s): ValorTotal, DiaCompra"
        );
        assert_eq!(error.columns(), vec!["ValorTotal", "DiaCompra"]);
    }

    #[test]
    fn invalid_date_message_reports_first_offending_line() {
        let error = ValidationError::InvalidDate {
            column: "DiaCompra".to_owned(),
            rows: vec![4, 9],
            first_value: "ontem".to_owned(),
        };

        let message = error.to_string();
        assert!(message.contains("2 row(s)"));
        assert!(message.contains("line 4"));
        assert!(message.contains("`ontem`"));
    }

    #[test]
    fn schema_error_maps_to_input_validation_exit_code() {
        let error = ApplicationError::from(ValidationError::MissingColumns {
            columns: vec!["ValorTotal".to_owned()],
        });

        assert_eq!(error.error_class(), "schema");
        assert_eq!(error.exit_code(), 3);
    }

    #[test]
    fn configuration_error_maps_to_config_exit_code() {
        let error = ApplicationError::from(ConfigError::Validation("bad".to_owned()));

        assert_eq!(error.error_class(), "config_validation");
        assert_eq!(error.exit_code(), 2);
        assert_eq!(error.user_message(), "The configuration is invalid.");
    }

    #[test]
    fn read_and_export_failures_map_to_io_exit_code() {
        let read = ApplicationError::from(ValidationError::Read("gone".to_owned()));
        let export = ApplicationError::Export("disk full".to_owned());

        assert_eq!(read.exit_code(), 4);
        assert_eq!(export.exit_code(), 4);
        assert_eq!(export.error_class(), "export");
    }

    #[test]
    fn overflow_is_an_input_validation_failure() {
        let error = ApplicationError::from(ValidationError::ArithmeticOverflow {
            context: "summing ValorTotal for customer `c1`".to_owned(),
        });

        assert_eq!(error.error_class(), "invalid_value");
        assert_eq!(error.exit_code(), 3);
        assert!(error.to_string().contains("customer `c1`"));
    }
}
