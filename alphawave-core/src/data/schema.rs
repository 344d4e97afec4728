//! Table schema contract: the boundary between the ingestors and the dashboard.
//!
//! Defines the exact (case-sensitive) column names and types of the shared
//! market files. Writers generate the header from this contract; readers
//! validate against it before any computation.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::Market;

/// Version of the file contract, recorded in every metadata sidecar.
pub const SCHEMA_VERSION: u32 = 1;

pub const TEMPO: &str = "tempo";
pub const ABERTURA: &str = "abertura";
pub const ALTO: &str = "alto";
pub const BAIXO: &str = "baixo";
pub const FECHAMENTO: &str = "fechamento";
pub const VOLUME: &str = "volume";
pub const MOEDA: &str = "moeda";
pub const MERCADO: &str = "mercado";

/// Logical column types in the flat file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    /// Date or timestamp text.
    Timestamp,
    Float64,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub dtype: ColumnType,
    /// Empty cells allowed (missing open/high/low from the provider).
    pub nullable: bool,
}

const CORE_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec { name: TEMPO, dtype: ColumnType::Timestamp, nullable: false },
    ColumnSpec { name: ABERTURA, dtype: ColumnType::Float64, nullable: true },
    ColumnSpec { name: ALTO, dtype: ColumnType::Float64, nullable: true },
    ColumnSpec { name: BAIXO, dtype: ColumnType::Float64, nullable: true },
    ColumnSpec { name: FECHAMENTO, dtype: ColumnType::Float64, nullable: false },
    ColumnSpec { name: VOLUME, dtype: ColumnType::Float64, nullable: false },
    ColumnSpec { name: MOEDA, dtype: ColumnType::Text, nullable: false },
];

const MARKET_COLUMN: ColumnSpec = ColumnSpec {
    name: MERCADO,
    dtype: ColumnType::Text,
    nullable: false,
};

/// Column contract for one market's file.
///
/// Equity files carry `mercado` after the core columns; crypto files do not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    market: Market,
    columns: Vec<ColumnSpec>,
}

impl TableSchema {
    pub fn for_market(market: Market) -> Self {
        let mut columns = CORE_COLUMNS.to_vec();
        if market.has_market_column() {
            columns.push(MARKET_COLUMN);
        }
        Self { market, columns }
    }

    pub fn market(&self) -> Market {
        self.market
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Header row in write order.
    pub fn header(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    /// Check that every contract column appears in `header`.
    ///
    /// Extra columns are tolerated; missing ones are reported in contract order.
    pub fn validate_header<S: AsRef<str>>(&self, header: &[S]) -> Result<(), SchemaError> {
        let missing: Vec<String> = self
            .columns
            .iter()
            .filter(|c| !header.iter().any(|h| h.as_ref() == c.name))
            .map(|c| c.name.to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::MissingColumns {
                market: self.market,
                columns: missing,
            })
        }
    }

    /// Validate a frame read with every column as text.
    ///
    /// Checks column presence, then that numeric columns parse as `Float64`
    /// and that no non-nullable column has empty cells. Returns a frame whose numeric columns
    /// are cast to `Float64`.
    pub fn validate_frame(&self, df: &DataFrame) -> Result<DataFrame, SchemaError> {
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        self.validate_header(&names)?;

        if df.height() == 0 {
            return Err(SchemaError::Empty);
        }

        let mut out = df.select(self.header())?;
        for spec in &self.columns {
            let column = out.column(spec.name)?;
            if spec.dtype == ColumnType::Float64 {
                let cast = column
                    .as_materialized_series()
                    .strict_cast(&DataType::Float64)
                    .map_err(|_| SchemaError::TypeMismatch {
                        column: spec.name.to_string(),
                        expected: ColumnType::Float64,
                        actual: column.dtype().to_string(),
                    })?;
                out.with_column(cast)?;
            }
            let column = out.column(spec.name)?;
            if !spec.nullable && column.null_count() > 0 {
                return Err(SchemaError::NullValues {
                    column: spec.name.to_string(),
                    count: column.null_count(),
                });
            }
        }
        Ok(out)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("{market} file is missing required column(s): {}", columns.join(", "))]
    MissingColumns { market: Market, columns: Vec<String> },

    #[error("column '{column}' should be {expected:?}, found {actual}")]
    TypeMismatch {
        column: String,
        expected: ColumnType,
        actual: String,
    },

    #[error("column '{column}' has {count} empty value(s)")]
    NullValues { column: String, count: usize },

    #[error("file has a header but no rows")]
    Empty,

    #[error("unreadable table: {0}")]
    Unreadable(String),
}

impl From<PolarsError> for SchemaError {
    fn from(e: PolarsError) -> Self {
        SchemaError::Unreadable(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_frame(cols: &[(&str, &[&str])]) -> DataFrame {
        DataFrame::new(
            cols.iter()
                .map(|(name, values)| Column::new((*name).into(), values.to_vec()))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn equity_header_has_market_column_last() {
        let header = TableSchema::for_market(Market::DomesticEquity).header();
        assert_eq!(
            header,
            vec!["tempo", "abertura", "alto", "baixo", "fechamento", "volume", "moeda", "mercado"]
        );
    }

    #[test]
    fn crypto_header_has_no_market_column() {
        let header = TableSchema::for_market(Market::Crypto).header();
        assert_eq!(header.len(), 7);
        assert!(!header.contains(&"mercado"));
    }

    #[test]
    fn missing_fechamento_and_moeda_are_reported() {
        let schema = TableSchema::for_market(Market::Crypto);
        let err = schema
            .validate_header(&["tempo", "abertura", "alto", "baixo", "volume"])
            .unwrap_err();
        match err {
            SchemaError::MissingColumns { columns, .. } => {
                assert_eq!(columns, vec!["fechamento", "moeda"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn column_names_are_case_sensitive() {
        let schema = TableSchema::for_market(Market::Crypto);
        let header = ["tempo", "abertura", "alto", "baixo", "Fechamento", "volume", "moeda"];
        assert!(schema.validate_header(&header).is_err());
    }

    #[test]
    fn equity_file_without_mercado_is_rejected() {
        let schema = TableSchema::for_market(Market::ForeignEquity);
        let header = ["tempo", "abertura", "alto", "baixo", "fechamento", "volume", "moeda"];
        assert!(schema.validate_header(&header).is_err());
    }

    #[test]
    fn frame_numeric_columns_are_cast() {
        let df = text_frame(&[
            ("tempo", &["2024-01-02 00:00:00"]),
            ("abertura", &["10.5"]),
            ("alto", &["11"]),
            ("baixo", &["10"]),
            ("fechamento", &["10.75"]),
            ("volume", &["1200"]),
            ("moeda", &["BTC/USDT"]),
            ("extra", &["ignored"]),
        ]);
        let out = TableSchema::for_market(Market::Crypto).validate_frame(&df).unwrap();
        assert_eq!(out.width(), 7);
        assert_eq!(out.column("fechamento").unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn frame_with_text_in_price_column_is_rejected() {
        let df = text_frame(&[
            ("tempo", &["2024-01-02"]),
            ("abertura", &["10"]),
            ("alto", &["11"]),
            ("baixo", &["9"]),
            ("fechamento", &["ten"]),
            ("volume", &["1"]),
            ("moeda", &["BTC/USDT"]),
        ]);
        let err = TableSchema::for_market(Market::Crypto)
            .validate_frame(&df)
            .unwrap_err();
        assert!(matches!(err, SchemaError::TypeMismatch { ref column, .. } if column == "fechamento"));
    }
}
