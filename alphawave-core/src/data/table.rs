//! Flat-file table IO for the shared market files.
//!
//! Layout: one CSV per market, header from [`TableSchema`], rows grouped by
//! symbol in the order given by the writer. Next to each file sits
//! `{file}.meta.json` with the schema version, row count, symbols and a BLAKE3
//! hash of the CSV bytes.
//!
//! - Atomic writes (write to `.tmp`, rename into place)
//! - Rows validated at the write boundary
//! - Schema validated at the read boundary (polars CSV reader)

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::schema::{self, SchemaError, TableSchema, SCHEMA_VERSION};
use crate::domain::{check_symbol_order, BarError, Market, PriceBar};

/// Format used for the `tempo` column on write.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Metadata sidecar for a written table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMeta {
    pub schema_version: u32,
    pub market: Market,
    pub row_count: usize,
    pub symbols: Vec<String>,
    pub content_hash: String,
    pub written_at: NaiveDateTime,
}

/// Bars read back from a table, plus how many rows failed bar validation.
#[derive(Debug, Clone)]
pub struct TableRead {
    pub bars: Vec<PriceBar>,
    pub rejected_rows: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV encoding failed: {0}")]
    Csv(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("row {row}: {source}")]
    InvalidRow {
        row: usize,
        #[source]
        source: BarError,
    },

    #[error("row {row}: bar belongs to {found}, table is {expected}")]
    MarketMismatch {
        row: usize,
        expected: Market,
        found: Market,
    },

    #[error("row {row}: unrecognised timestamp '{value}'")]
    InvalidTimestamp { row: usize, value: String },

    #[error("refusing to write an empty table")]
    Empty,

    #[error("metadata sidecar: {0}")]
    Meta(String),
}

/// Path of the metadata sidecar for a table file.
pub fn meta_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".meta.json");
    PathBuf::from(name)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a `tempo` cell.
///
/// Accepts `YYYY-MM-DD HH:MM:SS` (optionally fractional), ISO `T`-separated
/// forms, timestamps with a UTC offset (normalised to UTC) and bare dates
/// (midnight).
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    for fmt in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(ts);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%d %H:%M:%S%.f%:z"] {
        if let Ok(dt) = DateTime::parse_from_str(value, fmt) {
            return Some(dt.naive_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn format_price(v: f64) -> String {
    if v.is_finite() {
        v.to_string()
    } else {
        String::new()
    }
}

/// Encode bars as CSV bytes in the contract layout.
///
/// Every bar must pass validation, belong to `market`, and be strictly
/// increasing in time within its symbol. `market_label` fills the `mercado`
/// column of equity files and is ignored for crypto.
pub fn encode_table(
    market: Market,
    market_label: &str,
    bars: &[PriceBar],
) -> Result<Vec<u8>, TableError> {
    if bars.is_empty() {
        return Err(TableError::Empty);
    }
    for (row, bar) in bars.iter().enumerate() {
        if bar.market != market {
            return Err(TableError::MarketMismatch {
                row,
                expected: market,
                found: bar.market,
            });
        }
        bar.validate()
            .map_err(|source| TableError::InvalidRow { row, source })?;
    }
    check_symbol_order(bars).map_err(|source| TableError::InvalidRow {
        row: bars.len(),
        source,
    })?;

    let schema = TableSchema::for_market(market);
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(schema.header())
        .map_err(|e| TableError::Csv(e.to_string()))?;

    for bar in bars {
        let mut record = vec![
            format_timestamp(&bar.timestamp),
            format_price(bar.open),
            format_price(bar.high),
            format_price(bar.low),
            format_price(bar.close),
            bar.volume.to_string(),
            bar.symbol.clone(),
        ];
        if market.has_market_column() {
            record.push(market_label.to_string());
        }
        wtr.write_record(&record)
            .map_err(|e| TableError::Csv(e.to_string()))?;
    }

    wtr.into_inner()
        .map_err(|e| TableError::Csv(e.to_string()))
}

/// Write a table atomically and refresh its sidecar.
///
/// The previous file stays in place until the rename, so readers see either
/// the old or the new table, never a partial one.
pub fn write_table(
    path: &Path,
    market: Market,
    market_label: &str,
    bars: &[PriceBar],
) -> Result<TableMeta, TableError> {
    let bytes = encode_table(market, market_label, bars)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| TableError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let tmp = tmp_path(path);
    fs::write(&tmp, &bytes).map_err(|source| TableError::Io {
        path: tmp.clone(),
        source,
    })?;
    fs::rename(&tmp, path).map_err(|source| {
        let _ = fs::remove_file(&tmp);
        TableError::Io {
            path: path.to_path_buf(),
            source,
        }
    })?;

    let mut symbols: Vec<String> = Vec::new();
    for bar in bars {
        if !symbols.contains(&bar.symbol) {
            symbols.push(bar.symbol.clone());
        }
    }

    let meta = TableMeta {
        schema_version: SCHEMA_VERSION,
        market,
        row_count: bars.len(),
        symbols,
        content_hash: blake3::hash(&bytes).to_hex().to_string(),
        written_at: chrono::Utc::now().naive_utc(),
    };
    let meta_json =
        serde_json::to_string_pretty(&meta).map_err(|e| TableError::Meta(e.to_string()))?;
    let sidecar = meta_path(path);
    fs::write(&sidecar, meta_json).map_err(|source| TableError::Io {
        path: sidecar,
        source,
    })?;

    tracing::debug!(
        path = %path.display(),
        rows = meta.row_count,
        hash = %meta.content_hash,
        "table written"
    );
    Ok(meta)
}

/// Read the sidecar for a table, if present and parseable.
pub fn read_meta(path: &Path) -> Option<TableMeta> {
    let content = fs::read_to_string(meta_path(path)).ok()?;
    serde_json::from_str(&content).ok()
}

/// Read and validate a market table.
///
/// Schema problems (missing columns, non-numeric prices, empty key cells) fail
/// the whole read. Rows that parse but violate bar invariants are dropped and
/// counted in `rejected_rows`.
pub fn read_table(path: &Path, market: Market) -> Result<TableRead, TableError> {
    if !path.exists() {
        return Err(TableError::NotFound {
            path: path.to_path_buf(),
        });
    }

    // Every column as text; the schema performs the typed casts.
    let raw = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .map_err(SchemaError::from)?;

    let df = TableSchema::for_market(market).validate_frame(&raw)?;
    let bars_and_rejects = frame_to_bars(&df, market)?;

    if bars_and_rejects.rejected_rows > 0 {
        tracing::warn!(
            path = %path.display(),
            rejected = bars_and_rejects.rejected_rows,
            "dropped rows that violate bar invariants"
        );
    }
    Ok(bars_and_rejects)
}

fn frame_to_bars(df: &DataFrame, market: Market) -> Result<TableRead, TableError> {
    let map_err = |e: PolarsError| TableError::Schema(SchemaError::from(e));

    let tempo = df.column(schema::TEMPO).map_err(map_err)?.str().map_err(map_err)?;
    let open = df.column(schema::ABERTURA).map_err(map_err)?.f64().map_err(map_err)?;
    let high = df.column(schema::ALTO).map_err(map_err)?.f64().map_err(map_err)?;
    let low = df.column(schema::BAIXO).map_err(map_err)?.f64().map_err(map_err)?;
    let close = df.column(schema::FECHAMENTO).map_err(map_err)?.f64().map_err(map_err)?;
    let volume = df.column(schema::VOLUME).map_err(map_err)?.f64().map_err(map_err)?;
    let moeda = df.column(schema::MOEDA).map_err(map_err)?.str().map_err(map_err)?;

    let mut bars = Vec::with_capacity(df.height());
    let mut rejected_rows = 0;

    for row in 0..df.height() {
        let raw_ts = tempo.get(row).unwrap_or_default();
        let timestamp = parse_timestamp(raw_ts).ok_or_else(|| TableError::InvalidTimestamp {
            row,
            value: raw_ts.to_string(),
        })?;

        let bar = PriceBar {
            timestamp,
            symbol: moeda.get(row).unwrap_or_default().trim().to_string(),
            market,
            open: open.get(row).unwrap_or(f64::NAN),
            high: high.get(row).unwrap_or(f64::NAN),
            low: low.get(row).unwrap_or(f64::NAN),
            close: close.get(row).unwrap_or(f64::NAN),
            volume: volume.get(row).unwrap_or(f64::NAN),
        };

        match bar.validate() {
            Ok(()) => bars.push(bar),
            Err(e) => {
                tracing::debug!(row, error = %e, "rejecting row");
                rejected_rows += 1;
            }
        }
    }

    Ok(TableRead {
        bars,
        rejected_rows,
    })
}
