//! Recipient list import.
//!
//! The first row is a header. Columns named `wallet` and `drop` are picked up
//! in any order and case; otherwise the first two columns are used.

use crate::format::parse_raw_amount;
use crate::types::DropAccount;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Failed to open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV parsing error at line {line}: {source}")]
    Csv {
        line: u64,
        #[source]
        source: csv::Error,
    },

    #[error("CSV needs at least two columns (wallet, drop), found {0}")]
    MissingColumns(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImportSummary {
    pub accounts: Vec<DropAccount>,
    /// Rows dropped because their amount did not parse
    pub skipped: usize,
}

fn clean(field: &str) -> &str {
    field.trim().trim_matches(|c| c == '"' || c == '\'').trim()
}

fn line_of(err: &csv::Error, fallback: u64) -> u64 {
    err.position().map(|p| p.line()).unwrap_or(fallback)
}

pub fn parse_drop_csv<R: Read>(reader: R) -> Result<ImportSummary, ImportError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| ImportError::Csv {
            line: line_of(&e, 1),
            source: e,
        })?
        .clone();

    let names: Vec<String> = headers.iter().map(|h| clean(h).to_lowercase()).collect();
    let (wallet_col, drop_col) = match (
        names.iter().position(|n| n == "wallet"),
        names.iter().position(|n| n == "drop"),
    ) {
        (Some(w), Some(d)) => (w, d),
        _ if names.len() >= 2 => (0, 1),
        _ => return Err(ImportError::MissingColumns(names.len())),
    };

    let mut summary = ImportSummary::default();
    for (idx, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| ImportError::Csv {
            line: line_of(&e, idx as u64 + 2),
            source: e,
        })?;

        let wallet = clean(record.get(wallet_col).unwrap_or(""));
        if wallet.is_empty() {
            continue;
        }
        match parse_raw_amount(record.get(drop_col).unwrap_or("")) {
            Ok(drop) => summary.accounts.push(DropAccount::new(wallet, drop)),
            Err(e) => {
                tracing::debug!("Row {} skipped: {}", idx + 2, e);
                summary.skipped += 1;
            }
        }
    }

    if summary.skipped > 0 {
        tracing::warn!("{} rows with invalid amounts were skipped during CSV import", summary.skipped);
    }
    tracing::info!("Imported {} drop accounts", summary.accounts.len());
    Ok(summary)
}

pub fn load_drop_csv(path: &Path) -> Result<ImportSummary, ImportError> {
    let file = File::open(path).map_err(|e| ImportError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_drop_csv(file)
}
