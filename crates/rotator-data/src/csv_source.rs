//! CSV daily bar source.

use chrono::{NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use rotator_core::error::DataError;
use rotator_core::types::{DailyBar, Security};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

/// CSV record format. Columns other than date and close are ignored.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(alias = "Date", alias = "timestamp", alias = "Timestamp")]
    date: String,
    #[serde(alias = "Close", default)]
    close: Option<String>,
    #[serde(rename = "Adj Close", alias = "adj_close", default)]
    adj_close: Option<String>,
}

/// Daily closes for one security read from a CSV file.
pub struct CsvBarSource {
    path: PathBuf,
    security: Security,
}

impl CsvBarSource {
    /// Create a source for `security` backed by the file at `path`.
    pub fn new(path: impl AsRef<Path>, security: impl Into<Security>) -> Result<Self, DataError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DataError::NoDataAvailable);
        }
        Ok(Self {
            path: path.to_path_buf(),
            security: security.into(),
        })
    }

    pub fn security(&self) -> &Security {
        &self.security
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all bars, sorted by date with one bar per date.
    ///
    /// `close` is used when present, `Adj Close` otherwise. When a date
    /// repeats, the last row wins.
    pub fn load(&self) -> Result<Vec<DailyBar>, DataError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .map_err(|e| DataError::ParseError(e.to_string()))?;

        let mut bars: Vec<DailyBar> = Vec::new();

        for (line, result) in reader.deserialize().enumerate() {
            let record: CsvRecord = result.map_err(|e| DataError::ParseError(e.to_string()))?;

            let date = parse_date(&record.date)?;
            let raw = record
                .close
                .filter(|c| !c.is_empty())
                .or(record.adj_close.filter(|c| !c.is_empty()))
                .ok_or_else(|| {
                    DataError::ParseError(format!(
                        "{}: row {} has no close price",
                        self.path.display(),
                        line + 2
                    ))
                })?;
            let close = parse_price(&raw)?;

            bars.push(DailyBar::new(self.security.clone(), date, close));
        }

        bars.sort_by_key(|b| b.date);
        let before = bars.len();
        // Keep the last row for each date
        bars.reverse();
        bars.dedup_by_key(|b| b.date);
        bars.reverse();
        if bars.len() != before {
            warn!(
                security = %self.security,
                duplicates = before - bars.len(),
                "duplicate dates dropped"
            );
        }

        debug!(security = %self.security, bars = bars.len(), path = %self.path.display(), "loaded CSV");
        Ok(bars)
    }
}

/// Parse various date formats into a session date.
pub fn parse_date(date_str: &str) -> Result<NaiveDate, DataError> {
    let formats = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y", "%Y%m%d"];

    for format in formats {
        if let Ok(d) = NaiveDate::parse_from_str(date_str, format) {
            return Ok(d);
        }
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(date_str, format) {
            return Ok(dt.date());
        }
    }

    Err(DataError::ParseError(format!(
        "Could not parse date: {}",
        date_str
    )))
}

fn parse_price(raw: &str) -> Result<Decimal, DataError> {
    let price = Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|e| DataError::ParseError(format!("Invalid price '{raw}': {e}")))?;
    if price < Decimal::ZERO {
        return Err(DataError::ParseError(format!("Negative price: {raw}")));
    }
    Ok(price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parse_date() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();

        assert_eq!(parse_date("2024-01-15").unwrap(), expected);
        assert_eq!(parse_date("2024/01/15").unwrap(), expected);
        assert_eq!(parse_date("01/15/2024").unwrap(), expected);
        assert_eq!(parse_date("2024-01-15 16:00:00").unwrap(), expected);
        assert!(parse_date("yesterday").is_err());
    }

    #[test]
    fn test_load_yahoo_style() {
        let file = write_csv(
            "Date,Open,High,Low,Close,Adj Close,Volume\n\
             2024-01-03,10,11,9,10.5,10.4,1000\n\
             2024-01-02,10,11,9,10.0,9.9,1000\n",
        );
        let source = CsvBarSource::new(file.path(), "SPY").unwrap();
        let bars = source.load().unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(bars[0].close, dec!(10.0));
        assert_eq!(bars[1].close, dec!(10.5));
        assert_eq!(bars[1].security, Security::new("SPY"));
    }

    #[test]
    fn test_adj_close_fallback() {
        let file = write_csv("date,Adj Close\n2024-01-02,42.25\n");
        let bars = CsvBarSource::new(file.path(), "X").unwrap().load().unwrap();
        assert_eq!(bars[0].close, dec!(42.25));
    }

    #[test]
    fn test_duplicate_dates_keep_last() {
        let file = write_csv("date,close\n2024-01-02,1\n2024-01-02,2\n2024-01-03,3\n");
        let bars = CsvBarSource::new(file.path(), "X").unwrap().load().unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, dec!(2));
    }

    #[test]
    fn test_rejects_bad_rows() {
        let file = write_csv("date,close\n2024-01-02,-1\n");
        assert!(CsvBarSource::new(file.path(), "X").unwrap().load().is_err());

        let file = write_csv("date,close\n2024-01-02,abc\n");
        assert!(CsvBarSource::new(file.path(), "X").unwrap().load().is_err());

        let file = write_csv("date,open\n2024-01-02,1\n");
        assert!(CsvBarSource::new(file.path(), "X").unwrap().load().is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            CsvBarSource::new("/nonexistent/file.csv", "X"),
            Err(DataError::NoDataAvailable)
        ));
    }
}
