//! Daily bar sources for the rotation engine.

mod csv_source;
mod feed;

pub use csv_source::{parse_date, CsvBarSource};
pub use feed::{BarFeed, ReplayFeed};

use rotator_core::error::DataError;
use rotator_core::types::{DailyBar, Security};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Load bars from a CSV file.
pub fn load_csv(path: impl AsRef<Path>, security: impl Into<Security>) -> Result<Vec<DailyBar>, DataError> {
    CsvBarSource::new(path, security)?.load()
}

/// Locate the CSV history for `security` inside `dir`.
///
/// Tries `{SYMBOL}.csv`, `{symbol}.csv` and `{SYMBOL}_daily.csv`.
pub fn find_history(dir: &Path, security: &Security) -> Option<PathBuf> {
    let ticker = security.as_str();
    [
        format!("{}.csv", ticker.to_uppercase()),
        format!("{}.csv", ticker.to_lowercase()),
        format!("{}_daily.csv", ticker.to_uppercase()),
    ]
    .into_iter()
    .map(|name| dir.join(name))
    .find(|path| path.is_file())
}

/// Load one history per security of the universe from `dir`.
pub fn load_universe(
    dir: impl AsRef<Path>,
    universe: &[Security],
) -> Result<HashMap<Security, Vec<DailyBar>>, DataError> {
    let dir = dir.as_ref();
    let mut histories = HashMap::with_capacity(universe.len());

    for security in universe {
        let path =
            find_history(dir, security).ok_or_else(|| DataError::SymbolNotFound(security.clone()))?;
        histories.insert(security.clone(), load_csv(&path, security.clone())?);
    }

    info!(
        securities = histories.len(),
        bars = histories.values().map(Vec::len).sum::<usize>(),
        dir = %dir.display(),
        "loaded universe histories"
    );
    Ok(histories)
}
