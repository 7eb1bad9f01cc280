use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

use crate::log_with_context;
use crate::models::{
    RatioTable, StatementKind, TidyRow, TidyTable, CLASSIFICATION_ROW_LABEL, FISCAL_YEARS,
};
use crate::utils::{artifact_date_stamp, date_from_artifact_name, log_artifact, to_vietnam, Logger};

pub const RATIOS_KIND: &str = "financialratios";
const STATEMENT_INDEX_HEADER: &str = "Chỉ tiêu";
const RATIO_INDEX_HEADER: &str = "Chỉ số";

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("manifest error: {0}")]
    Manifest(#[from] serde_json::Error),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ArtifactError + '_ {
    move |source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// One written artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactEntry {
    pub ticker: String,
    pub kind: String,
    pub generated_at: DateTime<Utc>,
    pub path: PathBuf,
    pub run_id: Uuid,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub entries: Vec<ArtifactEntry>,
}

impl Manifest {
    /// Most recently generated entry of `kind` whose file still exists
    pub fn latest(&self, ticker: &str, kind: &str) -> Option<&ArtifactEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.ticker == ticker && entry.kind == kind && entry.path.exists())
            .max_by_key(|entry| entry.generated_at)
    }
}

/// Dated artifact files plus a per-ticker JSON manifest describing them
pub struct ArtifactStore {
    store_dir: PathBuf,
    run_id: Uuid,
    logger: Logger,
}

impl ArtifactStore {
    pub fn new(store_dir: impl Into<PathBuf>) -> Result<Self, ArtifactError> {
        let store_dir = store_dir.into();
        fs::create_dir_all(&store_dir).map_err(io_error(&store_dir))?;
        Ok(Self {
            store_dir,
            run_id: Uuid::new_v4(),
            logger: Logger::new("ARTIFACTS"),
        })
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn store_dir(&self) -> &Path {
        &self.store_dir
    }

    pub fn manifest_path(&self, ticker: &str) -> PathBuf {
        self.store_dir.join(format!("{}_manifest.json", ticker))
    }

    pub fn load_manifest(&self, ticker: &str) -> Result<Manifest, ArtifactError> {
        let path = self.manifest_path(ticker);
        if !path.exists() {
            return Ok(Manifest::default());
        }
        let content = fs::read_to_string(&path).map_err(io_error(&path))?;
        Ok(serde_json::from_str(&content)?)
    }

    fn save_manifest(&self, ticker: &str, manifest: &Manifest) -> Result<(), ArtifactError> {
        let path = self.manifest_path(ticker);
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, serde_json::to_string_pretty(manifest)?).map_err(io_error(&staging))?;
        fs::rename(&staging, &path).map_err(io_error(&path))?;
        Ok(())
    }

    /// `{ticker}_{kind}_{ddmmyyyy}.{ext}` dated in Vietnam time
    pub fn artifact_path(&self, ticker: &str, kind: &str, ext: &str, at: DateTime<Utc>) -> PathBuf {
        let stamp = artifact_date_stamp(&to_vietnam(at));
        self.store_dir.join(format!("{}_{}_{}.{}", ticker, kind, stamp, ext))
    }

    pub fn record(&self, ticker: &str, kind: &str, path: &Path) -> Result<ArtifactEntry, ArtifactError> {
        self.record_at(ticker, kind, path, Utc::now())
    }

    /// Add an entry to the ticker's manifest, replacing one for the same kind and path
    pub fn record_at(
        &self,
        ticker: &str,
        kind: &str,
        path: &Path,
        generated_at: DateTime<Utc>,
    ) -> Result<ArtifactEntry, ArtifactError> {
        let mut manifest = self.load_manifest(ticker)?;
        let entry = ArtifactEntry {
            ticker: ticker.to_string(),
            kind: kind.to_string(),
            generated_at,
            path: path.to_path_buf(),
            run_id: self.run_id,
        };
        manifest
            .entries
            .retain(|existing| !(existing.kind == entry.kind && existing.path == entry.path));
        manifest.entries.push(entry.clone());
        self.save_manifest(ticker, &manifest)?;
        log_artifact(&format!("📝 {} {} -> {}", ticker, kind, path.display()));
        Ok(entry)
    }

    /// Latest artifact of `kind`: manifest first, dated file names as fallback
    pub fn latest(&self, ticker: &str, kind: &str) -> Result<Option<PathBuf>, ArtifactError> {
        let manifest = self.load_manifest(ticker)?;
        if let Some(entry) = manifest.latest(ticker, kind) {
            return Ok(Some(entry.path.clone()));
        }

        let prefix = format!("{}_{}_", ticker, kind);
        let entries = fs::read_dir(&self.store_dir).map_err(io_error(&self.store_dir))?;
        let mut best: Option<(chrono::NaiveDate, PathBuf)> = None;
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().to_string();
            let Some(rest) = name.strip_prefix(&prefix) else {
                continue;
            };
            // the remainder must be just the date stamp and extension
            if rest.contains('_') {
                continue;
            }
            let Some(date) = date_from_artifact_name(&name) else {
                continue;
            };
            if best.as_ref().is_none_or(|(best_date, _)| date > *best_date) {
                best = Some((date, entry.path()));
            }
        }
        if let Some((_, path)) = &best {
            log_with_context!(
                warn,
                "ARTIFACTS",
                "⚠️ No manifest entry for {} {}, using dated file {}",
                ticker,
                kind,
                path.display()
            );
        }
        Ok(best.map(|(_, path)| path))
    }

    /// Write raw bytes as a dated artifact and record it
    pub fn write_bytes(&self, ticker: &str, kind: &str, ext: &str, content: &[u8]) -> Result<PathBuf, ArtifactError> {
        let now = Utc::now();
        let path = self.artifact_path(ticker, kind, ext, now);
        fs::write(&path, content).map_err(io_error(&path))?;
        self.record_at(ticker, kind, &path, now)?;
        Ok(path)
    }

    /// Named after the requested ticker; the table's own ticker row may be empty
    pub fn write_statement(&self, ticker: &str, kind: StatementKind, table: &TidyTable) -> Result<PathBuf, ArtifactError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(table.header(STATEMENT_INDEX_HEADER))?;
        for row in &table.rows {
            let mut record = vec![row.label.clone()];
            record.extend(row.cells.iter().map(|cell| cell.clone().unwrap_or_default()));
            writer.write_record(&record)?;
        }
        let bytes = writer.into_inner().map_err(|e| csv::Error::from(e.into_error()))?;
        let path = self.write_bytes(ticker, kind.code(), "csv", &bytes)?;
        self.logger.info(&format!("✅ Wrote {} statement for {}", kind, ticker));
        Ok(path)
    }

    /// Latest statement table for the ticker, `None` when never written
    pub fn read_statement(&self, ticker: &str, kind: StatementKind) -> Result<Option<TidyTable>, ArtifactError> {
        let Some(path) = self.latest(ticker, kind.code())? else {
            self.logger.info(&format!("ℹ️ No {} artifact for {}", kind, ticker));
            return Ok(None);
        };
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(&path)?;
        let mut table = TidyTable::new(ticker);
        for record in reader.records() {
            let record = record?;
            let mut fields = record.iter();
            let label = fields.next().unwrap_or_default().to_string();
            let cells = (0..FISCAL_YEARS.len())
                .map(|_| fields.next().filter(|v| !v.is_empty()).map(str::to_string))
                .collect();
            table.rows.push(TidyRow { label, cells });
        }
        Ok(Some(table))
    }

    pub fn write_ratios(&self, table: &RatioTable) -> Result<PathBuf, ArtifactError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        let mut header = vec![RATIO_INDEX_HEADER.to_string()];
        header.extend(table.labels.iter().cloned());
        writer.write_record(&header)?;
        for (key, cells) in &table.rows {
            let mut record = vec![key.clone()];
            record.extend(cells.iter().map(|cell| cell.clone().unwrap_or_default()));
            writer.write_record(&record)?;
        }
        let bytes = writer.into_inner().map_err(|e| csv::Error::from(e.into_error()))?;
        let path = self.write_bytes(&table.ticker, RATIOS_KIND, "csv", &bytes)?;
        self.logger.info(&format!("✅ Wrote financial ratios for {}", table.ticker));
        Ok(path)
    }

    pub fn read_ratios(&self, ticker: &str) -> Result<Option<RatioTable>, ArtifactError> {
        let Some(path) = self.latest(ticker, RATIOS_KIND)? else {
            self.logger.info(&format!("ℹ️ No financial ratio artifact for {}", ticker));
            return Ok(None);
        };
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(&path)?;
        let labels: Vec<String> = reader.headers()?.iter().skip(1).map(str::to_string).collect();
        let mut table = RatioTable {
            ticker: ticker.to_string(),
            classifications: Vec::new(),
            labels,
            rows: Vec::new(),
        };
        for record in reader.records() {
            let record = record?;
            let mut fields = record.iter();
            let key = fields.next().unwrap_or_default().to_string();
            let cells: Vec<Option<String>> = (0..table.labels.len())
                .map(|_| fields.next().filter(|v| !v.is_empty()).map(str::to_string))
                .collect();
            if key == CLASSIFICATION_ROW_LABEL {
                table.classifications = cells.iter().map(|c| c.clone().unwrap_or_default()).collect();
            }
            table.rows.push((key, cells));
        }
        Ok(Some(table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RatioRecord, WideRecord, TICKER_ROW_LABEL};
    use crate::utils::{build_ratio_table, reshape};
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_artifact_naming() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();
        let at = Utc.with_ymd_and_hms(2025, 4, 1, 3, 0, 0).unwrap();
        let path = store.artifact_path("GEX", "bs", "csv", at);
        assert_eq!(path.file_name().unwrap(), "GEX_bs_01042025.csv");
    }

    #[test]
    fn test_statement_round_trip_through_manifest() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();
        let record = WideRecord::new()
            .with("Mã", "GEX")
            .with("Nợ ngắn hạn", "500")
            .with("Nợ ngắn hạn_3", "1500000000");
        let table = reshape(&record, StatementKind::BalanceSheet.line_items());
        store.write_statement("GEX", StatementKind::BalanceSheet, &table).unwrap();

        let manifest = store.load_manifest("GEX").unwrap();
        assert_eq!(manifest.entries.len(), 1);
        assert_eq!(manifest.entries[0].kind, "bs");
        assert_eq!(manifest.entries[0].run_id, store.run_id());

        let loaded = store.read_statement("GEX", StatementKind::BalanceSheet).unwrap().unwrap();
        assert_eq!(loaded, table);
        assert_eq!(loaded.cell(TICKER_ROW_LABEL, 2020), Some("GEX"));
        assert!(store.read_statement("GEX", StatementKind::CashFlow).unwrap().is_none());
    }

    #[test]
    fn test_blank_statement_is_named_after_requested_ticker() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();
        let table = reshape(&WideRecord::new(), StatementKind::BalanceSheet.line_items());
        assert_eq!(table.ticker, "");

        let path = store.write_statement("GEX", StatementKind::BalanceSheet, &table).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("GEX_bs_"), "{}", name);
        assert!(!dir.path().join("_manifest.json").exists());

        let loaded = store.read_statement("GEX", StatementKind::BalanceSheet).unwrap().unwrap();
        assert_eq!(loaded.cell(TICKER_ROW_LABEL, 2020), None);
    }

    #[test]
    fn test_rewriting_same_day_artifact_replaces_its_entry() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();
        let first = store.write_bytes("GEX", "draw_chart_1", "svg", b"<svg/>").unwrap();
        let second = store.write_bytes("GEX", "draw_chart_1", "svg", b"<svg></svg>").unwrap();
        store.write_bytes("GEX", "draw_chart_2", "svg", b"<svg/>").unwrap();
        assert_eq!(first, second);

        let manifest = store.load_manifest("GEX").unwrap();
        assert_eq!(manifest.entries.len(), 2);
        assert_eq!(store.latest("GEX", "draw_chart_1").unwrap(), Some(second));
    }

    #[test]
    fn test_latest_prefers_newest_manifest_entry() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();
        let old = dir.path().join("old.svg");
        let new = dir.path().join("new.svg");
        fs::write(&old, "a").unwrap();
        fs::write(&new, "b").unwrap();
        store
            .record_at("GEX", "draw_chart_1", &new, Utc.with_ymd_and_hms(2025, 4, 2, 0, 0, 0).unwrap())
            .unwrap();
        store
            .record_at("GEX", "draw_chart_1", &old, Utc.with_ymd_and_hms(2025, 3, 2, 0, 0, 0).unwrap())
            .unwrap();
        assert_eq!(store.latest("GEX", "draw_chart_1").unwrap(), Some(new));
    }

    #[test]
    fn test_latest_falls_back_to_dated_names() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();
        for name in [
            "GEX_draw_chart_1_01032025.svg",
            "GEX_draw_chart_1_15032025.svg",
            "GEX_draw_chart_10_30032025.svg",
        ] {
            fs::write(dir.path().join(name), "x").unwrap();
        }
        let latest = store.latest("GEX", "draw_chart_1").unwrap().unwrap();
        assert_eq!(latest.file_name().unwrap(), "GEX_draw_chart_1_15032025.svg");
        assert!(store.latest("VIC", "draw_chart_1").unwrap().is_none());
    }

    #[test]
    fn test_ratio_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();
        let table = build_ratio_table(
            "GEX",
            &[RatioRecord::new(2024).with("priceToEarning", 12.0).with("earningPerShare", 2500.0)],
        );
        store.write_ratios(&table).unwrap();
        let loaded = store.read_ratios("GEX").unwrap().unwrap();
        assert_eq!(loaded, table);
    }
}
