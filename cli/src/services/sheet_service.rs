use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::{
    CellValue, IndustryClassification, IndustryMultiples, PricePoint, StatementKind, WideRecord,
    TICKER_COLUMN,
};
use crate::utils::{normalize_key, parse_decimal_comma, parse_number, parse_sheet_date, Logger, Timer};

pub const CLASSIFICATION_FILE: &str = "Phan_loai_nganh(cleaned).csv";
pub const INDUSTRY_INDEX_FILE: &str = "Chỉ_số_ngành.csv";
pub const CLOSE_PRICE_FILE: &str = "FT2325.csv";

/// Sheet values are in millions of VND; the wide record carries billions
const SHEET_UNIT_DIVISOR: f64 = 1000.0;

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("file not found: {0}")]
    MissingFile(PathBuf),
    #[error("column '{column}' missing in {file}")]
    MissingColumn { file: PathBuf, column: String },
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A CSV sheet with trimmed headers
struct Sheet {
    path: PathBuf,
    headers: Vec<String>,
    rows: Vec<StringRecord>,
}

impl Sheet {
    fn read(path: &Path) -> Result<Self, SheetError> {
        if !path.exists() {
            return Err(SheetError::MissingFile(path.to_path_buf()));
        }
        let mut reader = ReaderBuilder::new().flexible(true).from_path(path)?;
        let headers = reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();
        let rows = reader.records().collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            path: path.to_path_buf(),
            headers,
            rows,
        })
    }

    fn column(&self, name: &str) -> Result<usize, SheetError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| SheetError::MissingColumn {
                file: self.path.clone(),
                column: name.to_string(),
            })
    }

    /// Case-insensitive header lookup
    fn column_ignore_case(&self, name: &str) -> Result<usize, SheetError> {
        let wanted = name.trim().to_uppercase();
        self.headers
            .iter()
            .position(|h| h.to_uppercase() == wanted)
            .ok_or_else(|| SheetError::MissingColumn {
                file: self.path.clone(),
                column: name.to_string(),
            })
    }

    fn value<'a>(&self, row: &'a StringRecord, column: usize) -> &'a str {
        row.get(column).unwrap_or_default().trim()
    }
}

/// Reads the local statement workbooks and reference sheets.
///
/// Layout under `data_dir`:
/// `data_CĐKT/data1_CĐKT.csv` .. `data5_CĐKT.csv` (likewise `data_KQKD`, `data_LCTT`),
/// plus the classification, industry index and close-price sheets at the top level.
pub struct SheetService {
    data_dir: PathBuf,
    logger: Logger,
}

impl SheetService {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            logger: Logger::new("SHEETS"),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Merge the ticker's row from every era sheet of one statement workbook.
    ///
    /// The first sheet that has the ticker contributes bare column names; a later
    /// sheet's column that collides gets the `_<sheet>` suffix. Numeric cells are
    /// divided by 1000. Returns an empty record when no sheet has the ticker.
    pub fn load_wide_record(&self, kind: StatementKind, ticker: &str) -> Result<WideRecord, SheetError> {
        let workbook = self.data_dir.join(kind.workbook_name());
        if !workbook.is_dir() {
            return Err(SheetError::MissingFile(workbook));
        }
        let timer = Timer::start(&format!("{} {} load", ticker, kind));
        let wanted: Vec<&str> = std::iter::once(TICKER_COLUMN)
            .chain(kind.line_items().iter().copied())
            .collect();

        let mut record = WideRecord::new();
        for sheet_name in kind.sheet_names() {
            let path = workbook.join(format!("{}.csv", sheet_name));
            let sheet = match Sheet::read(&path) {
                Ok(sheet) => sheet,
                Err(e) => {
                    self.logger.warn_with_error(&format!("Skipping sheet {}", sheet_name), &e);
                    continue;
                }
            };
            let ticker_col = match sheet.column(TICKER_COLUMN) {
                Ok(col) => col,
                Err(e) => {
                    self.logger.warn_with_error(&format!("Skipping sheet {}", sheet_name), &e);
                    continue;
                }
            };
            let Some(row) = sheet.rows.iter().find(|row| sheet.value(row, ticker_col) == ticker) else {
                continue;
            };

            for name in &wanted {
                let Ok(col) = sheet.column(name) else {
                    continue;
                };
                let raw = CellValue::from_raw(sheet.value(row, col));
                let cell = match raw.as_number() {
                    Some(value) if *name != TICKER_COLUMN => CellValue::Number(value / SHEET_UNIT_DIVISOR),
                    _ => raw,
                };
                if *name == TICKER_COLUMN {
                    if !record.contains(TICKER_COLUMN) {
                        record.insert(TICKER_COLUMN, cell);
                    }
                } else if record.contains(name) {
                    record.insert(format!("{}_{}", name, sheet_name), cell);
                } else {
                    record.insert(*name, cell);
                }
            }
        }

        if record.is_empty() {
            self.logger.info(&format!("ℹ️ No {} rows for {}", kind, ticker));
        }
        timer.log_elapsed("SHEETS");
        Ok(record)
    }

    /// Industry classification row for the ticker, `None` when absent
    pub fn industry_classification(&self, ticker: &str) -> Result<Option<IndustryClassification>, SheetError> {
        let sheet = Sheet::read(&self.data_dir.join(CLASSIFICATION_FILE))?;
        let ticker_col = sheet.column(TICKER_COLUMN)?;
        let Some(row) = sheet
            .rows
            .iter()
            .find(|row| sheet.value(row, ticker_col).eq_ignore_ascii_case(ticker))
        else {
            self.logger.info(&format!("ℹ️ No industry classification for {}", ticker));
            return Ok(None);
        };
        Ok(Some(Self::classification_from_row(&sheet, row)?))
    }

    fn classification_from_row(sheet: &Sheet, row: &StringRecord) -> Result<IndustryClassification, SheetError> {
        let field = |name: &str| -> Result<String, SheetError> {
            Ok(sheet.value(row, sheet.column(name)?).to_string())
        };
        Ok(IndustryClassification {
            ticker: field(TICKER_COLUMN)?.to_uppercase(),
            company_name: field("Tên công ty")?,
            exchange: field("Sàn")?,
            icb_level1: field("Ngành ICB - cấp 1")?,
            icb_level2: field("Ngành ICB - cấp 2")?,
            icb_level3: field("Ngành ICB - cấp 3")?,
            icb_level4: field("Ngành ICB - cấp 4")?,
        })
    }

    /// Tickers whose code or company name starts with `prefix`
    pub fn search_tickers(&self, prefix: &str) -> Result<Vec<IndustryClassification>, SheetError> {
        let sheet = Sheet::read(&self.data_dir.join(CLASSIFICATION_FILE))?;
        let wanted = normalize_key(prefix);
        let mut matches = Vec::new();
        for row in &sheet.rows {
            let entry = Self::classification_from_row(&sheet, row)?;
            if normalize_key(&entry.ticker).starts_with(&wanted)
                || normalize_key(&entry.company_name).starts_with(&wanted)
            {
                matches.push(entry);
            }
        }
        Ok(matches)
    }

    /// Industry P/E and P/B, matching the industry name without accents or case
    pub fn industry_multiples(&self, industry: &str) -> Result<Option<IndustryMultiples>, SheetError> {
        let sheet = Sheet::read(&self.data_dir.join(INDUSTRY_INDEX_FILE))?;
        let name_col = sheet.column_ignore_case("Ngành")?;
        let pe_col = sheet.column_ignore_case("P/E ngành")?;
        let pb_col = sheet.column_ignore_case("P/B ngành")?;

        let wanted = normalize_key(industry);
        let Some(row) = sheet
            .rows
            .iter()
            .find(|row| normalize_key(sheet.value(row, name_col)) == wanted)
        else {
            self.logger.info(&format!("ℹ️ No industry index row for '{}'", industry));
            return Ok(None);
        };

        match (
            parse_decimal_comma(sheet.value(row, pe_col)),
            parse_decimal_comma(sheet.value(row, pb_col)),
        ) {
            (Some(pe), Some(pb)) => Ok(Some(IndustryMultiples { pe, pb })),
            _ => {
                self.logger.warn(&format!("⚠️ Unparsable P/E or P/B for industry '{}'", industry));
                Ok(None)
            }
        }
    }

    /// Daily closes for the ticker within `[start, end]`, sorted by date
    pub fn close_prices(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<PricePoint>, SheetError> {
        let sheet = Sheet::read(&self.data_dir.join(CLOSE_PRICE_FILE))?;
        let ticker_col = sheet.column("Ticker")?;
        let date_col = sheet.column("Date")?;
        let close_col = sheet.column("Close")?;

        let points: Vec<PricePoint> = sheet
            .rows
            .iter()
            .filter(|row| sheet.value(row, ticker_col) == ticker)
            .filter_map(|row| {
                let date = parse_sheet_date(sheet.value(row, date_col)).ok()?;
                let close = parse_number(sheet.value(row, close_col))?;
                Some(PricePoint::close_only(ticker, date, close))
            })
            .collect();

        let points = PricePoint::filter_by_dates(points, start, end);
        if points.is_empty() {
            self.logger.info(&format!(
                "ℹ️ No closes for {} between {} and {}",
                ticker, start, end
            ));
        }
        Ok(points)
    }
}
