use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;
use tax_core::{
    BracketSchedule, DEFAULT_CHILD_SLOT_LIMIT, ReliefCategory, ReliefLimits, ScheduleError,
    TaxBracket, TaxYearConfig, YearMismatch,
};
use thiserror::Error;

/// Row key in a relief file that sets the size of the child-slot pool.
pub const CHILD_SLOTS_KEY: &str = "child_slots";

/// Errors that can occur when loading tax-year tables.
#[derive(Debug, Error)]
pub enum TaxDataError {
    #[error("cannot open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("{kind} file has no rows")]
    Empty { kind: &'static str },

    #[error("{kind} file mixes years of assessment {first} and {found}")]
    MixedYears {
        kind: &'static str,
        first: i32,
        found: i32,
    },

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(#[from] ScheduleError),

    #[error("Unknown relief category '{0}'")]
    UnknownCategory(String),

    #[error("Relief category '{0}' appears more than once")]
    DuplicateCategory(String),

    #[error("Relief amount for '{category}' is negative: {amount}")]
    NegativeAmount { category: String, amount: Decimal },

    #[error("child_slots must be a whole number, got {0}")]
    InvalidChildSlots(Decimal),

    #[error(transparent)]
    YearMismatch(#[from] YearMismatch),
}

impl From<csv::Error> for TaxDataError {
    fn from(err: csv::Error) -> Self {
        TaxDataError::CsvParse(err.to_string())
    }
}

/// A single row from a bracket schedule CSV file.
///
/// - `year_of_assessment`: e.g. 2024
/// - `min_income`: lower bound of the bracket, inclusive
/// - `max_income`: upper bound, exclusive (empty for the top bracket)
/// - `base_tax`: tax owed on all income below `min_income`
/// - `rate`: marginal rate as a fraction (e.g. 0.06 for 6%)
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TaxBracketRecord {
    pub year_of_assessment: i32,
    #[serde(deserialize_with = "rust_decimal::serde::str::deserialize")]
    pub min_income: Decimal,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub max_income: Option<Decimal>,
    #[serde(deserialize_with = "rust_decimal::serde::str::deserialize")]
    pub base_tax: Decimal,
    #[serde(deserialize_with = "rust_decimal::serde::str::deserialize")]
    pub rate: Decimal,
}

/// A single row from a relief limits CSV file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ReliefLimitRecord {
    pub year_of_assessment: i32,
    pub category: String,
    #[serde(deserialize_with = "rust_decimal::serde::str::deserialize")]
    pub amount: Decimal,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

fn read_records<R, T>(reader: R) -> Result<Vec<T>, TaxDataError>
where
    R: Read,
    T: for<'de> Deserialize<'de>,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(reader);
    let mut records = Vec::new();

    for result in csv_reader.deserialize() {
        records.push(result?);
    }

    Ok(records)
}

/// The single year shared by every row, or an error if rows disagree.
fn single_year(
    kind: &'static str,
    years: impl IntoIterator<Item = i32>,
) -> Result<i32, TaxDataError> {
    let mut years = years.into_iter();
    let first = years.next().ok_or(TaxDataError::Empty { kind })?;

    match years.find(|&y| y != first) {
        Some(found) => Err(TaxDataError::MixedYears { kind, first, found }),
        None => Ok(first),
    }
}

/// Loader for bracket schedules.
pub struct TaxBracketLoader;

impl TaxBracketLoader {
    /// Parse bracket rows from any reader, such as a file or a byte slice.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<TaxBracketRecord>, TaxDataError> {
        read_records(reader)
    }

    /// Build a validated schedule from parsed rows, kept in file order.
    pub fn build(records: &[TaxBracketRecord]) -> Result<BracketSchedule, TaxDataError> {
        let year = single_year("bracket", records.iter().map(|r| r.year_of_assessment))?;

        let brackets = records
            .iter()
            .map(|r| TaxBracket {
                min_income: r.min_income,
                max_income: r.max_income,
                tax_rate: r.rate,
                base_tax: r.base_tax,
            })
            .collect();

        Ok(BracketSchedule::new(year, brackets)?)
    }

    pub fn load<R: Read>(reader: R) -> Result<BracketSchedule, TaxDataError> {
        Self::build(&Self::parse(reader)?)
    }

    pub fn load_path(path: &Path) -> Result<BracketSchedule, TaxDataError> {
        Self::load(open(path)?)
    }
}

/// Loader for relief limit tables.
pub struct ReliefLimitsLoader;

impl ReliefLimitsLoader {
    pub fn parse<R: Read>(reader: R) -> Result<Vec<ReliefLimitRecord>, TaxDataError> {
        read_records(reader)
    }

    /// Build a limits table from parsed rows.
    ///
    /// Categories not listed are absent from the table. A `child_slots` row
    /// sets the pool size, which otherwise defaults to
    /// [`DEFAULT_CHILD_SLOT_LIMIT`].
    pub fn build(records: &[ReliefLimitRecord]) -> Result<ReliefLimits, TaxDataError> {
        let year = single_year("relief", records.iter().map(|r| r.year_of_assessment))?;
        let mut amounts = BTreeMap::new();
        let mut child_slot_limit = None;

        for record in records {
            if record.category.trim().eq_ignore_ascii_case(CHILD_SLOTS_KEY) {
                if child_slot_limit.is_some() {
                    return Err(TaxDataError::DuplicateCategory(CHILD_SLOTS_KEY.to_string()));
                }
                child_slot_limit = Some(child_slots(record.amount)?);
                continue;
            }

            let category = ReliefCategory::parse(&record.category)
                .ok_or_else(|| TaxDataError::UnknownCategory(record.category.clone()))?;

            if record.amount < Decimal::ZERO {
                return Err(TaxDataError::NegativeAmount {
                    category: record.category.clone(),
                    amount: record.amount,
                });
            }

            if amounts.insert(category, record.amount).is_some() {
                return Err(TaxDataError::DuplicateCategory(
                    category.as_str().to_string(),
                ));
            }
        }

        Ok(ReliefLimits {
            year_of_assessment: year,
            amounts,
            child_slot_limit: child_slot_limit.unwrap_or(DEFAULT_CHILD_SLOT_LIMIT),
        })
    }

    pub fn load<R: Read>(reader: R) -> Result<ReliefLimits, TaxDataError> {
        Self::build(&Self::parse(reader)?)
    }

    pub fn load_path(path: &Path) -> Result<ReliefLimits, TaxDataError> {
        Self::load(open(path)?)
    }
}

fn open(path: &Path) -> Result<File, TaxDataError> {
    File::open(path).map_err(|source| TaxDataError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn child_slots(amount: Decimal) -> Result<u32, TaxDataError> {
    if !amount.fract().is_zero() {
        return Err(TaxDataError::InvalidChildSlots(amount));
    }
    amount
        .to_u32()
        .ok_or(TaxDataError::InvalidChildSlots(amount))
}

/// Load both tables for one year of assessment.
///
/// Either path may be `None`, in which case the built-in YA2024 table is
/// used for that half. The two halves must name the same year.
pub fn load_tax_year(
    brackets: Option<&Path>,
    reliefs: Option<&Path>,
) -> Result<TaxYearConfig, TaxDataError> {
    let schedule = match brackets {
        Some(path) => TaxBracketLoader::load_path(path)?,
        None => BracketSchedule::ya2024(),
    };
    let limits = match reliefs {
        Some(path) => ReliefLimitsLoader::load_path(path)?,
        None => ReliefLimits::ya2024(),
    };

    Ok(TaxYearConfig::new(limits, schedule)?)
}
