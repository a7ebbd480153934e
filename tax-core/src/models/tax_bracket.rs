use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub min_income: Decimal,
    pub max_income: Option<Decimal>,
    pub tax_rate: Decimal,
    pub base_tax: Decimal,
}

impl TaxBracket {
    /// True when `income` falls in `[min_income, max_income)`.
    pub fn contains(
        &self,
        income: Decimal,
    ) -> bool {
        income >= self.min_income && self.max_income.is_none_or(|max| income < max)
    }

    /// Tax owed on income up to this bracket's upper bound, i.e. the base of
    /// the bracket that follows. `None` for the unbounded top bracket.
    pub fn tax_at_upper_bound(&self) -> Option<Decimal> {
        self.max_income
            .map(|max| self.base_tax + (max - self.min_income) * self.tax_rate)
    }
}

/// Reasons a bracket list cannot form a schedule.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("schedule has no brackets")]
    Empty,

    #[error("first bracket must start at 0, starts at {0}")]
    FirstBracketNotZero(Decimal),

    #[error("bracket {index} starts at {found}, expected {expected}")]
    Gap {
        index: usize,
        expected: Decimal,
        found: Decimal,
    },

    #[error("bracket {index} has upper bound {max} not above lower bound {min}")]
    EmptyRange {
        index: usize,
        min: Decimal,
        max: Decimal,
    },

    #[error("only the last bracket may be unbounded (bracket {0})")]
    UnboundedBeforeEnd(usize),

    #[error("last bracket must be unbounded")]
    BoundedTop,

    #[error("bracket {index} rate {rate} is outside [0, 1]")]
    RateOutOfRange { index: usize, rate: Decimal },

    #[error("bracket {index} rate {rate} is lower than the previous rate {previous}")]
    DecreasingRate {
        index: usize,
        rate: Decimal,
        previous: Decimal,
    },

    #[error("bracket {index} base tax is {found}, expected {expected}")]
    BaseTaxMismatch {
        index: usize,
        expected: Decimal,
        found: Decimal,
    },
}

/// A validated, ordered set of brackets covering `[0, ∞)` for one year of
/// assessment.
///
/// Construction checks that the brackets are contiguous, that rates never
/// decrease, and that every cumulative base equals the tax owed at the upper
/// bound of the bracket before it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BracketSchedule {
    year_of_assessment: i32,
    brackets: Vec<TaxBracket>,
}

impl BracketSchedule {
    pub fn new(
        year_of_assessment: i32,
        brackets: Vec<TaxBracket>,
    ) -> Result<Self, ScheduleError> {
        validate(&brackets)?;
        Ok(Self {
            year_of_assessment,
            brackets,
        })
    }

    /// Chargeable income schedule for year of assessment 2024.
    ///
    /// | Chargeable income (RM) | Rate | Base |
    /// |---|---|---|
    /// | 0 – 5,000 | 0% | 0 |
    /// | 5,000 – 20,000 | 1% | 0 |
    /// | 20,000 – 35,000 | 3% | 150 |
    /// | 35,000 – 50,000 | 6% | 600 |
    /// | 50,000 – 70,000 | 11% | 1,500 |
    /// | 70,000 – 100,000 | 19% | 3,700 |
    /// | 100,000 – 400,000 | 25% | 9,400 |
    /// | 400,000 – 600,000 | 26% | 84,400 |
    /// | 600,000 – 2,000,000 | 28% | 136,400 |
    /// | above 2,000,000 | 30% | 528,400 |
    pub fn ya2024() -> Self {
        // (min, max, rate in percent, base)
        const ROWS: [(i64, Option<i64>, i64, i64); 10] = [
            (0, Some(5_000), 0, 0),
            (5_000, Some(20_000), 1, 0),
            (20_000, Some(35_000), 3, 150),
            (35_000, Some(50_000), 6, 600),
            (50_000, Some(70_000), 11, 1_500),
            (70_000, Some(100_000), 19, 3_700),
            (100_000, Some(400_000), 25, 9_400),
            (400_000, Some(600_000), 26, 84_400),
            (600_000, Some(2_000_000), 28, 136_400),
            (2_000_000, None, 30, 528_400),
        ];

        let brackets = ROWS
            .iter()
            .map(|&(min, max, rate, base)| TaxBracket {
                min_income: Decimal::from(min),
                max_income: max.map(Decimal::from),
                tax_rate: Decimal::new(rate, 2),
                base_tax: Decimal::from(base),
            })
            .collect();

        Self {
            year_of_assessment: 2024,
            brackets,
        }
    }

    pub fn year_of_assessment(&self) -> i32 {
        self.year_of_assessment
    }

    pub fn brackets(&self) -> &[TaxBracket] {
        &self.brackets
    }

    /// Index and bracket containing `income`.
    pub fn find(
        &self,
        income: Decimal,
    ) -> Option<(usize, &TaxBracket)> {
        self.brackets
            .iter()
            .enumerate()
            .find(|(_, b)| b.contains(income))
    }
}

impl Default for BracketSchedule {
    fn default() -> Self {
        Self::ya2024()
    }
}

fn validate(brackets: &[TaxBracket]) -> Result<(), ScheduleError> {
    let first = brackets.first().ok_or(ScheduleError::Empty)?;
    if first.min_income != Decimal::ZERO {
        return Err(ScheduleError::FirstBracketNotZero(first.min_income));
    }

    let last_index = brackets.len() - 1;
    let mut previous: Option<&TaxBracket> = None;

    for (index, bracket) in brackets.iter().enumerate() {
        if bracket.tax_rate < Decimal::ZERO || bracket.tax_rate > Decimal::ONE {
            return Err(ScheduleError::RateOutOfRange {
                index,
                rate: bracket.tax_rate,
            });
        }

        match bracket.max_income {
            Some(max) if max <= bracket.min_income => {
                return Err(ScheduleError::EmptyRange {
                    index,
                    min: bracket.min_income,
                    max,
                });
            }
            None if index != last_index => {
                return Err(ScheduleError::UnboundedBeforeEnd(index));
            }
            _ => {}
        }

        if let Some(prev) = previous {
            // Unbounded brackets were rejected above for every index but the last.
            let expected_min = prev.max_income.unwrap_or(Decimal::MAX);
            if bracket.min_income != expected_min {
                return Err(ScheduleError::Gap {
                    index,
                    expected: expected_min,
                    found: bracket.min_income,
                });
            }

            if bracket.tax_rate < prev.tax_rate {
                return Err(ScheduleError::DecreasingRate {
                    index,
                    rate: bracket.tax_rate,
                    previous: prev.tax_rate,
                });
            }

            let expected_base = prev.tax_at_upper_bound().unwrap_or(Decimal::ZERO);
            if bracket.base_tax != expected_base {
                return Err(ScheduleError::BaseTaxMismatch {
                    index,
                    expected: expected_base,
                    found: bracket.base_tax,
                });
            }
        } else if bracket.base_tax != Decimal::ZERO {
            return Err(ScheduleError::BaseTaxMismatch {
                index,
                expected: Decimal::ZERO,
                found: bracket.base_tax,
            });
        }

        previous = Some(bracket);
    }

    if brackets[last_index].max_income.is_some() {
        return Err(ScheduleError::BoundedTop);
    }

    Ok(())
}
