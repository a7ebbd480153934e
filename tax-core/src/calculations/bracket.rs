//! Progressive bracket tax evaluation.
//!
//! Tax on chargeable income `c` in bracket `i` is
//! `base_tax[i] + (c - min_income[i]) × tax_rate[i]`, rounded half-up to
//! two decimal places. Brackets are half-open, so an income exactly on a
//! boundary is taxed by the bracket that starts there.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::BracketSchedule;
//! use tax_core::calculations::BracketTaxEvaluator;
//!
//! let schedule = BracketSchedule::ya2024();
//! let evaluator = BracketTaxEvaluator::new(&schedule);
//!
//! assert_eq!(evaluator.compute_tax(dec!(55000), dec!(9000)).unwrap(), dec!(1260.00));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::calculations::common::{non_negative, round_half_up};
use crate::calculations::input::{ValidationError, ensure_non_negative};
use crate::models::BracketSchedule;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BracketError {
    /// No bracket covers the chargeable income. Cannot happen with a
    /// validated schedule; kept so lookups never panic.
    #[error("no tax bracket found for chargeable income {0}")]
    NoMatchingBracket(Decimal),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// The figures behind one tax computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxComputation {
    pub gross_income: Decimal,
    pub total_relief: Decimal,
    pub chargeable_income: Decimal,
    /// `None` when chargeable income is zero and no bracket was consulted.
    pub bracket_index: Option<usize>,
    pub tax_payable: Decimal,
}

#[derive(Debug, Clone)]
pub struct BracketTaxEvaluator<'a> {
    schedule: &'a BracketSchedule,
}

impl<'a> BracketTaxEvaluator<'a> {
    pub fn new(schedule: &'a BracketSchedule) -> Self {
        Self { schedule }
    }

    pub fn schedule(&self) -> &BracketSchedule {
        self.schedule
    }

    /// Tax payable on `gross_income` after `total_relief`.
    ///
    /// # Errors
    ///
    /// Returns [`BracketError::Validation`] if either input is negative.
    pub fn compute_tax(
        &self,
        gross_income: Decimal,
        total_relief: Decimal,
    ) -> Result<Decimal, BracketError> {
        self.evaluate(gross_income, total_relief)
            .map(|c| c.tax_payable)
    }

    /// Like [`compute_tax`](Self::compute_tax), returning the intermediate
    /// figures as well.
    pub fn evaluate(
        &self,
        gross_income: Decimal,
        total_relief: Decimal,
    ) -> Result<TaxComputation, BracketError> {
        let gross_income = ensure_non_negative("annual_income", gross_income)?;
        let total_relief = ensure_non_negative("tax_relief", total_relief)?;
        let chargeable_income = non_negative(gross_income - total_relief);

        let (bracket_index, tax_payable) = if chargeable_income.is_zero() {
            (None, Decimal::ZERO)
        } else {
            let (index, tax) = self.tax_on(chargeable_income)?;
            (Some(index), tax)
        };

        Ok(TaxComputation {
            gross_income,
            total_relief,
            chargeable_income,
            bracket_index,
            tax_payable: round_half_up(tax_payable),
        })
    }

    fn tax_on(
        &self,
        chargeable_income: Decimal,
    ) -> Result<(usize, Decimal), BracketError> {
        let (index, bracket) = self
            .schedule
            .find(chargeable_income)
            .ok_or(BracketError::NoMatchingBracket(chargeable_income))?;

        let marginal_income = chargeable_income - bracket.min_income;
        let tax = bracket.base_tax + (marginal_income * bracket.tax_rate);

        debug!(
            chargeable_income = %chargeable_income,
            bracket = index,
            rate = %bracket.tax_rate,
            tax = %tax,
            "bracket selected"
        );

        Ok((index, tax))
    }
}
