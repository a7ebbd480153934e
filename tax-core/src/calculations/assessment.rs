//! Income plus relief claims in, tax payable out.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::calculations::bracket::{BracketError, BracketTaxEvaluator};
use crate::calculations::input::{ValidationError, parse_amount};
use crate::calculations::relief::{ReliefAggregator, ReliefBreakdown, ReliefClaim, ReliefError};
use crate::models::{TaxRecord, TaxYearConfig};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssessmentError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Relief(#[from] ReliefError),

    #[error(transparent)]
    Bracket(#[from] BracketError),
}

impl AssessmentError {
    /// The offending input, when the failure was a rejected value.
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(e)
            | Self::Relief(ReliefError::Validation(e))
            | Self::Bracket(BracketError::Validation(e)) => Some(e),
            _ => None,
        }
    }
}

/// The outcome of assessing one year's income.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessment {
    pub year_of_assessment: i32,
    pub gross_income: Decimal,
    pub total_relief: Decimal,
    pub chargeable_income: Decimal,
    pub tax_payable: Decimal,
    pub breakdown: ReliefBreakdown,
}

impl Assessment {
    /// Overwrites the record's income, relief and tax with this assessment.
    pub fn apply_to(
        &self,
        record: &mut TaxRecord,
    ) {
        record.set_figures(self.gross_income, self.total_relief, self.tax_payable);
    }
}

/// Runs relief aggregation and bracket evaluation for one tax year.
#[derive(Debug, Clone)]
pub struct TaxAssessor<'a> {
    config: &'a TaxYearConfig,
}

impl<'a> TaxAssessor<'a> {
    pub fn new(config: &'a TaxYearConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TaxYearConfig {
        self.config
    }

    pub fn assess(
        &self,
        gross_income: Decimal,
        claims: &[ReliefClaim],
    ) -> Result<Assessment, AssessmentError> {
        let breakdown = ReliefAggregator::new(self.config.relief_limits()).aggregate(claims)?;
        let computation = BracketTaxEvaluator::new(self.config.schedule())
            .evaluate(gross_income, breakdown.total)?;

        info!(
            year = self.config.year_of_assessment(),
            gross_income = %computation.gross_income,
            total_relief = %computation.total_relief,
            tax_payable = %computation.tax_payable,
            "assessment complete"
        );

        Ok(Assessment {
            year_of_assessment: self.config.year_of_assessment(),
            gross_income: computation.gross_income,
            total_relief: computation.total_relief,
            chargeable_income: computation.chargeable_income,
            tax_payable: computation.tax_payable,
            breakdown,
        })
    }

    /// [`assess`](Self::assess) with the income still in its entered form.
    pub fn assess_raw(
        &self,
        gross_income: &str,
        claims: &[ReliefClaim],
    ) -> Result<Assessment, AssessmentError> {
        let gross_income = parse_amount("annual_income", gross_income)?;
        self.assess(gross_income, claims)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::IcNumber;
    use crate::models::ReliefCategory::*;

    #[test]
    fn assess_combines_relief_and_brackets() {
        let config = TaxYearConfig::ya2024();
        let assessor = TaxAssessor::new(&config);

        let assessment = assessor
            .assess(dec!(55000), &[ReliefClaim::new(Individual, "9000")])
            .unwrap();

        assert_eq!(assessment.year_of_assessment, 2024);
        assert_eq!(assessment.total_relief, dec!(9000));
        assert_eq!(assessment.chargeable_income, dec!(46000));
        assert_eq!(assessment.tax_payable, dec!(1260.00));
    }

    #[test]
    fn assess_raw_parses_income() {
        let config = TaxYearConfig::ya2024();
        let assessor = TaxAssessor::new(&config);

        let assessment = assessor.assess_raw("70,000", &[]).unwrap();

        assert_eq!(assessment.tax_payable, dec!(3700.00));
    }

    #[test]
    fn assess_raw_rejects_bad_income() {
        let config = TaxYearConfig::ya2024();
        let assessor = TaxAssessor::new(&config);

        let err = assessor.assess_raw("seventy", &[]).unwrap_err();

        assert_eq!(err.validation().map(|e| e.field.as_str()), Some("annual_income"));
    }

    #[test]
    fn relief_validation_is_reachable_through_assessment_error() {
        let config = TaxYearConfig::ya2024();
        let assessor = TaxAssessor::new(&config);

        let err = assessor
            .assess(dec!(50000), &[ReliefClaim::new(Education, "-10")])
            .unwrap_err();

        assert_eq!(err.validation().map(|e| e.field.as_str()), Some("education"));
    }

    #[test]
    fn apply_to_overwrites_figures() {
        let config = TaxYearConfig::ya2024();
        let assessor = TaxAssessor::new(&config);
        let mut record = TaxRecord::register("alice", IcNumber::parse("900101145678").unwrap());
        record.set_figures(dec!(1), dec!(2), dec!(3));

        assessor
            .assess(dec!(70000), &[])
            .unwrap()
            .apply_to(&mut record);

        assert_eq!(record.annual_income, dec!(70000));
        assert_eq!(record.tax_relief, dec!(0));
        assert_eq!(record.tax_payable, dec!(3700.00));
    }
}
