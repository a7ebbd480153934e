use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ReliefCategory;

/// Number of children that may be claimed across the pooled child categories.
pub const DEFAULT_CHILD_SLOT_LIMIT: u32 = 12;

/// Statutory relief amounts for one year of assessment.
///
/// For flat categories the amount is the cap on the claim; for per-unit
/// categories it is the relief granted per child.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReliefLimits {
    pub year_of_assessment: i32,
    pub amounts: BTreeMap<ReliefCategory, Decimal>,
    pub child_slot_limit: u32,
}

impl ReliefLimits {
    /// Relief amounts for year of assessment 2024.
    pub fn ya2024() -> Self {
        let amounts = [
            (ReliefCategory::Individual, 9_000),
            (ReliefCategory::IndividualDisabled, 6_000),
            (ReliefCategory::Spouse, 4_000),
            (ReliefCategory::SpouseDisabled, 5_000),
            (ReliefCategory::ChildUnder18, 2_000),
            (ReliefCategory::ChildOver18Diploma, 8_000),
            (ReliefCategory::DisabledChild, 6_000),
            (ReliefCategory::DisabledChildDiploma, 8_000),
            (ReliefCategory::Medical, 10_000),
            (ReliefCategory::ParentalMedical, 8_000),
            (ReliefCategory::Education, 7_000),
            (ReliefCategory::Lifestyle, 2_500),
            (ReliefCategory::Sspn, 8_000),
            (ReliefCategory::Breastfeeding, 1_000),
            (ReliefCategory::Childcare, 3_000),
        ]
        .into_iter()
        .map(|(category, amount)| (category, Decimal::from(amount)))
        .collect();

        Self {
            year_of_assessment: 2024,
            amounts,
            child_slot_limit: DEFAULT_CHILD_SLOT_LIMIT,
        }
    }

    /// The configured amount for `category`, if the table has one.
    pub fn amount(
        &self,
        category: ReliefCategory,
    ) -> Option<Decimal> {
        self.amounts.get(&category).copied()
    }
}

impl Default for ReliefLimits {
    fn default() -> Self {
        Self::ya2024()
    }
}
