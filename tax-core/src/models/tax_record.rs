use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::IcNumber;

/// A user's stored tax position, one row per user.
///
/// Serialized column names are `id, national_identifier, gross_income,
/// total_relief, tax_payable`. The legacy headers `user_id, ic_number,
/// annual_income, tax_relief` are accepted when reading. Money columns are
/// read as text so no amount passes through a float.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRecord {
    #[serde(rename = "id", alias = "user_id")]
    pub user_id: String,

    #[serde(rename = "national_identifier", alias = "ic_number")]
    pub ic_number: IcNumber,

    #[serde(rename = "gross_income", alias = "annual_income", with = "rust_decimal::serde::str")]
    pub annual_income: Decimal,

    #[serde(rename = "total_relief", alias = "tax_relief", with = "rust_decimal::serde::str")]
    pub tax_relief: Decimal,

    #[serde(with = "rust_decimal::serde::str")]
    pub tax_payable: Decimal,
}

impl TaxRecord {
    /// A freshly registered record with every financial field at zero.
    pub fn register(
        user_id: impl Into<String>,
        ic_number: IcNumber,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            ic_number,
            annual_income: Decimal::ZERO,
            tax_relief: Decimal::ZERO,
            tax_payable: Decimal::ZERO,
        }
    }

    /// Overwrites the financial fields with a new computation.
    pub fn set_figures(
        &mut self,
        annual_income: Decimal,
        tax_relief: Decimal,
        tax_payable: Decimal,
    ) {
        self.annual_income = annual_income;
        self.tax_relief = tax_relief;
        self.tax_payable = tax_payable;
    }

    /// Gross income less relief, floored at zero.
    pub fn chargeable_income(&self) -> Decimal {
        (self.annual_income - self.tax_relief).max(Decimal::ZERO)
    }
}
