//! Relief aggregation.
//!
//! Turns a list of categorized relief claims into capped breakdown lines and
//! a total, using the caps in a [`ReliefLimits`] table.
//!
//! # Rules
//!
//! | Category kind | Result |
//! |---|---|
//! | Flat | `min(max(claimed, 0), cap)` |
//! | Pooled child | `min(units, remaining slots) × per-unit amount` |
//! | Disabled child | `units × per-unit amount`, no slot limit |
//!
//! - `individual` and `individual_disabled` are reported as one combined
//!   `Individual (Disabled)` line.
//! - `spouse_disabled` is a separate line added on top of `spouse`.
//! - Under-18 children draw from the slot pool before over-18 diploma
//!   children, whatever order the claims arrive in.
//! - Lines that come to zero are left out of the breakdown.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::ReliefLimits;
//! use tax_core::calculations::{ReliefAggregator, ReliefClaim};
//! use tax_core::ReliefCategory::*;
//!
//! let limits = ReliefLimits::ya2024();
//! let aggregator = ReliefAggregator::new(&limits);
//!
//! let breakdown = aggregator
//!     .aggregate(&[
//!         ReliefClaim::new(Individual, "9000"),
//!         ReliefClaim::new(Medical, "12000"),
//!         ReliefClaim::new(ChildUnder18, "2"),
//!     ])
//!     .unwrap();
//!
//! // 9,000 + 10,000 (capped) + 2 × 2,000
//! assert_eq!(breakdown.total, dec!(23000));
//! assert!(breakdown.line(Medical).unwrap().capped);
//! ```

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::calculations::common::clamp_to_cap;
use crate::calculations::input::{ValidationError, parse_amount, parse_units};
use crate::models::{ReliefCategory, ReliefKind, ReliefLimits};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReliefError {
    /// A claimed value could not be parsed; the caller should collect it again.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The category key is not known, or the limits table has no amount for it.
    #[error("unknown relief category '{0}'")]
    UnknownCategory(String),
}

/// One claimed relief, before parsing or capping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReliefClaim {
    pub category: ReliefCategory,
    /// Amount in ringgit for flat categories, child count for per-unit ones.
    pub raw_value: String,
}

impl ReliefClaim {
    pub fn new(
        category: ReliefCategory,
        raw_value: impl Into<String>,
    ) -> Self {
        Self {
            category,
            raw_value: raw_value.into(),
        }
    }

    /// Builds a claim from a category key such as `"medical"`.
    pub fn from_parts(
        category: &str,
        raw_value: impl Into<String>,
    ) -> Result<Self, ReliefError> {
        let category = ReliefCategory::parse(category)
            .ok_or_else(|| ReliefError::UnknownCategory(category.to_string()))?;
        Ok(Self::new(category, raw_value))
    }
}

/// One line of the relief breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReliefLine {
    pub category: ReliefCategory,
    pub label: String,
    /// Units granted, for per-unit categories.
    pub units: Option<u32>,
    /// What the claim asked for before capping.
    pub requested: Decimal,
    pub amount: Decimal,
    /// Set when the cap or the child-slot pool cut the claim down.
    pub capped: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReliefBreakdown {
    pub lines: Vec<ReliefLine>,
    pub total: Decimal,
    pub child_slots_remaining: u32,
}

impl ReliefBreakdown {
    /// The line a category was reported under. The combined individual line
    /// is found under [`ReliefCategory::Individual`].
    pub fn line(
        &self,
        category: ReliefCategory,
    ) -> Option<&ReliefLine> {
        self.lines.iter().find(|l| l.category == category)
    }

    pub fn amount_for(
        &self,
        category: ReliefCategory,
    ) -> Decimal {
        self.line(category).map_or(Decimal::ZERO, |l| l.amount)
    }

    /// `(label, amount)` pairs in breakdown order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, Decimal)> + '_ {
        self.lines.iter().map(|l| (l.label.as_str(), l.amount))
    }

    pub fn any_capped(&self) -> bool {
        self.lines.iter().any(|l| l.capped)
    }
}

/// Shared pool of child slots for the pooled child categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildSlotPool {
    remaining: u32,
}

impl ChildSlotPool {
    pub fn new(limit: u32) -> Self {
        Self { remaining: limit }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Takes up to `requested` slots and returns how many were granted.
    pub fn take(
        &mut self,
        requested: u32,
    ) -> u32 {
        let granted = requested.min(self.remaining);
        self.remaining -= granted;
        granted
    }
}

/// Parsed claim values, summed per category.
#[derive(Debug, Default)]
struct ParsedClaims {
    amounts: BTreeMap<ReliefCategory, Decimal>,
    units: BTreeMap<ReliefCategory, u32>,
}

impl ParsedClaims {
    fn amount(
        &self,
        category: ReliefCategory,
    ) -> Decimal {
        self.amounts.get(&category).copied().unwrap_or(Decimal::ZERO)
    }

    fn units(
        &self,
        category: ReliefCategory,
    ) -> u32 {
        self.units.get(&category).copied().unwrap_or(0)
    }
}

/// Aggregates relief claims against a fixed limits table.
///
/// Holds no state between calls; the child-slot pool is created fresh for
/// every [`aggregate`](Self::aggregate).
#[derive(Debug, Clone)]
pub struct ReliefAggregator<'a> {
    limits: &'a ReliefLimits,
}

impl<'a> ReliefAggregator<'a> {
    pub fn new(limits: &'a ReliefLimits) -> Self {
        Self { limits }
    }

    /// Parses, caps and totals `claims`.
    ///
    /// # Errors
    ///
    /// - [`ReliefError::Validation`] for the first claim whose value is not a
    ///   non-negative number (or whole number, for child counts).
    /// - [`ReliefError::UnknownCategory`] when the limits table has no amount
    ///   for a claimed category.
    pub fn aggregate(
        &self,
        claims: &[ReliefClaim],
    ) -> Result<ReliefBreakdown, ReliefError> {
        let parsed = self.parse_claims(claims)?;
        let mut pool = ChildSlotPool::new(self.limits.child_slot_limit);
        let mut lines = Vec::new();

        lines.extend(self.individual_line(&parsed)?);

        for category in ReliefCategory::ALL {
            if matches!(
                category,
                ReliefCategory::Individual | ReliefCategory::IndividualDisabled
            ) || !parsed_contains(&parsed, category)
            {
                continue;
            }

            let line = match category.kind() {
                ReliefKind::Flat => self.flat_line(category, parsed.amount(category))?,
                ReliefKind::PerUnit { pooled } => {
                    let requested = parsed.units(category);
                    let granted = if pooled {
                        pool.take(requested)
                    } else {
                        requested
                    };
                    self.unit_line(category, requested, granted)?
                }
            };

            lines.extend(line);
        }

        let total = lines.iter().map(|l| l.amount).sum();
        debug!(total = %total, lines = lines.len(), "relief aggregated");

        Ok(ReliefBreakdown {
            lines,
            total,
            child_slots_remaining: pool.remaining(),
        })
    }

    fn cap(
        &self,
        category: ReliefCategory,
    ) -> Result<Decimal, ReliefError> {
        self.limits
            .amount(category)
            .ok_or_else(|| ReliefError::UnknownCategory(category.as_str().to_string()))
    }

    fn parse_claims(
        &self,
        claims: &[ReliefClaim],
    ) -> Result<ParsedClaims, ReliefError> {
        let mut parsed = ParsedClaims::default();

        for claim in claims {
            // Surface schema mismatches before any value is looked at.
            self.cap(claim.category)?;
            let field = claim.category.as_str();

            if claim.category.is_per_unit() {
                let units = parse_units(field, &claim.raw_value)?;
                let entry = parsed.units.entry(claim.category).or_default();
                *entry = entry.saturating_add(units);
            } else {
                let amount = parse_amount(field, &claim.raw_value)?;
                let entry = parsed.amounts.entry(claim.category).or_default();
                *entry = entry.saturating_add(amount);
            }
        }

        Ok(parsed)
    }

    /// The individual line, combined with the disabled-individual relief.
    fn individual_line(
        &self,
        parsed: &ParsedClaims,
    ) -> Result<Option<ReliefLine>, ReliefError> {
        // Unclaimed categories may be absent from a partial limits table.
        let claimed_line = |category| {
            if parsed_contains(parsed, category) {
                self.flat_line(category, parsed.amount(category))
            } else {
                Ok(None)
            }
        };
        let base = claimed_line(ReliefCategory::Individual)?;
        let disabled = claimed_line(ReliefCategory::IndividualDisabled)?;

        Ok(match (base, disabled) {
            (base, None) => base,
            (base, Some(disabled)) => {
                let (requested, amount, capped) = match base {
                    Some(b) => (
                        b.requested.saturating_add(disabled.requested),
                        b.amount + disabled.amount,
                        b.capped || disabled.capped,
                    ),
                    None => (disabled.requested, disabled.amount, disabled.capped),
                };
                Some(ReliefLine {
                    category: ReliefCategory::Individual,
                    label: ReliefCategory::IndividualDisabled.label().to_string(),
                    units: None,
                    requested,
                    amount,
                    capped,
                })
            }
        })
    }

    fn flat_line(
        &self,
        category: ReliefCategory,
        requested: Decimal,
    ) -> Result<Option<ReliefLine>, ReliefError> {
        let cap = self.cap(category)?;
        let (amount, capped) = clamp_to_cap(requested, cap);

        if capped {
            warn!(
                category = category.as_str(),
                requested = %requested,
                cap = %cap,
                "relief claim exceeds cap; using cap"
            );
        }

        if amount.is_zero() {
            return Ok(None);
        }

        Ok(Some(ReliefLine {
            category,
            label: category.label().to_string(),
            units: None,
            requested,
            amount,
            capped,
        }))
    }

    fn unit_line(
        &self,
        category: ReliefCategory,
        requested: u32,
        granted: u32,
    ) -> Result<Option<ReliefLine>, ReliefError> {
        let per_unit = self.cap(category)?;
        let capped = granted < requested;

        if capped {
            warn!(
                category = category.as_str(),
                requested,
                granted,
                "child slots exhausted; claim truncated"
            );
        }

        if granted == 0 {
            return Ok(None);
        }

        Ok(Some(ReliefLine {
            category,
            label: format!("{} [{}]", category.label(), granted),
            units: Some(granted),
            requested: per_unit * Decimal::from(requested),
            amount: per_unit * Decimal::from(granted),
            capped,
        }))
    }
}

fn parsed_contains(
    parsed: &ParsedClaims,
    category: ReliefCategory,
) -> bool {
    parsed.amounts.contains_key(&category) || parsed.units.contains_key(&category)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use tracing_subscriber::fmt::format::FmtSpan;

    use super::*;
    use crate::models::ReliefCategory::*;

    fn claim(
        category: ReliefCategory,
        raw: &str,
    ) -> ReliefClaim {
        ReliefClaim::new(category, raw)
    }

    fn aggregate(claims: &[ReliefClaim]) -> Result<ReliefBreakdown, ReliefError> {
        let limits = ReliefLimits::ya2024();
        ReliefAggregator::new(&limits).aggregate(claims)
    }

    /// Initializes tracing subscriber for tests that verify log output.
    fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_span_events(FmtSpan::NONE)
            .with_test_writer()
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    // =========================================================================
    // ChildSlotPool tests
    // =========================================================================

    #[test]
    fn pool_grants_up_to_remaining() {
        let mut pool = ChildSlotPool::new(12);

        assert_eq!(pool.take(10), 10);
        assert_eq!(pool.take(5), 2);
        assert_eq!(pool.take(1), 0);
        assert_eq!(pool.remaining(), 0);
    }

    // =========================================================================
    // ReliefClaim tests
    // =========================================================================

    #[test]
    fn from_parts_parses_category_key() {
        let claim = ReliefClaim::from_parts("parental_medical", "500").unwrap();

        assert_eq!(claim.category, ParentalMedical);
        assert_eq!(claim.raw_value, "500");
    }

    #[test]
    fn from_parts_rejects_unknown_category() {
        assert_eq!(
            ReliefClaim::from_parts("holiday", "500"),
            Err(ReliefError::UnknownCategory("holiday".to_string()))
        );
    }

    // =========================================================================
    // flat category tests
    // =========================================================================

    #[test]
    fn flat_claim_under_cap_is_kept() {
        let breakdown = aggregate(&[claim(Lifestyle, "1800.50")]).unwrap();

        assert_eq!(breakdown.total, dec!(1800.50));
        assert_eq!(breakdown.amount_for(Lifestyle), dec!(1800.50));
        assert!(!breakdown.any_capped());
    }

    #[test]
    fn flat_claim_over_cap_is_clamped_and_flagged() {
        let _guard = init_test_tracing();

        let breakdown = aggregate(&[claim(Medical, "15000")]).unwrap();

        let line = breakdown.line(Medical).unwrap();
        assert_eq!(line.amount, dec!(10000));
        assert_eq!(line.requested, dec!(15000));
        assert!(line.capped);
        assert_eq!(breakdown.total, dec!(10000));
    }

    #[test]
    fn zero_claim_is_absent_from_breakdown() {
        let breakdown = aggregate(&[claim(Education, "0"), claim(Lifestyle, "100")]).unwrap();

        assert_eq!(breakdown.line(Education), None);
        assert_eq!(breakdown.lines.len(), 1);
        assert_eq!(breakdown.total, dec!(100));
    }

    #[test]
    fn repeated_claims_are_summed_before_capping() {
        let breakdown = aggregate(&[claim(Lifestyle, "2000"), claim(Lifestyle, "1000")]).unwrap();

        assert_eq!(breakdown.amount_for(Lifestyle), dec!(2500));
        assert!(breakdown.line(Lifestyle).unwrap().capped);
    }

    #[test]
    fn huge_individual_claims_saturate_then_cap() {
        let max = Decimal::MAX.to_string();

        let breakdown =
            aggregate(&[claim(Individual, &max), claim(IndividualDisabled, &max)]).unwrap();

        assert_eq!(breakdown.amount_for(Individual), dec!(15000));
        assert!(breakdown.line(Individual).unwrap().capped);
    }

    #[test]
    fn huge_repeated_claims_saturate_then_cap() {
        let max = Decimal::MAX.to_string();

        let breakdown = aggregate(&[claim(Medical, &max), claim(Medical, &max)]).unwrap();

        assert_eq!(breakdown.amount_for(Medical), dec!(10000));
        assert_eq!(breakdown.line(Medical).unwrap().requested, Decimal::MAX);
        assert!(breakdown.line(Medical).unwrap().capped);
    }

    #[test]
    fn empty_claims_give_zero_total() {
        let breakdown = aggregate(&[]).unwrap();

        assert_eq!(breakdown.total, Decimal::ZERO);
        assert!(breakdown.lines.is_empty());
        assert_eq!(breakdown.child_slots_remaining, 12);
    }

    // =========================================================================
    // disability compounding tests
    // =========================================================================

    #[test]
    fn disabled_individual_is_one_combined_line() {
        let breakdown =
            aggregate(&[claim(Individual, "9000"), claim(IndividualDisabled, "6000")]).unwrap();

        assert_eq!(breakdown.lines.len(), 1);
        let line = &breakdown.lines[0];
        assert_eq!(line.label, "Individual (Disabled)");
        assert_eq!(line.category, Individual);
        assert_eq!(line.amount, dec!(15000));
    }

    #[test]
    fn individual_without_disability_uses_plain_label() {
        let breakdown = aggregate(&[claim(Individual, "9000")]).unwrap();

        assert_eq!(breakdown.lines[0].label, "Individual");
        assert_eq!(breakdown.total, dec!(9000));
    }

    #[test]
    fn disabled_spouse_adds_on_top_of_spouse() {
        let breakdown =
            aggregate(&[claim(Spouse, "4000"), claim(SpouseDisabled, "5000")]).unwrap();

        assert_eq!(breakdown.amount_for(Spouse), dec!(4000));
        assert_eq!(breakdown.amount_for(SpouseDisabled), dec!(5000));
        assert_eq!(breakdown.total, dec!(9000));
    }

    #[test]
    fn disabled_household_with_three_young_children() {
        let breakdown = aggregate(&[
            claim(Individual, "9000"),
            claim(IndividualDisabled, "6000"),
            claim(SpouseDisabled, "5000"),
            claim(ChildUnder18, "3"),
        ])
        .unwrap();

        // (9,000 + 6,000) + 5,000 + 3 × 2,000
        assert_eq!(breakdown.total, dec!(26000));
        assert_eq!(
            breakdown.entries().collect::<Vec<_>>(),
            vec![
                ("Individual (Disabled)", dec!(15000)),
                ("Spouse (Disabled)", dec!(5000)),
                ("Children (<18) [3]", dec!(6000)),
            ]
        );
    }

    // =========================================================================
    // child pool tests
    // =========================================================================

    #[test]
    fn over_18_claims_are_truncated_to_remaining_slots() {
        let _guard = init_test_tracing();

        let breakdown =
            aggregate(&[claim(ChildUnder18, "10"), claim(ChildOver18Diploma, "5")]).unwrap();

        let under = breakdown.line(ChildUnder18).unwrap();
        let over = breakdown.line(ChildOver18Diploma).unwrap();
        assert_eq!(under.units, Some(10));
        assert_eq!(over.units, Some(2));
        assert_eq!(over.amount, dec!(16000));
        assert!(over.capped);
        assert_eq!(breakdown.child_slots_remaining, 0);
    }

    #[test]
    fn under_18_claims_take_priority_regardless_of_order() {
        let breakdown =
            aggregate(&[claim(ChildOver18Diploma, "12"), claim(ChildUnder18, "4")]).unwrap();

        assert_eq!(breakdown.line(ChildUnder18).unwrap().units, Some(4));
        assert_eq!(breakdown.line(ChildOver18Diploma).unwrap().units, Some(8));
    }

    #[test]
    fn under_18_claims_alone_are_capped_at_pool_size() {
        let breakdown = aggregate(&[claim(ChildUnder18, "15")]).unwrap();

        let line = breakdown.line(ChildUnder18).unwrap();
        assert_eq!(line.units, Some(12));
        assert_eq!(line.amount, dec!(24000));
        assert_eq!(line.label, "Children (<18) [12]");
    }

    #[test]
    fn over_18_line_absent_when_pool_is_empty() {
        let breakdown =
            aggregate(&[claim(ChildUnder18, "12"), claim(ChildOver18Diploma, "3")]).unwrap();

        assert_eq!(breakdown.line(ChildOver18Diploma), None);
        assert_eq!(breakdown.total, dec!(24000));
    }

    #[test]
    fn disabled_children_ignore_the_pool() {
        let breakdown = aggregate(&[
            claim(ChildUnder18, "12"),
            claim(DisabledChild, "3"),
            claim(DisabledChildDiploma, "1"),
        ])
        .unwrap();

        assert_eq!(breakdown.amount_for(DisabledChild), dec!(18000));
        assert_eq!(breakdown.amount_for(DisabledChildDiploma), dec!(8000));
        assert!(!breakdown.line(DisabledChild).unwrap().capped);
    }

    #[test]
    fn pool_size_comes_from_limits() {
        let mut limits = ReliefLimits::ya2024();
        limits.child_slot_limit = 3;
        let aggregator = ReliefAggregator::new(&limits);

        let breakdown = aggregator
            .aggregate(&[claim(ChildUnder18, "2"), claim(ChildOver18Diploma, "2")])
            .unwrap();

        assert_eq!(breakdown.line(ChildOver18Diploma).unwrap().units, Some(1));
    }

    // =========================================================================
    // error tests
    // =========================================================================

    #[test]
    fn non_numeric_value_names_the_field() {
        let err = aggregate(&[claim(Medical, "ten thousand")]).unwrap_err();

        let ReliefError::Validation(validation) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert_eq!(validation.field, "medical");
    }

    #[test]
    fn negative_value_is_rejected() {
        assert!(matches!(
            aggregate(&[claim(Lifestyle, "-50")]),
            Err(ReliefError::Validation(_))
        ));
    }

    #[test]
    fn fractional_child_count_is_rejected() {
        assert!(matches!(
            aggregate(&[claim(ChildUnder18, "1.5")]),
            Err(ReliefError::Validation(_))
        ));
    }

    #[test]
    fn category_missing_from_limits_is_unknown() {
        let mut limits = ReliefLimits::ya2024();
        limits.amounts.remove(&Sspn);
        let aggregator = ReliefAggregator::new(&limits);

        let result = aggregator.aggregate(&[claim(Sspn, "100")]);

        assert_eq!(
            result,
            Err(ReliefError::UnknownCategory("sspn".to_string()))
        );
    }

    #[test]
    fn unclaimed_categories_may_be_missing_from_limits() {
        let mut limits = ReliefLimits::ya2024();
        limits.amounts.remove(&IndividualDisabled);
        limits.amounts.remove(&Sspn);
        let aggregator = ReliefAggregator::new(&limits);

        let breakdown = aggregator.aggregate(&[claim(Individual, "9000")]).unwrap();

        assert_eq!(breakdown.total, dec!(9000));
    }

    // =========================================================================
    // determinism tests
    // =========================================================================

    #[test]
    fn aggregate_is_idempotent() {
        let limits = ReliefLimits::ya2024();
        let aggregator = ReliefAggregator::new(&limits);
        let claims = [
            claim(Individual, "9000"),
            claim(ChildUnder18, "10"),
            claim(ChildOver18Diploma, "5"),
            claim(Medical, "12000"),
        ];

        let first = aggregator.aggregate(&claims).unwrap();
        let second = aggregator.aggregate(&claims).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn total_equals_sum_of_lines() {
        let breakdown = aggregate(&[
            claim(Individual, "9000"),
            claim(Spouse, "4000"),
            claim(ParentalMedical, "8500"),
            claim(Education, "3000"),
            claim(Childcare, "1200"),
        ])
        .unwrap();

        let sum: Decimal = breakdown.lines.iter().map(|l| l.amount).sum();
        assert_eq!(breakdown.total, sum);
        assert_eq!(breakdown.total, dec!(25200));
    }
}
