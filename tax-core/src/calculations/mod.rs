//! Relief aggregation and bracket tax evaluation.
//!
//! Both calculators are pure: they borrow a configuration table and hold no
//! state between calls.

pub mod assessment;
pub mod bracket;
pub mod common;
pub mod input;
pub mod relief;

pub use assessment::{Assessment, AssessmentError, TaxAssessor};
pub use bracket::{BracketError, BracketTaxEvaluator, TaxComputation};
pub use input::{ValidationError, ValidationReason};
pub use relief::{
    ChildSlotPool, ReliefAggregator, ReliefBreakdown, ReliefClaim, ReliefError, ReliefLine,
};
