use serde::Serialize;
use thiserror::Error;

use super::{BracketSchedule, ReliefLimits};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("relief limits are for YA{reliefs} but the bracket schedule is for YA{brackets}")]
pub struct YearMismatch {
    pub reliefs: i32,
    pub brackets: i32,
}

/// Everything needed to assess one year: relief caps and the rate schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxYearConfig {
    relief_limits: ReliefLimits,
    schedule: BracketSchedule,
}

impl TaxYearConfig {
    pub fn new(
        relief_limits: ReliefLimits,
        schedule: BracketSchedule,
    ) -> Result<Self, YearMismatch> {
        if relief_limits.year_of_assessment != schedule.year_of_assessment() {
            return Err(YearMismatch {
                reliefs: relief_limits.year_of_assessment,
                brackets: schedule.year_of_assessment(),
            });
        }
        Ok(Self {
            relief_limits,
            schedule,
        })
    }

    pub fn ya2024() -> Self {
        Self {
            relief_limits: ReliefLimits::ya2024(),
            schedule: BracketSchedule::ya2024(),
        }
    }

    pub fn year_of_assessment(&self) -> i32 {
        self.schedule.year_of_assessment()
    }

    pub fn relief_limits(&self) -> &ReliefLimits {
        &self.relief_limits
    }

    pub fn schedule(&self) -> &BracketSchedule {
        &self.schedule
    }
}

impl Default for TaxYearConfig {
    fn default() -> Self {
        Self::ya2024()
    }
}
