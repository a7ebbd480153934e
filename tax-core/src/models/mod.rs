mod ic_number;
mod relief_category;
mod relief_limits;
mod tax_bracket;
mod tax_record;
mod tax_year_config;

pub use ic_number::{IC_NUMBER_LEN, IcNumber, IcNumberError};
pub use relief_category::{ReliefCategory, ReliefKind};
pub use relief_limits::{DEFAULT_CHILD_SLOT_LIMIT, ReliefLimits};
pub use tax_bracket::{BracketSchedule, ScheduleError, TaxBracket};
pub use tax_record::TaxRecord;
pub use tax_year_config::{TaxYearConfig, YearMismatch};
