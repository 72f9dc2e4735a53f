pub mod error;
pub mod frequency;
pub mod loans;
pub mod time_value;
pub mod types;

pub use error::LoanError;
pub use frequency::{Frequency, FrequencyCatalog};
pub use loans::calculator::{calculate, CalculationResult};
pub use loans::terms::{LoanState, LoanTerms};
pub use types::*;

#[cfg(feature = "schedule")]
pub use loans::schedule::{
    generate_schedule, generate_schedule_as_of, ScheduleEntry, ScheduleSummary,
};

/// Standard result type for all amortization operations
pub type LoanResult<T> = Result<T, LoanError>;
