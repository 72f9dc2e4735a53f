pub mod calculator;
pub mod format;
pub mod terms;

#[cfg(feature = "schedule")]
pub mod schedule;

#[cfg(feature = "chart")]
pub mod chart;
