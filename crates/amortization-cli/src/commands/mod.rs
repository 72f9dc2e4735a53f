pub mod frequencies;
pub mod loans;
