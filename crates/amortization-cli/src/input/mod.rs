pub mod catalog;
pub mod file;
pub mod stdin;
