use colored::Colorize;
use serde_json::Value;

/// Pretty-print the output envelope to stdout. Decimals are already strings.
pub fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("{}: failed to serialise output: {}", "error".red().bold(), e),
    }
}
