use log::debug;
use serde_json::Value;
use std::io::{self, Read};

/// Loan or schedule JSON piped on stdin, if any.
///
/// Returns None when stdin is a terminal or the pipe carried only whitespace.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    debug!("read {} bytes from stdin", buffer.len());
    parse_piped(&buffer)
}

fn parse_piped(text: &str) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let value = serde_json::from_str(trimmed).map_err(|e| format!("Failed to parse stdin: {}", e))?;
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_pipe_is_no_input() {
        assert!(parse_piped("  \n").unwrap().is_none());
    }

    #[test]
    fn test_piped_loan() {
        let value = parse_piped("{\"loan_id\": 4, \"frequency_id\": 2}\n").unwrap().unwrap();
        assert_eq!(value["frequency_id"], 2);
    }

    #[test]
    fn test_malformed_pipe() {
        assert!(parse_piped("{ not json").is_err());
    }
}
