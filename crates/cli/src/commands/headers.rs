use std::fs;
use std::path::Path;

use launchdesk_core::ingest::extract_headers;

use crate::commands::{CommandResult, EXIT_INPUT};

pub fn run(file: &Path) -> CommandResult {
    let bytes = match fs::read(file) {
        Ok(bytes) => bytes,
        Err(error) => {
            return CommandResult::failure(
                "headers",
                "input",
                format!("could not read `{}`: {error}", file.display()),
                EXIT_INPUT,
            );
        }
    };

    match extract_headers(&bytes) {
        Ok(headers) => CommandResult::success("headers", describe(&headers)),
        Err(error) => CommandResult::failure("headers", "ingestion", error.to_string(), EXIT_INPUT),
    }
}

fn describe(headers: &[String]) -> String {
    format!("{} columns: {}", headers.len(), headers.join(" | "))
}

#[cfg(test)]
mod tests {
    use super::describe;

    #[test]
    fn describe_keeps_column_order() {
        let headers = vec!["SKU ID".to_string(), "SKU Name".to_string(), "Unnamed: 2".to_string()];
        assert_eq!(describe(&headers), "3 columns: SKU ID | SKU Name | Unnamed: 2");
    }
}
