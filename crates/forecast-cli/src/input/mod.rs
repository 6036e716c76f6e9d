pub mod file;

use serde::de::DeserializeOwned;
use std::error::Error;
use std::io::{self, Read};

/// Document from `--input`, else from piped stdin, else `None`.
pub fn read_optional_input<T: DeserializeOwned>(
    path: Option<&str>,
) -> Result<Option<T>, Box<dyn Error>> {
    if let Some(path) = path {
        return file::read_document(path).map(Some);
    }
    match read_piped()? {
        Some(text) => parse_piped(&text).map(Some),
        None => Ok(None),
    }
}

/// Like [`read_optional_input`], but a missing document is an error.
pub fn read_input<T: DeserializeOwned>(
    path: Option<&str>,
    command: &str,
) -> Result<T, Box<dyn Error>> {
    read_optional_input(path)?
        .ok_or_else(|| format!("--input <file> or stdin required for {command}").into())
}

/// Nothing is read from an interactive terminal.
fn read_piped() -> Result<Option<String>, Box<dyn Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        Ok(None)
    } else {
        Ok(Some(trimmed.to_string()))
    }
}

/// Piped text has no extension: JSON objects and arrays are parsed as JSON,
/// anything else as YAML.
fn parse_piped<T: DeserializeOwned>(text: &str) -> Result<T, Box<dyn Error>> {
    if text.starts_with('{') || text.starts_with('[') {
        Ok(serde_json::from_str(text)?)
    } else {
        Ok(serde_yaml::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forecast_core::config::ForecastPolicy;
    use rust_decimal::Decimal;

    #[test]
    fn test_piped_json_policy() {
        let policy: ForecastPolicy = parse_piped(r#"{"sweep_fraction": "0.25"}"#).unwrap();
        assert_eq!(policy.sweep_fraction, Decimal::new(25, 2));
        assert_eq!(policy.st_financing_share, ForecastPolicy::default().st_financing_share);
    }

    #[test]
    fn test_piped_yaml_policy() {
        let policy: ForecastPolicy =
            parse_piped("sweep_fraction: \"0.4\"\ndividend_timing: following_year").unwrap();
        assert_eq!(policy.sweep_fraction, Decimal::new(4, 1));
    }

    #[test]
    fn test_malformed_piped_json_rejected() {
        assert!(parse_piped::<ForecastPolicy>("{\"sweep_fraction\": ").is_err());
    }
}
