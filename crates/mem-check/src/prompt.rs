//! Interactive fallback for values not given on the command line.

use crate::DEFAULT_BASE_URL;
use std::io::{self, BufRead, Write};

/// Print `message`, read one line, and return it trimmed (`None` if blank or EOF).
pub fn ask<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    message: &str,
) -> io::Result<Option<String>> {
    write!(output, "{}", message)?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    let line = line.trim();
    Ok((!line.is_empty()).then(|| line.to_string()))
}

/// Fill in the base URL and API key. Missing values are asked for only when `interactive`.
pub fn resolve_target<R: BufRead, W: Write>(
    base_url: Option<String>,
    api_key: Option<String>,
    interactive: bool,
    input: &mut R,
    output: &mut W,
) -> io::Result<(String, Option<String>)> {
    let base_url = base_url.filter(|u| !u.trim().is_empty());
    let api_key = api_key.filter(|k| !k.trim().is_empty());
    if !interactive {
        return Ok((
            base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
        ));
    }

    let base_url = match base_url {
        Some(u) => u,
        None => ask(
            input,
            output,
            &format!("Enter base URL (default: {}): ", DEFAULT_BASE_URL),
        )?
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
    };
    let api_key = match api_key {
        Some(k) => Some(k),
        None => ask(input, output, "Enter API key for authenticated tests (optional): ")?,
    };
    Ok((base_url, api_key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn non_interactive_uses_defaults_without_reading() {
        let mut input = Cursor::new(b"should not be read\n".to_vec());
        let mut output = Vec::new();
        let (url, key) = resolve_target(None, None, false, &mut input, &mut output).unwrap();
        assert_eq!(url, DEFAULT_BASE_URL);
        assert_eq!(key, None);
        assert!(output.is_empty());
    }

    #[test]
    fn interactive_blank_answers_fall_back() {
        let mut input = Cursor::new(b"\n\n".to_vec());
        let mut output = Vec::new();
        let (url, key) = resolve_target(None, None, true, &mut input, &mut output).unwrap();
        assert_eq!(url, DEFAULT_BASE_URL);
        assert_eq!(key, None);
        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("Enter base URL"));
        assert!(text.contains("Enter API key"));
    }

    #[test]
    fn interactive_reads_answers_and_skips_given_values() {
        let mut input = Cursor::new(b"  secret-key  \n".to_vec());
        let mut output = Vec::new();
        let (url, key) = resolve_target(
            Some("https://example.test".to_string()),
            None,
            true,
            &mut input,
            &mut output,
        )
        .unwrap();
        assert_eq!(url, "https://example.test");
        assert_eq!(key.as_deref(), Some("secret-key"));
        assert!(!String::from_utf8(output).unwrap().contains("Enter base URL"));
    }

    #[test]
    fn eof_counts_as_blank() {
        let mut input = Cursor::new(Vec::new());
        let mut output = Vec::new();
        assert_eq!(ask(&mut input, &mut output, "> ").unwrap(), None);
    }
}
