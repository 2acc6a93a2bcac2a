use std::io::{BufRead, Write};

use anyhow::{Context, Result, bail};

const PROMPT: &str = "Your osm-boundaries API key: ";

/// Use the flag/env value when given, otherwise ask on `input`.
pub(crate) fn resolve_api_key<R: BufRead, W: Write>(
    provided: Option<String>,
    mut input: R,
    mut prompt: W,
) -> Result<String> {
    if let Some(key) = provided.map(|key| key.trim().to_owned())
        && !key.is_empty()
    {
        return Ok(key);
    }

    prompt.write_all(PROMPT.as_bytes())?;
    prompt.flush()?;

    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("failed to read API key from stdin")?;
    let key = line.trim();
    if key.is_empty() {
        bail!("an osm-boundaries API key is required");
    }
    Ok(key.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provided_key_skips_prompt() {
        let mut prompt = Vec::new();
        let key = resolve_api_key(Some(" abc ".to_owned()), &b""[..], &mut prompt).unwrap();
        assert_eq!(key, "abc");
        assert!(prompt.is_empty(), "prompt was shown");
    }

    #[test]
    fn prompts_when_missing() {
        let mut prompt = Vec::new();
        let key = resolve_api_key(None, &b"typed-key\n"[..], &mut prompt).unwrap();
        assert_eq!(key, "typed-key");
        assert_eq!(prompt, PROMPT.as_bytes());
    }

    #[test]
    fn blank_flag_falls_back_to_prompt() {
        let key = resolve_api_key(Some("  ".to_owned()), &b"k2\n"[..], Vec::new()).unwrap();
        assert_eq!(key, "k2");
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(resolve_api_key(None, &b"\n"[..], Vec::new()).is_err());
    }
}
