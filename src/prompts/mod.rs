use std::path::Path;

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;

// NOTE:
// The instruction is content, not code. Deployments override it through
// ANALYZE_PROMPT / ANALYZE_PROMPT_FILE; this is only the fallback.

macro_rules! prompt_file {
    ($name:literal) => {
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/prompts/", $name))
    };
}

static STATEMENT_PROMPT: Lazy<String> =
    Lazy::new(|| normalize(prompt_file!("statement.txt")));

/// Built-in bank statement instruction.
pub fn default_instruction() -> &'static str {
    STATEMENT_PROMPT.as_str()
}

pub fn load_instruction(path: &Path) -> Result<String> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading instruction file {}", path.display()))?;
    let instruction = normalize(&raw);
    if instruction.is_empty() {
        bail!("instruction file {} is empty", path.display());
    }
    Ok(instruction)
}

/// Trim each line and the whole text, keep paragraph breaks.
fn normalize(raw: &str) -> String {
    raw.replace('\r', "")
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_instruction_asks_for_raw_json() {
        let prompt = default_instruction();
        assert!(prompt.starts_with("Analyze the provided bank statement."));
        assert!(prompt.contains("Return ONLY raw JSON"));
        assert!(!prompt.ends_with('\n'));
    }

    #[test]
    fn normalize_strips_indentation() {
        assert_eq!(normalize("\r\n   one\r\n     two  \n\n  three\n"), "one\ntwo\n\nthree");
    }

    #[test]
    fn empty_file_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "   ").unwrap();
        assert!(load_instruction(file.path()).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = load_instruction(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.txt"));
    }
}
