use crate::utils::error::Result;
use std::io::{BufRead, Write};

pub const PRODUCTION_PROMPT: &str = "⚠️ Running against PRODUCTION. Continue? (yes/no): ";

/// Asks the operator to confirm a production run. Only `yes` or `y`
/// (any case, surrounding whitespace ignored) counts as consent; EOF does not.
pub fn confirm<R: BufRead, W: Write>(prompt: &str, input: &mut R, output: &mut W) -> Result<bool> {
    write!(output, "{}", prompt)?;
    output.flush()?;

    let mut answer = String::new();
    if input.read_line(&mut answer)? == 0 {
        return Ok(false);
    }

    let answer = answer.trim().to_lowercase();
    Ok(matches!(answer.as_str(), "yes" | "y"))
}

pub fn confirm_production() -> Result<bool> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    confirm(PRODUCTION_PROMPT, &mut stdin.lock(), &mut stdout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn answer(text: &str) -> bool {
        let mut input = Cursor::new(text.as_bytes().to_vec());
        let mut output = Vec::new();
        confirm(PRODUCTION_PROMPT, &mut input, &mut output).unwrap()
    }

    #[test]
    fn test_accepts_yes_variants() {
        assert!(answer("yes\n"));
        assert!(answer("Y\n"));
        assert!(answer("  YES  \r\n"));
    }

    #[test]
    fn test_rejects_everything_else() {
        assert!(!answer("no\n"));
        assert!(!answer("\n"));
        assert!(!answer("yeah\n"));
        assert!(!answer(""));
    }

    #[test]
    fn test_prompt_is_written() {
        let mut input = Cursor::new(b"n\n".to_vec());
        let mut output = Vec::new();
        confirm("Continue? ", &mut input, &mut output).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "Continue? ");
    }
}
