//! Interactive prompts on the controlling terminal.

use std::io::{self, BufRead, Write};

use eyre::WrapErr;

/// Prompts for a line of text, re-asking until something non-blank is entered.
pub fn text(label: &str) -> eyre::Result<String> {
    loop {
        let answer = read_line(&format!("{label}: "))?;
        let answer = answer.trim();
        if !answer.is_empty() {
            return Ok(answer.to_string());
        }
    }
}

/// Returns `value` if present, otherwise prompts for it.
pub fn text_or(value: Option<String>, label: &str) -> eyre::Result<String> {
    match value.filter(|v| !v.trim().is_empty()) {
        Some(value) => Ok(value),
        None => text(label),
    }
}

/// Prompts for a password without echoing it.
pub fn password(label: &str) -> eyre::Result<String> {
    rpassword::prompt_password(format!("{label}: ")).wrap_err("Failed to read password")
}

/// Prompts for a password twice and insists that both entries match.
pub fn new_password(label: &str) -> eyre::Result<String> {
    loop {
        let first = password(label)?;
        let second = password("Repeat for confirmation")?;
        if first == second {
            return Ok(first);
        }
        eprintln!("Error: The two entered values do not match.");
    }
}

/// Asks a yes/no question. Anything other than an explicit yes counts as no.
pub fn confirm(question: &str) -> eyre::Result<bool> {
    let answer = read_line(&format!("{question} [y/N]: "))?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn read_line(prompt: &str) -> eyre::Result<String> {
    let mut stderr = io::stderr().lock();
    write!(stderr, "{prompt}")?;
    stderr.flush()?;

    let mut line = String::new();
    let read = io::stdin().lock().read_line(&mut line).wrap_err("Failed to read from stdin")?;
    if read == 0 {
        eyre::bail!("Unexpected end of input while prompting");
    }
    Ok(line)
}
