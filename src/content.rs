//! Box content sources: files on disk and shell command output.

use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{Context, Result, bail};
use tracing::{debug, warn};

pub const MAX_LINES: usize = 1000;
pub const MAX_LINE_CHARS: usize = 500;
pub const MAX_COMMAND_OUTPUT: usize = 64 * 1024;

const SHELL_METACHARS: &[char] = &['`', '$', ';', '|', '&', '>', '<'];

/// Reads up to [`MAX_LINES`] lines, each cut to [`MAX_LINE_CHARS`].
/// Invalid UTF-8 is replaced rather than rejected.
pub fn load_file_lines(path: &Path) -> Result<Vec<String>> {
    let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let text = String::from_utf8_lossy(&bytes);
    let lines = split_capped(&text);
    debug!(path = %path.display(), lines = lines.len(), "loaded file content");
    Ok(lines)
}

/// Flags commands containing shell metacharacters. Advisory: callers
/// decide whether to enforce it.
pub fn validate_command(command: &str) -> Result<()> {
    if command.trim().is_empty() {
        bail!("empty command");
    }
    if let Some(c) = command.chars().find(|c| SHELL_METACHARS.contains(c)) {
        bail!("command contains shell metacharacter {:?}", c);
    }
    Ok(())
}

/// Runs `command` through `sh -c` and captures stdout followed by stderr.
/// With `strict`, commands failing [`validate_command`] are refused.
pub fn run_command(command: &str, strict: bool) -> Result<Vec<String>> {
    if strict {
        validate_command(command)?;
    } else if command.trim().is_empty() {
        bail!("empty command");
    }

    let output = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .output()
        .with_context(|| format!("failed to run {:?}", command))?;

    if !output.status.success() {
        warn!(command, status = %output.status, "content command failed");
    }

    let mut raw = output.stdout;
    raw.extend_from_slice(&output.stderr);
    raw.truncate(MAX_COMMAND_OUTPUT);
    let text = String::from_utf8_lossy(&raw);
    Ok(split_capped(&text))
}

fn split_capped(text: &str) -> Vec<String> {
    text.lines()
        .take(MAX_LINES)
        .map(|line| line.replace('\t', "    ").chars().take(MAX_LINE_CHARS).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn file_lines_are_capped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        let long = "x".repeat(MAX_LINE_CHARS + 20);
        let mut body = format!("first\n{}\n", long);
        for i in 0..MAX_LINES {
            body.push_str(&format!("{}\n", i));
        }
        fs::write(&path, body).unwrap();

        let lines = load_file_lines(&path).unwrap();
        assert_eq!(lines.len(), MAX_LINES);
        assert_eq!(lines[0], "first");
        assert_eq!(lines[1].chars().count(), MAX_LINE_CHARS);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(load_file_lines(&dir.path().join("absent")).is_err());
    }

    #[test]
    fn validator_flags_metacharacters() {
        assert!(validate_command("ls -la").is_ok());
        for bad in ["echo `id`", "echo $HOME", "a; b", "a | b", "a && b", "a > f", "a < f"] {
            assert!(validate_command(bad).is_err(), "{bad}");
        }
        assert!(validate_command("   ").is_err());
    }

    #[test]
    fn command_output_is_captured() {
        assert_eq!(run_command("echo hello", true).unwrap(), vec!["hello"]);
        assert_eq!(run_command("echo a | tr a b", false).unwrap(), vec!["b"]);
    }

    #[test]
    fn strict_mode_refuses_metacharacters() {
        assert!(run_command("echo a | tr a b", true).is_err());
    }

    #[test]
    fn command_output_is_capped() {
        let lines = run_command("yes | head -n 5000", false).unwrap();
        assert_eq!(lines.len(), MAX_LINES);
    }
}
