// src/output/dedupe.rs

//! Failure-output canonicalization.
//!
//! Two crash logs that differ only in ports, pids, durations or timestamps,
//! or in the interleaving of concurrently written lines, should compare equal
//! so that a crash loop is reported once instead of on every restart.

use std::sync::LazyLock;

use regex::Regex;

/// Placeholder substituted for the first digit run of every line.
///
/// It is itself a digit run, which keeps [`canonicalize`] idempotent.
pub const DIGIT_PLACEHOLDER: &str = "0";

static ANSI_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]").expect("ANSI escape regex is valid")
});

static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("digit run regex is valid"));

/// Canonical form of captured process output.
///
/// - terminal escape sequences are removed
/// - each line is trimmed; blank lines are dropped
/// - the first run of digits in each line becomes [`DIGIT_PLACEHOLDER`]
/// - lines are sorted, joined with `\n`, and the result trimmed
///
/// Only digits are masked, but whitespace at the start or end of a line is
/// not significant either: `"  x"` and `"x"` give the same signature, as do
/// `\r\n` and `\n` line endings. Whitespace inside a line is kept.
pub fn canonicalize(text: &str) -> String {
    let mut text = text.to_string();
    // Removing one sequence can splice together another.
    while ANSI_ESCAPE.is_match(&text) {
        text = ANSI_ESCAPE.replace_all(&text, "").into_owned();
    }

    let mut lines: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| DIGIT_RUN.replace(line, DIGIT_PLACEHOLDER).into_owned())
        .collect();

    lines.sort();
    lines.join("\n").trim().to_string()
}

/// True when two raw outputs canonicalize to the same failure signature.
pub fn same_failure(a: &str, b: &str) -> bool {
    canonicalize(a) == canonicalize(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_only_the_first_digit_run() {
        assert_eq!(
            canonicalize("listening on port 3000 (pid 4242)"),
            "listening on port 0 (pid 4242)"
        );
    }

    #[test]
    fn sorts_lines() {
        assert_eq!(canonicalize("b\na\nc"), "a\nb\nc");
    }

    #[test]
    fn ignores_timestamps_and_ordering() {
        let first = "Error: boom\n    at server.js:12:5\nstarted in 31ms\n";
        let second = "started in 57ms\nError: boom\n    at server.js:88:5\n";
        assert!(same_failure(first, second));
    }

    #[test]
    fn non_digit_differences_are_kept() {
        assert!(!same_failure("Error: boom", "Error: bang"));
    }

    #[test]
    fn edge_whitespace_is_not_significant() {
        assert!(same_failure("  at handler", "at handler"));
        assert!(same_failure("Error: boom\r\n", "Error: boom\n"));
        assert_eq!(canonicalize("\tError: boom  "), "Error: boom");
    }

    #[test]
    fn inner_whitespace_is_significant() {
        assert!(!same_failure("Error:  boom", "Error: boom"));
        assert!(!same_failure("a b", "ab"));
    }

    #[test]
    fn strips_colour_codes_before_masking() {
        assert_eq!(
            canonicalize("\x1b[31merror\x1b[0m after 120ms"),
            "error after 0ms"
        );
    }

    #[test]
    fn blank_output_is_empty() {
        assert_eq!(canonicalize(""), "");
        assert_eq!(canonicalize("\n  \n\r\n"), "");
    }
}
