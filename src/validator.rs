//! Output comparison with whitespace normalization

use crate::verdict::Verdict;

/// Outcome of checking actual output against the expected output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationResult {
    pub passed: bool,
    pub verdict: Verdict,
}

/// Compare program output with the expected output.
///
/// Both sides are normalized first: lines are split on any line ending,
/// each line is trimmed, lines are rejoined with a single newline, and
/// trailing newlines are stripped. Trailing-whitespace differences are
/// ignored; internal whitespace differences are real failures. A missing
/// side fails outright.
pub fn validate(actual: Option<&str>, expected: Option<&str>) -> ValidationResult {
    let (actual, expected) = match (actual, expected) {
        (Some(actual), Some(expected)) => (actual, expected),
        _ => {
            return ValidationResult {
                passed: false,
                verdict: Verdict::WrongAnswer,
            }
        }
    };

    let passed = normalize_output(actual) == normalize_output(expected);

    ValidationResult {
        passed,
        verdict: if passed {
            Verdict::Accepted
        } else {
            Verdict::WrongAnswer
        },
    }
}

fn normalize_output(output: &str) -> String {
    let joined = output
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n");

    joined.trim_end_matches('\n').to_string()
}
