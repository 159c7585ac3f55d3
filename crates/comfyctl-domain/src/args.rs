/// The single-string argument form could not be split into words.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("invalid shell quoting in {input:?}")]
pub struct ArgumentsError {
    pub input: String,
}

/// Splits a string into words using POSIX shell quoting rules.
///
/// # Errors
/// Returns [`ArgumentsError`] on unterminated quotes or a dangling escape.
pub fn split_arguments(input: &str) -> Result<Vec<String>, ArgumentsError> {
    shlex::split(input).ok_or_else(|| ArgumentsError {
        input: input.to_string(),
    })
}

/// Positional arguments win; otherwise the string form is split.
///
/// # Errors
/// Returns [`ArgumentsError`] when the string form is malformed.
pub fn positional_or_split(
    positional: &[String],
    fallback: Option<&str>,
) -> Result<Vec<String>, ArgumentsError> {
    if !positional.is_empty() {
        return Ok(positional.to_vec());
    }
    match fallback {
        Some(raw) => split_arguments(raw),
        None => Ok(Vec::new()),
    }
}
