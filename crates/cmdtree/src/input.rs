//! Raw input cleanup before walking.
//!
//! Tokens usually come from `std::env::args`, but may also be hand-written
//! or come from a shell line. [`sanitize`] normalizes both:
//!
//! - a single joined command line is split with shell quoting rules, so
//!   `["list --all"]` and `["list", "--all"]` parse the same way
//! - when there are several tokens, the shell already split them; a token
//!   that still holds whitespace is broken on whitespace only, and quote
//!   characters inside it are kept
//! - a leading program name equal to the root action's name is dropped

use tracing::trace;

use crate::error::Error;

/// Normalizes a token list for the walker.
pub fn sanitize<S: AsRef<str>>(root: &str, tokens: &[S]) -> Result<Vec<String>, Error> {
    let words = match tokens {
        [line] if line.as_ref().chars().any(char::is_whitespace) => {
            trace!(line = line.as_ref(), "splitting joined command line");
            split_command(root, line.as_ref())?
        }
        _ => {
            let mut words = Vec::with_capacity(tokens.len());
            for token in tokens.iter().map(AsRef::as_ref) {
                if token.chars().any(char::is_whitespace) {
                    trace!(token, "breaking token on whitespace");
                    words.extend(token.split_whitespace().map(str::to_string));
                } else {
                    words.push(token.to_string());
                }
            }
            words
        }
    };
    Ok(strip_program(root, &words).to_vec())
}

/// Drops a leading token equal to the root action's name.
pub fn strip_program<'a, S: AsRef<str>>(root: &str, tokens: &'a [S]) -> &'a [S] {
    match tokens.split_first() {
        Some((first, rest)) if first.as_ref() == root => rest,
        _ => tokens,
    }
}

/// Splits a command line into words using shell quoting rules.
///
/// `command` names the action the line is meant for and only appears in
/// the error for unbalanced quotes.
pub fn split_command(command: &str, line: &str) -> Result<Vec<String>, Error> {
    shell_words::split(line).map_err(|_| Error::InvalidArgument {
        command: command.to_string(),
        argument: line.to_string(),
    })
}
