//! Pattern (RegExp) support
//!
//! Flag validation is always available. Compiling and matching patterns needs
//! the `regex` feature, which backs patterns with `fancy_regex` so lookaround
//! and backreferences keep working.

use crate::error::UnderbarError;
use crate::prelude::*;

const VALID_FLAGS: &str = "dgimsuvy";

/// Reject unknown, repeated, or mutually exclusive flags
pub fn validate_flags(flags: &str) -> Result<(), UnderbarError> {
    let invalid = || {
        UnderbarError::syntax_error(format!("Invalid regular expression flags '{}'", flags))
    };
    let mut seen: u8 = 0;
    for c in flags.chars() {
        let bit = VALID_FLAGS.find(c).ok_or_else(invalid)?;
        let mask = 1u8 << bit;
        if seen & mask != 0 {
            return Err(invalid());
        }
        seen |= mask;
    }
    if flags.contains('u') && flags.contains('v') {
        return Err(invalid());
    }
    Ok(())
}

#[cfg(feature = "regex")]
pub use compiled::{compile, test};

#[cfg(feature = "regex")]
mod compiled {
    use super::validate_flags;
    use crate::error::UnderbarError;
    use crate::prelude::*;
    use crate::value::{ExoticObject, JsValue};

    /// Compile a host pattern into a `fancy_regex::Regex`
    pub fn compile(source: &str, flags: &str) -> Result<fancy_regex::Regex, UnderbarError> {
        validate_flags(flags)?;

        let mut pattern = js_regex_to_rust(source);
        let prefix: String = flags.chars().filter(|c| matches!(c, 'i' | 'm' | 's')).collect();
        if !prefix.is_empty() {
            pattern = format!("(?{}){}", prefix, pattern);
        }

        fancy_regex::Regex::new(&pattern).map_err(|e| {
            UnderbarError::syntax_error(format!("Invalid regular expression: /{}/: {}", source, e))
        })
    }

    /// Run a pattern object against `input`
    pub fn test(pattern: &JsValue, input: &str) -> Result<bool, UnderbarError> {
        let (source, flags) = match pattern.as_object().map(|obj| obj.borrow()) {
            Some(obj) => match &obj.exotic {
                ExoticObject::RegExp { source, flags } => (source.clone(), flags.clone()),
                _ => return Err(not_a_pattern(pattern)),
            },
            None => return Err(not_a_pattern(pattern)),
        };
        compile(source.as_str(), flags.as_str())?
            .is_match(input)
            .map_err(|e| UnderbarError::type_error(e.to_string()))
    }

    fn not_a_pattern(value: &JsValue) -> UnderbarError {
        UnderbarError::type_error(format!("{:?} is not a regular expression", value))
    }

    /// Translate class syntax that differs between host patterns and Rust:
    /// - an unescaped `[` inside a class is literal for the host, a nested class for Rust
    /// - `[]` never matches and `[^]` matches any character
    fn js_regex_to_rust(pattern: &str) -> String {
        let mut result = String::with_capacity(pattern.len() + 16);
        let mut chars = pattern.chars().peekable();
        let mut in_class = false;

        while let Some(c) = chars.next() {
            if c == '\\' {
                result.push(c);
                if let Some(next) = chars.next() {
                    result.push(next);
                }
                continue;
            }

            if !in_class {
                if c == '[' {
                    match (chars.peek().copied(), pattern_after_caret(&chars)) {
                        (Some(']'), _) => {
                            chars.next();
                            result.push_str("(?!)");
                        }
                        (Some('^'), Some(']')) => {
                            chars.next();
                            chars.next();
                            result.push_str(r"[\s\S]");
                        }
                        _ => {
                            in_class = true;
                            result.push(c);
                            if chars.peek() == Some(&'^') {
                                chars.next();
                                result.push('^');
                            }
                        }
                    }
                } else {
                    result.push(c);
                }
            } else if c == ']' {
                in_class = false;
                result.push(c);
            } else if c == '[' {
                result.push_str(r"\[");
            } else {
                result.push(c);
            }
        }

        result
    }

    /// The character following a leading `^`, if the next character is one
    fn pattern_after_caret(chars: &core::iter::Peekable<core::str::Chars<'_>>) -> Option<char> {
        let mut lookahead = chars.clone();
        match lookahead.next() {
            Some('^') => lookahead.next(),
            _ => None,
        }
    }

}
