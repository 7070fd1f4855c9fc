//! Error types for the fallible edges of the library
//!
//! Equality, classification and key enumeration are total and never produce
//! these. They come from calling values, boxing, pattern construction and the
//! JSON bridge.

use crate::prelude::*;
use thiserror::Error;

/// Main error type for the library
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnderbarError {
    #[error("TypeError: {message}")]
    TypeError { message: String },

    #[error("SyntaxError: {message}")]
    SyntaxError { message: String },

    #[error("RangeError: {message}")]
    RangeError { message: String },

    /// A cyclic object graph reached a conversion that needs a tree
    #[error("TypeError: Converting circular structure to JSON{}", format_path(.path))]
    CircularStructure { path: Vec<String> },
}

fn format_path(path: &[String]) -> String {
    if path.is_empty() {
        return String::new();
    }
    let mut out = String::from("\n    --> starting at object with key path ");
    out.push_str(&path.join("."));
    out
}

impl UnderbarError {
    pub fn type_error(message: impl Into<String>) -> Self {
        UnderbarError::TypeError {
            message: message.into(),
        }
    }

    pub fn syntax_error(message: impl Into<String>) -> Self {
        UnderbarError::SyntaxError {
            message: message.into(),
        }
    }

    pub fn range_error(message: impl Into<String>) -> Self {
        UnderbarError::RangeError {
            message: message.into(),
        }
    }

    pub fn circular_structure(path: Vec<String>) -> Self {
        UnderbarError::CircularStructure { path }
    }
}
