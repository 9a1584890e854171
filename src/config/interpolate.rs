//! Environment variable interpolation for configuration values.
//!
//! `${NAME}` (or `${ NAME }`) is replaced with the value of `NAME` from the
//! supplied mapping. `$${NAME}` is the escape and yields a literal `${NAME}`. Anything else,
//! including renderer template syntax such as `{{ .Name }}`, is left alone.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

static VARIABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\$?)\$\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}").expect("variable pattern is valid")
});

/// Substitute `${NAME}` references in `value` from `env`.
///
/// Unset variables expand to the empty string.
pub fn interpolate(value: &str, env: &HashMap<String, String>) -> String {
    VARIABLE
        .replace_all(value, |caps: &Captures<'_>| {
            let name = &caps[2];
            if caps[1].is_empty() {
                env.get(name).cloned().unwrap_or_default()
            } else {
                caps[0][1..].to_string()
            }
        })
        .into_owned()
}
