//! Variable expansion for instruction arguments.
//!
//! Replaces `${NAME}` and bare `$NAME` references with values from the
//! current variable mapping. Substitution is a single pass: the output is
//! never re-scanned, and there is no escape syntax.

use std::collections::HashMap;

/// Expand `${VAR}` and `$VAR` references in `input` using `vars`.
///
/// Keys are applied longest-first (ties broken lexicographically) so that a
/// short key never matches inside a longer key's token: with both `FOO` and
/// `FOOBAR` defined, `$FOOBAR` resolves to the value of `FOOBAR`.
pub fn expand(input: &str, vars: &HashMap<String, String>) -> String {
    let mut keys: Vec<&String> = vars.keys().collect();
    keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let mut result = input.to_string();
    for key in keys {
        let value = &vars[key.as_str()];
        result = result.replace(&format!("${{{}}}", key), value);
        result = result.replace(&format!("${}", key), value);
    }
    result
}
