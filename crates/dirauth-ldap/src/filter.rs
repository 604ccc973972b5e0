//! Search-filter construction.
//!
//! Administrators supply either a bare constraint filter such as
//! `(objectclass=posixAccount)` or an already-conjunctive filter such as
//! `(&(objectclass=posixAccount)(|(status=member)))`. [`build`] produces a
//! single well-formed conjunctive filter from either shape.

/// Builds the effective search filter by constraining `base_filter` with an
/// `(attribute=value)` clause.
///
/// If the base filter already contains a conjunction operator, the new
/// clause is inserted immediately after the first `&`, leaving the rest of
/// the filter untouched. Otherwise the whole expression is wrapped as
/// `(&(attribute=value)base_filter)`.
///
/// `value` is interpolated verbatim: no escaping is performed here, and a
/// value containing filter metacharacters (`(`, `)`, `*`, `\`) will change
/// the meaning of the filter. Callers passing untrusted input must escape
/// it first, e.g. with [`escape_value`].
#[must_use]
pub fn build(base_filter: &str, attribute: &str, value: &str) -> String {
    let clause = format!("({attribute}={value})");
    match base_filter.find('&') {
        Some(idx) => {
            let mut filter = String::with_capacity(base_filter.len() + clause.len());
            filter.push_str(&base_filter[..=idx]);
            filter.push_str(&clause);
            filter.push_str(&base_filter[idx + 1..]);
            filter
        }
        None => format!("(&{clause}{base_filter})"),
    }
}

/// Escapes a value for safe interpolation into a search filter (RFC 4515).
#[must_use]
pub fn escape_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '*' => escaped.push_str("\\2a"),
            '(' => escaped.push_str("\\28"),
            ')' => escaped.push_str("\\29"),
            '\\' => escaped.push_str("\\5c"),
            '\0' => escaped.push_str("\\00"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
