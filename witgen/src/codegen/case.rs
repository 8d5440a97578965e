//! Casing conventions for hyphen-separated identifiers.
//!
//! Empty segments, as in `a--b`, contribute nothing to the output. The parser
//! never produces them.

/// Upper camel case, used for exported names: `send-receive` becomes `SendReceive`.
pub fn public(name: &str) -> String {
    name.split('-').map(capitalize).collect()
}

/// Lower camel case, used for parameter names: `process-id` becomes `processId`.
///
/// The first segment is lower-cased in full.
pub fn private(name: &str) -> String {
    let mut segments = name.split('-');
    let mut output = segments.next().map(str::to_lowercase).unwrap_or_default();
    output.extend(segments.map(capitalize));
    output
}

/// Upper-case the first character of a segment, leaving the rest untouched.
fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
