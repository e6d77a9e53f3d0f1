//! Failure reports for the operator channel

use lazy_static::lazy_static;
use regex::Regex;
use std::error::Error;

lazy_static! {
    /// W3C traceparent, AWS X-Ray root, and bare 128-bit trace ids
    static ref TRACE_IDS: Regex = Regex::new(concat!(
        r"\b00-[0-9a-f]{32}-[0-9a-f]{16}-[0-9a-f]{2}\b",
        r"|\b1-[0-9a-f]{8}-[0-9a-f]{24}\b",
        r"|\b[0-9a-f]{32}\b",
    ))
    .expect("trace id pattern compiles");
}

/// Replace distributed-trace identifiers in `text` with `token`
pub fn redact_trace_ids(text: &str, token: &str) -> String {
    TRACE_IDS.replace_all(text, token).into_owned()
}

/// Error message followed by its cause chain, redacted
pub fn failure_trace(error: &(dyn Error + 'static), token: &str) -> String {
    let mut trace = error.to_string();
    let mut last = trace.clone();
    let mut source = error.source();
    while let Some(cause) = source {
        let message = cause.to_string();
        // #[error("... {0}")] wrappers repeat their source verbatim
        if !last.ends_with(&message) {
            trace.push_str("\nCaused by: ");
            trace.push_str(&message);
        }
        last = message;
        source = cause.source();
    }
    redact_trace_ids(&trace, token)
}
