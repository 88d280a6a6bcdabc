use thiserror::Error;

/// Errors raised by the interaction core.
///
/// `InvalidSubscription` is a programming error and surfaces at the
/// offending register/deliver call. The other two are recovered locally:
/// a bad search pattern keeps the previous visible set, and a malformed
/// doc string is excluded from the help table and reported.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("event {event:?} mixes keyed and unkeyed subscriptions")]
    InvalidSubscription { event: String },

    #[error("invalid search pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("malformed doc string {doc:?} for key {key} in context {context}")]
    MalformedDoc {
        context: String,
        key: String,
        doc: String,
    },
}
