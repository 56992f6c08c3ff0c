//! Helper macro enforcing consistent readiness log fields.
//!
//! Every line emitted from the polling loops carries a `phase` field (and `instance`
//! where one applies) so downstream parsing can rely on them.

/// Log an event for a readiness phase, optionally scoped to an instance, plus extra fields.
#[macro_export]
macro_rules! readiness_event {
    ($level:ident, $event:expr, phase = $phase:expr, instance = $instance:expr $(, $field:ident = $value:expr )* $(,)?) => {
        tracing::$level!(
            event = $event,
            phase = %$phase,
            instance = %$instance
            $(, $field = %$value)*
        )
    };
    ($level:ident, $event:expr, phase = $phase:expr $(, $field:ident = $value:expr )* $(,)?) => {
        tracing::$level!(
            event = $event,
            phase = %$phase
            $(, $field = %$value)*
        )
    };
}
