/// Creates a root span based on the provided sampling rate, or attaches
/// beneath the current span if one is active. Sampling happens before the
/// span exists so unsampled callouts pay nothing for span bookkeeping.
///
/// # Arguments
/// * `sample_percent` - The percent (0.0 to 1.0) of spans to sample
/// * `span_name` - The name of the span if created (must be a literal)
///
/// # Returns
/// - Real span if a parent exists OR sampling passes
/// - `Span::none()` if no parent and sampling fails
///
/// # Example
/// ```
/// let span = rex_adapters::sample_or_attach_root_span!(0.01, "adapter_callout");
/// let _guard = span.enter();
/// ```
#[macro_export]
macro_rules! sample_or_attach_root_span {
    ($sample_percent:expr, $span_name:literal) => {{
        let current = ::tracing::Span::current();

        if !current.is_disabled() || ::rand::random::<f32>() < $sample_percent {
            ::tracing::info_span!($span_name)
        } else {
            ::tracing::Span::none()
        }
    }};
}

/// Creates a DEBUG-level child span only if the parent span is active (sampled).
///
/// # Returns
/// An **un-entered** `Span` - you must call `.entered()` or use `.instrument()`.
///
/// # Examples
/// ```
/// let span = rex_adapters::child_span_debug!("shape_requests", adapter = "sovrn");
/// let _enter = span.entered();
/// ```
#[macro_export]
macro_rules! child_span_debug {
    ($span_name:literal) => {{
        if !::tracing::Span::current().is_disabled() {
            ::tracing::debug_span!($span_name)
        } else {
            ::tracing::Span::none()
        }
    }};
    ($span_name:literal, $($fields:tt)*) => {{
        if !::tracing::Span::current().is_disabled() {
            ::tracing::debug_span!($span_name, $($fields)*)
        } else {
            ::tracing::Span::none()
        }
    }};
}

/// Creates an INFO-level child span only if the parent span is active (sampled).
///
/// # Returns
/// An **un-entered** `Span` - you must call `.entered()` or use `.instrument()`.
///
/// # Examples
/// ```
/// let span = rex_adapters::child_span_info!("adapter_make_bids", status = 204u16);
/// span.record("status", 200u16);
/// ```
///
/// # See also
/// - [`sample_or_attach_root_span!`] for creating root spans with sampling
#[macro_export]
macro_rules! child_span_info {
    ($span_name:literal) => {{
        if !::tracing::Span::current().is_disabled() {
            ::tracing::info_span!($span_name)
        } else {
            ::tracing::Span::none()
        }
    }};
    ($span_name:literal, $($fields:tt)*) => {{
        if !::tracing::Span::current().is_disabled() {
            ::tracing::info_span!($span_name, $($fields)*)
        } else {
            ::tracing::Span::none()
        }
    }};
}
