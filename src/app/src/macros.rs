/// Macro for model field updates with automatic rendering.
/// Supports both single and multiple field updates.
///
/// # Examples
///
/// Single field update:
/// ```ignore
/// update_field!(model.error_message, None)
/// ```
///
/// Multiple field updates:
/// ```ignore
/// update_field!(
///     model.amount, String::new();
///     model.error_message, None
/// )
/// ```
#[macro_export]
macro_rules! update_field {
    // Multiple field updates (must come first to match the pattern)
    ($($model_field:expr, $value:expr);+ $(;)?) => {{
        let mut changed = false;
        $(
            let value = $value;
            if $model_field != value {
                $model_field = value;
                changed = true;
            }
        )+
        if changed {
            crux_core::render::render()
        } else {
            crux_core::Command::done()
        }
    }};

    // Single field update
    ($model_field:expr, $value:expr) => {{
        update_field!($model_field, $value;)
    }};
}

// Re-export http_helpers functions for macro use
pub use crate::http_helpers::{
    check_response_status, decode_backend_json, extract_bytes_response, extract_error_message,
    is_response_success, join_url, map_http_error, parse_json_response, process_bytes_response,
    process_json_response, process_status_response,
};

/// Macro for backend GET requests.
/// Requires domain parameters for event wrapping.
///
/// # Patterns
///
/// Pattern 1: GET expecting a (possibly enveloped) JSON response
/// ```ignore
/// backend_get!(Boot, BootEvent, url, KernelMetadataResponse, "Fetch latest kernel",
///     expect_json: KernelVersion
/// )
/// ```
///
/// Pattern 2: GET expecting a binary body
/// ```ignore
/// backend_get!(Boot, BootEvent, url, KernelDownloadResponse, "Kernel download",
///     expect_bytes
/// )
/// ```
#[macro_export]
macro_rules! backend_get {
    // Pattern 1: JSON response
    ($domain:ident, $domain_event:ident, $url:expr, $response_event:ident, $action:expr, expect_json: $response_type:ty) => {
        $crate::HttpCmd::get($url)
            .header("Accept", "application/json")
            .build()
            .then_send(|result| {
                let event_result: Result<$response_type, String> =
                    $crate::process_json_response($action, result);
                $crate::events::Event::$domain($crate::events::$domain_event::$response_event(
                    event_result,
                ))
            })
    };

    // Pattern 2: binary response
    ($domain:ident, $domain_event:ident, $url:expr, $response_event:ident, $action:expr, expect_bytes) => {
        $crate::HttpCmd::get($url).build().then_send(|result| {
            let event_result = $crate::process_bytes_response($action, result);
            $crate::events::Event::$domain($crate::events::$domain_event::$response_event(
                event_result,
            ))
        })
    };
}

/// Macro for backend POST requests with a JSON body.
/// A body that fails to serialize is reported through the response event.
///
/// # Patterns
///
/// Pattern 1: JSON body expecting a (possibly enveloped) JSON response
/// ```ignore
/// backend_post!(Boot, BootEvent, url, RegisterResponse, "Registration",
///     body_json: &request,
///     expect_json: RegistrationResult
/// )
/// ```
///
/// Pattern 2: JSON body expecting status only
/// ```ignore
/// backend_post!(Boot, BootEvent, url, InjectKeysResponse, "Key injection",
///     body_json: &request
/// )
/// ```
#[macro_export]
macro_rules! backend_post {
    // Pattern 1: JSON body expecting JSON response
    ($domain:ident, $domain_event:ident, $url:expr, $response_event:ident, $action:expr, body_json: $body:expr, expect_json: $response_type:ty) => {
        match $crate::HttpCmd::post($url)
            .header("Content-Type", "application/json")
            .body_json($body)
        {
            Ok(builder) => builder.build().then_send(|result| {
                let event_result: Result<$response_type, String> =
                    $crate::process_json_response($action, result);
                $crate::events::Event::$domain($crate::events::$domain_event::$response_event(
                    event_result,
                ))
            }),
            Err(e) => crux_core::Command::event($crate::events::Event::$domain(
                $crate::events::$domain_event::$response_event(Err(format!(
                    "Failed to create {} request: {}",
                    $action, e
                ))),
            )),
        }
    };

    // Pattern 2: JSON body expecting status only
    ($domain:ident, $domain_event:ident, $url:expr, $response_event:ident, $action:expr, body_json: $body:expr) => {
        match $crate::HttpCmd::post($url)
            .header("Content-Type", "application/json")
            .body_json($body)
        {
            Ok(builder) => builder.build().then_send(|result| {
                let event_result = $crate::process_status_response($action, result);
                $crate::events::Event::$domain($crate::events::$domain_event::$response_event(
                    event_result,
                ))
            }),
            Err(e) => crux_core::Command::event($crate::events::Event::$domain(
                $crate::events::$domain_event::$response_event(Err(format!(
                    "Failed to create {} request: {}",
                    $action, e
                ))),
            )),
        }
    };
}
