//! Outbound call placement
//!
//! Dial strings are validated against a permissive phone number pattern and
//! normalised to a `tel:` URI before the call manager creates the call. An
//! invalid destination never fails the caller; it is reported as a
//! [`ErrorType::CallError`] on the event surface instead.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, warn};

use crate::call::{Call, CallDetails, CallDirection, CorrelationId};
use crate::error::{CallingClientError, ErrorContext, ErrorType, MobiusStatus};
use crate::events::CallingClientEvent;

use super::CallingClient;

/// Characters a dial string may consist of
static VALID_PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\d\s()*#+.-]+$").expect("valid phone regex"));

const CALLING_CLIENT_FILE: &str = "calling_client";
const MAKE_CALL: &str = "make_call";

/// Validate a dial string and turn it into a `tel:` URI
///
/// Only digits, `*`, `+` and `#` survive normalisation.
///
/// ```rust
/// use rvoip_calling_client::client::calls::normalize_dial_string;
///
/// assert_eq!(
///     normalize_dial_string("+1 (415) 555-0100").as_deref(),
///     Some("tel:+14155550100")
/// );
/// assert_eq!(normalize_dial_string("abc123"), None);
/// ```
pub fn normalize_dial_string(address: &str) -> Option<String> {
    if !VALID_PHONE.is_match(address) {
        return None;
    }

    let digits: String = address
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '*' | '+' | '#'))
        .collect();

    Some(format!("tel:{}", digits))
}

impl CallingClient {
    /// Place an outbound call
    ///
    /// Returns `None` without side effects when `dest` is `None`. An invalid
    /// dial string, or a client without a line, publishes a
    /// [`CallingClientEvent::Error`] and returns `None`.
    pub fn make_call(&self, dest: Option<&CallDetails>) -> Option<Arc<dyn Call>> {
        let dest = dest?;

        let Some(line) = self.lines.primary() else {
            warn!("Cannot place a call before a line exists");
            self.emit_call_error("No line is available to place the call. Wait for registration and try again.");
            return None;
        };

        let Some(address) = normalize_dial_string(&dest.address) else {
            warn!("Invalid phone number detected");
            self.emit_call_error("An invalid phone number was detected. Check the number and try again.");
            return None;
        };

        let formatted = CallDetails::new(dest.call_type, address);
        let device_id = line.registration().get_device_info().device_id();

        let call = self
            .context
            .call_manager
            .create_call(&formatted, CallDirection::Outbound, device_id);
        info!(call_id = %call.call_id(), "New call created");

        Some(call)
    }

    /// Look up a call by correlation id
    pub fn get_call(&self, correlation_id: &CorrelationId) -> Option<Arc<dyn Call>> {
        self.context.call_manager.get_call(correlation_id)
    }

    fn emit_call_error(&self, message: &str) {
        let err = CallingClientError::new(
            message,
            ErrorContext::new(CALLING_CLIENT_FILE, MAKE_CALL),
            ErrorType::CallError,
            MobiusStatus::Active,
        );
        self.emitter.emit(CallingClientEvent::Error(err));
    }
}
