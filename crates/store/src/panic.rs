use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

/// Runs `f`, converting a panic into its rendered message.
///
/// Wraps every call into reducers, subscribers, middleware and plugin hooks.
pub fn contain<R>(f: impl FnOnce() -> R) -> Result<R, String> {
	catch_unwind(AssertUnwindSafe(f)).map_err(|payload| panic_message(payload.as_ref()))
}

/// Extracts a human readable message from a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
	if let Some(msg) = payload.downcast_ref::<&'static str>() {
		(*msg).to_string()
	} else if let Some(msg) = payload.downcast_ref::<String>() {
		msg.clone()
	} else {
		"non-string panic payload".to_string()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn extracts_static_str_payload() {
		let msg = contain(|| panic!("boom-str")).unwrap_err();
		assert!(msg.contains("boom-str"), "expected 'boom-str', got: {msg}");
	}

	#[test]
	fn extracts_string_payload() {
		let msg = contain(|| panic!("{}", String::from("boom-string"))).unwrap_err();
		assert!(msg.contains("boom-string"), "expected 'boom-string', got: {msg}");
	}

	#[test]
	fn passes_value_through() {
		assert_eq!(contain(|| 41 + 1), Ok(42));
	}

	#[test]
	fn opaque_payload_has_placeholder() {
		let msg = contain(|| std::panic::panic_any(7_u8)).unwrap_err();
		assert_eq!(msg, "non-string panic payload");
	}
}
