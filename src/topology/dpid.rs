//! Switch identifier (datapath id) codec.
//!
//! The controller sends datapath ids as zero-padded hex strings and port
//! numbers as zero-padded fields. Equality is always decided on the decoded
//! integer, so `"000000000000000a"` and `"a"` name the same switch.

/// Width of a datapath id on the wire, in hex digits.
pub const DPID_WIDTH: usize = 16;

/// Decode a base-16 datapath id. Returns `None` for empty or non-hex input.
pub fn decode_switch_id(hex: &str) -> Option<u64> {
	let hex = hex.trim();
	if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
		return None;
	}
	u64::from_str_radix(hex, 16).ok()
}

/// Encode a datapath id in the controller's fixed-width form.
pub fn encode_switch_id(id: u64) -> String {
	format!("{id:0width$x}", width = DPID_WIDTH)
}

/// Strip the zero padding from a display field. Anything after the leading
/// zeros is returned untouched; an all-zero field becomes empty.
pub fn format_switch_id(text: &str) -> &str {
	text.trim_start_matches('0')
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn leading_zeros_do_not_affect_identity() {
		assert_eq!(decode_switch_id("0000000000000001"), Some(1));
		assert_eq!(decode_switch_id("1"), decode_switch_id("0001"));
		assert_eq!(decode_switch_id("000000000000001f"), Some(31));
	}

	#[test]
	fn malformed_ids_decode_to_none() {
		assert_eq!(decode_switch_id(""), None);
		assert_eq!(decode_switch_id("zz"), None);
		assert_eq!(decode_switch_id("+1"), None);
		assert_eq!(decode_switch_id("0x1"), None);
	}

	#[test]
	fn encode_pads_to_wire_width() {
		assert_eq!(encode_switch_id(10), "000000000000000a");
		assert_eq!(decode_switch_id(&encode_switch_id(u64::MAX)), Some(u64::MAX));
	}

	#[test]
	fn format_strips_only_leading_zeros() {
		assert_eq!(format_switch_id("00000003"), "3");
		assert_eq!(format_switch_id("00000010"), "10");
		assert_eq!(format_switch_id("10.0.0.1"), "10.0.0.1");
		assert_eq!(format_switch_id("0000"), "");
		assert_eq!(format_switch_id("eth0"), "eth0");
	}
}
