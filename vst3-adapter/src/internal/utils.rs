//! Internal utility functions

use vst3::Steinberg::Vst::{String128, TChar};

/// Convert a NUL-terminated C char array to a Rust String
pub fn c_str_to_string<C: Copy + Into<i32>>(c_str: &[C]) -> String {
    let bytes: Vec<u8> = c_str
        .iter()
        .map(|&c| Into::<i32>::into(c) as u8)
        .take_while(|&b| b != 0)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Convert VST3 String128 (UTF-16) to Rust String
pub fn vst_string_to_string(vst_str: &String128) -> String {
    let utf16: Vec<u16> = vst_str
        .iter()
        .map(|&ch| ch as u16)
        .take_while(|&ch| ch != 0)
        .collect();
    String::from_utf16_lossy(&utf16)
}

/// Convert Rust String to VST3 String128, truncating to 127 code units
pub fn string_to_vst_string(s: &str) -> String128 {
    let mut result: String128 = [0; 128];
    for (slot, ch) in result.iter_mut().zip(s.encode_utf16().take(127)) {
        *slot = ch as TChar;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn c_string_stops_at_nul() {
        let raw: [i8; 8] = [b'G' as i8, b'a' as i8, b'i' as i8, b'n' as i8, 0, b'x' as i8, 0, 0];
        assert_eq!(c_str_to_string(&raw), "Gain");
    }

    #[test]
    fn c_string_without_nul_uses_whole_slice() {
        let raw: [u8; 3] = *b"Amp";
        assert_eq!(c_str_to_string(&raw), "Amp");
    }

    #[test]
    fn vst_string_round_trips_host_name() {
        let encoded = string_to_vst_string("vst3-adapter");
        assert_eq!(vst_string_to_string(&encoded), "vst3-adapter");
    }

    #[test]
    fn long_strings_keep_terminator() {
        let long = "x".repeat(300);
        let encoded = string_to_vst_string(&long);
        assert_eq!(encoded[127], 0);
        assert_eq!(vst_string_to_string(&encoded).len(), 127);
    }
}
