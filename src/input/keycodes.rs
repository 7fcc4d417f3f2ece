//! macOS virtual key codes (`kVK_*` from Carbon's `Events.h`).

pub type KeyCode = u16;

const KEY_TABLE: &[(&str, KeyCode)] = &[
    ("a", 0x00),
    ("s", 0x01),
    ("d", 0x02),
    ("f", 0x03),
    ("h", 0x04),
    ("g", 0x05),
    ("z", 0x06),
    ("x", 0x07),
    ("c", 0x08),
    ("v", 0x09),
    ("b", 0x0B),
    ("q", 0x0C),
    ("w", 0x0D),
    ("e", 0x0E),
    ("r", 0x0F),
    ("y", 0x10),
    ("t", 0x11),
    ("1", 0x12),
    ("2", 0x13),
    ("3", 0x14),
    ("4", 0x15),
    ("6", 0x16),
    ("5", 0x17),
    ("9", 0x19),
    ("7", 0x1A),
    ("8", 0x1C),
    ("0", 0x1D),
    ("o", 0x1F),
    ("u", 0x20),
    ("i", 0x22),
    ("p", 0x23),
    ("return", 0x24),
    ("l", 0x25),
    ("j", 0x26),
    ("k", 0x28),
    ("n", 0x2D),
    ("m", 0x2E),
    ("tab", 0x30),
    ("space", 0x31),
    ("delete", 0x33),
    ("escape", 0x35),
];

/// Looks up a logical key name, ignoring case.
pub fn key_code(name: &str) -> Option<KeyCode> {
    let lowered = name.to_lowercase();
    KEY_TABLE
        .iter()
        .find(|(key, _)| *key == lowered)
        .map(|(_, code)| *code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letters_digits_and_named_keys() {
        assert_eq!(key_code("w"), Some(0x0D));
        assert_eq!(key_code("A"), Some(0x00));
        assert_eq!(key_code("1"), Some(0x12));
        assert_eq!(key_code("0"), Some(0x1D));
        assert_eq!(key_code("space"), Some(0x31));
        assert_eq!(key_code("Escape"), Some(0x35));
    }

    #[test]
    fn test_every_letter_and_digit_is_mapped() {
        for ch in ('a'..='z').chain('0'..='9') {
            assert!(key_code(&ch.to_string()).is_some(), "missing key {ch}");
        }
    }

    #[test]
    fn test_unknown_symbols() {
        assert_eq!(key_code("@"), None);
        assert_eq!(key_code(""), None);
        assert_eq!(key_code("f13"), None);
    }
}
