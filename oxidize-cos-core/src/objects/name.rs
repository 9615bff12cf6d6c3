use std::fmt;

/// A PDF name, stored decoded as a sequence of Unicode scalar values.
///
/// The leading `/` and any `#XX` escapes are syntax and never part of the
/// stored text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Name(String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Name(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of scalar values in the name.
    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decodes raw name bytes as UTF-8.
    ///
    /// Invalid or truncated sequences fall back to one scalar per byte, with
    /// the byte value as the scalar. The flag reports whether that happened.
    pub fn from_utf8_lenient(bytes: &[u8]) -> (Self, bool) {
        let mut text = String::with_capacity(bytes.len());
        let mut malformed = false;
        let mut rest = bytes;

        while !rest.is_empty() {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    text.push_str(valid);
                    break;
                }
                Err(err) => {
                    let (valid, invalid) = rest.split_at(err.valid_up_to());
                    text.push_str(&String::from_utf8_lossy(valid));
                    text.push(char::from(invalid[0]));
                    malformed = true;
                    rest = &invalid[1..];
                }
            }
        }

        (Name(text), malformed)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.0)
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Name(s.to_string())
    }
}

impl From<String> for Name {
    fn from(s: String) -> Self {
        Name(s)
    }
}

impl PartialEq<str> for Name {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Name {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_len_counts_scalars() {
        let name = Name::new("Ünïcode");
        assert_eq!(name.len(), 7);
        assert!(name.as_str().len() > 7);
    }

    #[test]
    fn test_valid_utf8() {
        let (name, malformed) = Name::from_utf8_lenient("Grüße".as_bytes());
        assert_eq!(name.as_str(), "Grüße");
        assert!(!malformed);
    }

    #[test]
    fn test_invalid_byte_falls_back_to_byte_value() {
        let (name, malformed) = Name::from_utf8_lenient(b"A\xE9B");
        assert!(malformed);
        assert_eq!(name.as_str(), "A\u{E9}B");
        assert_eq!(name.len(), 3);
    }

    #[test]
    fn test_truncated_sequence_consumes_one_byte() {
        // 0xE2 0x82 starts a three byte sequence that never finishes
        let (name, malformed) = Name::from_utf8_lenient(b"\xE2\x82");
        assert!(malformed);
        assert_eq!(name.as_str(), "\u{E2}\u{82}");
    }

    #[test]
    fn test_display_has_slash() {
        assert_eq!(Name::from("Type").to_string(), "/Type");
        assert_eq!(Name::from("Type"), "Type");
    }
}
