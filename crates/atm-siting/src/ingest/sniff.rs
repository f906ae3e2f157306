use serde::Serialize;
use std::fmt;

/// Bytes inspected when guessing the field separator.
pub(crate) const SNIFF_BYTES: usize = 4096;

/// Pick the field separator from the head of the file: tab, then semicolon,
/// otherwise comma.
pub(crate) fn detect_delimiter(bytes: &[u8]) -> u8 {
    let head = &bytes[..bytes.len().min(SNIFF_BYTES)];
    if head.contains(&b'\t') {
        b'\t'
    } else if head.contains(&b';') {
        b';'
    } else {
        b','
    }
}

// WHATWG maps these to C1 controls; the Microsoft code page leaves them unassigned.
const CP1252_UNDEFINED: [u8; 5] = [0x81, 0x8D, 0x8F, 0x90, 0x9D];

/// Text encodings tried, in order, until one decodes and parses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextEncoding {
    #[serde(rename = "utf-8-sig")]
    Utf8Sig,
    #[serde(rename = "windows-1252")]
    Windows1252,
    #[serde(rename = "latin-1")]
    Latin1,
}

impl TextEncoding {
    pub const FALLBACK_ORDER: [TextEncoding; 3] = [
        TextEncoding::Utf8Sig,
        TextEncoding::Windows1252,
        TextEncoding::Latin1,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TextEncoding::Utf8Sig => "utf-8-sig",
            TextEncoding::Windows1252 => "windows-1252",
            TextEncoding::Latin1 => "latin-1",
        }
    }

    /// Strictly decode `bytes`; any byte the encoding cannot map is an error.
    pub(crate) fn decode(&self, bytes: &[u8]) -> Result<String, String> {
        match self {
            TextEncoding::Utf8Sig => {
                let body = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
                std::str::from_utf8(body)
                    .map(str::to_owned)
                    .map_err(|err| err.to_string())
            }
            TextEncoding::Windows1252 => {
                if let Some(position) = bytes.iter().position(|b| CP1252_UNDEFINED.contains(b)) {
                    return Err(format!(
                        "byte 0x{:02X} at offset {} is undefined in windows-1252",
                        bytes[position], position
                    ));
                }
                encoding_rs::WINDOWS_1252
                    .decode_without_bom_handling_and_without_replacement(bytes)
                    .map(|text| text.into_owned())
                    .ok_or_else(|| "byte sequence not mapped by windows-1252".to_string())
            }
            // ISO-8859-1 maps every byte to the code point of the same value.
            TextEncoding::Latin1 => Ok(bytes.iter().map(|&byte| byte as char).collect()),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A failed decoding strategy, kept for the final error message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodingAttempt {
    pub encoding: TextEncoding,
    pub reason: String,
}

impl fmt::Display for EncodingAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.encoding, self.reason)
    }
}
