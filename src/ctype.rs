//! ASCII character classes, as CommonMark defines them.

#[inline]
pub fn isspace(ch: u8) -> bool {
    matches!(ch, b'\t' | b'\n' | 0x0b | 0x0c | b'\r' | b' ')
}

#[inline]
pub fn ispunct(ch: u8) -> bool {
    ch.is_ascii_punctuation()
}

#[inline]
pub fn isdigit(ch: u8) -> bool {
    ch.is_ascii_digit()
}

#[inline]
pub fn isxdigit(ch: u8) -> bool {
    ch.is_ascii_hexdigit()
}

#[inline]
pub fn isalpha(ch: u8) -> bool {
    ch.is_ascii_alphabetic()
}

#[inline]
pub fn isalnum(ch: u8) -> bool {
    ch.is_ascii_alphanumeric()
}
