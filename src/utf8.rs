//! String classification for wire safety.

/// Outcome of classifying a byte range destined for the wire.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum StringCheck {
    /// Valid UTF-8 satisfying the NUL policy.
    Valid,
    /// A 0x00 byte appeared where the caller forbade one.
    HasNull,
    /// Not a valid UTF-8 sequence.
    NotUtf8,
}

/// Classifies `bytes` as wire-safe UTF-8.
///
/// Key names and regex patterns are written as NUL-terminated cstrings, so
/// they must be checked with `allow_null` false; length-prefixed strings
/// tolerate interior NUL bytes and pass `allow_null` true.
pub(crate) fn check_string(bytes: &[u8], allow_null: bool) -> StringCheck {
    if !allow_null && bytes.contains(&0) {
        return StringCheck::HasNull;
    }

    if std::str::from_utf8(bytes).is_err() {
        return StringCheck::NotUtf8;
    }

    StringCheck::Valid
}
