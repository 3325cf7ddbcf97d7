//! Serializer: document model to wire bytes.

mod serde;

pub use self::serde::{to_bson, to_document, Serializer};

use crate::{
    bson::{fits_in_i32, Binary, Bson, DbRef, JavaScriptCodeWithScope, Regex, Timestamp},
    buffer::ByteBuffer,
    document::Document,
    error::{Error, ErrorKind, Result},
    spec::{BinarySubtype, ElementType, MAX_DOCUMENT_SIZE},
    utf8::{check_string, StringCheck},
};

/// Encodes a document into BSON bytes.
///
/// With `check_keys` set, every key in this document and all nested
/// documents must not begin with `$` and must not contain `.`; violations
/// fail with an invalid-key error.
///
/// With `move_id` set, a top-level `_id` field is emitted first regardless
/// of its position in the document, and skipped when the traversal reaches
/// its original position. Nested documents always keep their own order.
///
/// Fails if the encoded document exceeds 4 MiB.
///
/// ```rust
/// use mongo_bson::{doc, serialize};
///
/// let bytes = serialize(&doc! { "a" => 1 }, false, false).unwrap();
/// assert_eq!(
///     bytes,
///     [0x0C, 0, 0, 0, 0x10, b'a', 0, 1, 0, 0, 0, 0],
/// );
/// ```
pub fn serialize(doc: &Document, check_keys: bool, move_id: bool) -> Result<Vec<u8>> {
    let mut buffer = ByteBuffer::new();
    write_document(&mut buffer, doc, check_keys, move_id)?;

    if buffer.position() > MAX_DOCUMENT_SIZE {
        return Err(Error::document_too_large(buffer.position()));
    }

    Ok(buffer.into_vec())
}

// One document: reserved length prefix, elements, NUL terminator, then the
// length is patched in. `move_id` is only ever true for the top level.
pub(crate) fn write_document(
    buffer: &mut ByteBuffer,
    doc: &Document,
    check_keys: bool,
    move_id: bool,
) -> Result<()> {
    let start = buffer.position();
    let length_slot = buffer.reserve_len(4)?;

    let allow_id = !move_id;
    if move_id {
        if let Some(id) = doc.get("_id") {
            write_element(buffer, "_id", id, check_keys, true)?;
        }
    }

    for (key, value) in doc {
        write_element(buffer, key, value, check_keys, allow_id)?;
    }

    buffer.push(0)?;
    let length = (buffer.position() - start) as i32;
    buffer.patch(length_slot, &length.to_le_bytes());
    Ok(())
}

fn write_element(
    buffer: &mut ByteBuffer,
    key: &str,
    value: &Bson,
    check_keys: bool,
    allow_id: bool,
) -> Result<()> {
    if !allow_id && key == "_id" {
        return Ok(());
    }

    if check_keys {
        if key.starts_with('$') {
            return Err(
                Error::invalid_key(format!("key \"{key}\" must not start with '$'")).with_key(key),
            );
        }
        if key.contains('.') {
            return Err(
                Error::invalid_key(format!("key \"{key}\" must not contain '.'")).with_key(key),
            );
        }
    }

    buffer.push(value.element_type() as u8)?;
    write_cstring(buffer, key).map_err(|e| e.with_key(key))?;
    write_value(buffer, value, check_keys)
}

fn write_value(buffer: &mut ByteBuffer, value: &Bson, check_keys: bool) -> Result<()> {
    match value {
        Bson::Double(v) => buffer.append(&v.to_le_bytes()),
        Bson::String(s) | Bson::JavaScriptCode(s) | Bson::Symbol(s) => write_string(buffer, s),
        Bson::Array(values) => write_array(buffer, values, check_keys),
        Bson::Document(doc) => write_document(buffer, doc, check_keys, false),
        Bson::Boolean(v) => buffer.push(if *v { 0x01 } else { 0x00 }),
        Bson::Null | Bson::MinKey | Bson::MaxKey => Ok(()),
        Bson::RegularExpression(Regex { pattern, options }) => {
            write_cstring(buffer, pattern)?;

            // Flag letters go out sorted; sorting the chars rather than the
            // raw bytes keeps multi-byte letters intact.
            match check_string(options.as_bytes(), false) {
                StringCheck::Valid => {}
                StringCheck::HasNull => {
                    return Err(Error::invalid_document(
                        "regex options cannot contain a NUL byte",
                    ))
                }
                StringCheck::NotUtf8 => return Err(ErrorKind::Utf8Encoding.into()),
            }
            let mut flags: Vec<char> = options.chars().collect();
            flags.sort_unstable();
            let sorted: String = flags.into_iter().collect();
            buffer.append(sorted.as_bytes())?;
            buffer.push(0)
        }
        Bson::JavaScriptCodeWithScope(JavaScriptCodeWithScope { code, scope }) => {
            let start = buffer.position();
            let length_slot = buffer.reserve_len(4)?;

            write_string(buffer, code)?;
            write_document(buffer, scope, false, false)?;

            let length = (buffer.position() - start) as i32;
            buffer.patch(length_slot, &length.to_le_bytes());
            Ok(())
        }
        Bson::Integer(v) => {
            if fits_in_i32(*v) {
                buffer.append(&(*v as i32).to_le_bytes())
            } else {
                buffer.append(&v.to_le_bytes())
            }
        }
        Bson::Timestamp(Timestamp { time, increment }) => {
            buffer.append(&increment.to_le_bytes())?;
            buffer.append(&time.to_le_bytes())
        }
        Bson::Binary(Binary { subtype, bytes }) => {
            // The deprecated subtype 2 wraps the payload in a second length
            // prefix counted by the outer one.
            let length = if *subtype == BinarySubtype::BinaryOld {
                bytes.len() + 4
            } else {
                bytes.len()
            };

            buffer.append(&(length as i32).to_le_bytes())?;
            buffer.push(u8::from(*subtype))?;

            if *subtype == BinarySubtype::BinaryOld {
                buffer.append(&(bytes.len() as i32).to_le_bytes())?;
            }

            buffer.append(bytes)
        }
        Bson::ObjectId(id) => buffer.append(&id.bytes()),
        Bson::DateTime(datetime) => buffer.append(&datetime.timestamp_millis().to_le_bytes()),
        Bson::DbRef(DbRef { namespace, id }) => {
            let start = buffer.position();
            let length_slot = buffer.reserve_len(4)?;

            // The reference keys start with `$`, so key checking is off for
            // the synthesized document.
            buffer.push(ElementType::String as u8)?;
            write_cstring(buffer, "$ref")?;
            write_string(buffer, namespace)?;
            write_element(buffer, "$id", id, false, true)?;

            buffer.push(0)?;
            let length = (buffer.position() - start) as i32;
            buffer.patch(length_slot, &length.to_le_bytes());
            Ok(())
        }
    }
}

// Arrays are documents keyed by decimal indices "0", "1", …
fn write_array(buffer: &mut ByteBuffer, values: &[Bson], check_keys: bool) -> Result<()> {
    let start = buffer.position();
    let length_slot = buffer.reserve_len(4)?;

    for (index, value) in values.iter().enumerate() {
        write_element(buffer, &index.to_string(), value, check_keys, true)
            .map_err(|e| e.with_index(index))?;
    }

    buffer.push(0)?;
    let length = (buffer.position() - start) as i32;
    buffer.patch(length_slot, &length.to_le_bytes());
    Ok(())
}

// Length-prefixed string: i32 length counting the trailing NUL, bytes, NUL.
// Interior NUL bytes are tolerated here; keys and regex patterns go through
// `write_cstring` instead.
fn write_string(buffer: &mut ByteBuffer, s: &str) -> Result<()> {
    if check_string(s.as_bytes(), true) == StringCheck::NotUtf8 {
        return Err(ErrorKind::Utf8Encoding.into());
    }

    buffer.append(&(s.len() as i32 + 1).to_le_bytes())?;
    buffer.append(s.as_bytes())?;
    buffer.push(0)
}

// NUL-terminated string, used for keys and regex patterns; an interior NUL
// would corrupt the framing.
fn write_cstring(buffer: &mut ByteBuffer, s: &str) -> Result<()> {
    match check_string(s.as_bytes(), false) {
        StringCheck::Valid => {}
        StringCheck::HasNull => {
            return Err(Error::invalid_document(
                "key names and regex patterns cannot contain a NUL byte",
            ))
        }
        StringCheck::NotUtf8 => return Err(ErrorKind::Utf8Encoding.into()),
    }

    buffer.append(s.as_bytes())?;
    buffer.push(0)
}
