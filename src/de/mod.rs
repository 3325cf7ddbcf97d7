//! Deserializer: wire bytes to document model.

mod serde;

pub use self::serde::{from_bson, from_document, Deserializer};

use chrono::{TimeZone, Utc};

use crate::{
    bson::{Binary, Bson, DbRef, JavaScriptCodeWithScope, Regex, Timestamp},
    document::Document,
    error::{Error, ErrorKind, Result},
    oid::ObjectId,
    spec::{BinarySubtype, ElementType},
};

/// The smallest well-formed document: a length prefix and a terminator.
const MIN_DOCUMENT_SIZE: usize = 5;

/// Decodes one BSON document from `bytes`.
///
/// The declared document length must cover the input slice exactly; each
/// call handles exactly one top-level document. Malformed input — length
/// mismatches, truncation, missing terminators, unknown tags — fails with
/// an error and never panics.
///
/// ```rust
/// use mongo_bson::{deserialize, doc};
///
/// let doc = deserialize(&[5, 0, 0, 0, 0]).unwrap();
/// assert_eq!(doc, doc! {});
/// ```
pub fn deserialize(bytes: &[u8]) -> Result<Document> {
    let mut pos = 0;
    let doc = read_document(bytes, &mut pos)?;

    if pos != bytes.len() {
        return Err(Error::malformed(format!(
            "trailing input: document ends at byte {} of {}",
            pos,
            bytes.len()
        )));
    }

    Ok(doc)
}

fn read_u8(bytes: &[u8], pos: &mut usize) -> Result<u8> {
    let byte = *bytes.get(*pos).ok_or(ErrorKind::EndOfStream)?;
    *pos += 1;
    Ok(byte)
}

fn read_slice<'a>(bytes: &'a [u8], pos: &mut usize, len: usize) -> Result<&'a [u8]> {
    let end = pos.checked_add(len).ok_or(ErrorKind::EndOfStream)?;
    let slice = bytes.get(*pos..end).ok_or(ErrorKind::EndOfStream)?;
    *pos = end;
    Ok(slice)
}

fn read_i32(bytes: &[u8], pos: &mut usize) -> Result<i32> {
    let raw = read_slice(bytes, pos, 4)?;
    Ok(i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

fn read_u32(bytes: &[u8], pos: &mut usize) -> Result<u32> {
    let raw = read_slice(bytes, pos, 4)?;
    Ok(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

fn read_i64(bytes: &[u8], pos: &mut usize) -> Result<i64> {
    let raw = read_slice(bytes, pos, 8)?;
    Ok(i64::from_le_bytes([
        raw[0], raw[1], raw[2], raw[3], raw[4], raw[5], raw[6], raw[7],
    ]))
}

fn read_f64(bytes: &[u8], pos: &mut usize) -> Result<f64> {
    let raw = read_slice(bytes, pos, 8)?;
    Ok(f64::from_le_bytes([
        raw[0], raw[1], raw[2], raw[3], raw[4], raw[5], raw[6], raw[7],
    ]))
}

// NUL-terminated string.
fn read_cstring<'a>(bytes: &'a [u8], pos: &mut usize) -> Result<&'a str> {
    let remainder = bytes.get(*pos..).ok_or(ErrorKind::EndOfStream)?;
    let nul = remainder
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| Error::malformed("cstring is missing its NUL terminator"))?;

    let s = std::str::from_utf8(&remainder[..nul]).map_err(|_| ErrorKind::Utf8Encoding)?;
    *pos += nul + 1;
    Ok(s)
}

// Length-prefixed string: the declared length counts the trailing NUL.
fn read_string(bytes: &[u8], pos: &mut usize) -> Result<String> {
    let len = read_i32(bytes, pos)?;
    if len < 1 {
        return Err(Error::malformed(format!("invalid string length {len}")));
    }

    let raw = read_slice(bytes, pos, len as usize)?;
    let (payload, terminator) = raw.split_at(len as usize - 1);
    if terminator[0] != 0 {
        return Err(Error::malformed("string is missing its NUL terminator"));
    }

    let s = std::str::from_utf8(payload).map_err(|_| ErrorKind::Utf8Encoding)?;
    Ok(s.to_owned())
}

fn read_oid_bytes(bytes: &[u8], pos: &mut usize) -> Result<ObjectId> {
    let raw = read_slice(bytes, pos, 12)?;
    let mut id = [0; 12];
    id.copy_from_slice(raw);
    Ok(ObjectId::with_bytes(id))
}

// One document region: validates that the declared size fits the input and
// that the element stream ends exactly on the terminator.
fn read_document(bytes: &[u8], pos: &mut usize) -> Result<Document> {
    let (start, end) = read_document_frame(bytes, pos)?;

    let mut doc = Document::new();
    loop {
        let tag = read_u8(bytes, pos)?;
        if tag == 0x00 {
            break;
        }

        let key = read_cstring(bytes, pos)?.to_owned();
        let value = read_value(bytes, pos, tag, &key)?;
        doc.insert(key, value);

        if *pos >= end {
            return Err(Error::malformed("document is missing its terminator"));
        }
    }

    check_frame_consumed(start, end, *pos, "document")?;
    Ok(doc)
}

fn read_document_frame(bytes: &[u8], pos: &mut usize) -> Result<(usize, usize)> {
    let start = *pos;
    let size = read_i32(bytes, pos)?;
    if size < MIN_DOCUMENT_SIZE as i32 {
        return Err(Error::malformed(format!("document length {size} is too small")));
    }

    let end = start
        .checked_add(size as usize)
        .filter(|&end| end <= bytes.len())
        .ok_or(ErrorKind::EndOfStream)?;
    Ok((start, end))
}

fn check_frame_consumed(start: usize, end: usize, pos: usize, what: &str) -> Result<()> {
    if pos != end {
        return Err(Error::malformed(format!(
            "{what} declares {} bytes but its elements span {}",
            end - start,
            pos - start
        )));
    }
    Ok(())
}

// Arrays share the document framing; the decimal index keys are read and
// discarded, only the value order matters.
fn read_array(bytes: &[u8], pos: &mut usize) -> Result<Vec<Bson>> {
    let (start, end) = read_document_frame(bytes, pos)?;

    let mut values = Vec::new();
    loop {
        let tag = read_u8(bytes, pos)?;
        if tag == 0x00 {
            break;
        }

        let key = read_cstring(bytes, pos)?.to_owned();
        let value = read_value(bytes, pos, tag, &key)?;
        values.push(value);

        if *pos >= end {
            return Err(Error::malformed("array is missing its terminator"));
        }
    }

    check_frame_consumed(start, end, *pos, "array")?;
    Ok(values)
}

// An embedded document whose first key is `$ref` is surfaced as a DbRef.
fn read_embedded_document(bytes: &[u8], pos: &mut usize) -> Result<Bson> {
    let doc = read_document(bytes, pos)?;

    if let Some((first_key, Bson::String(namespace))) = doc.iter().next() {
        if first_key == "$ref" {
            let id = doc.get("$id").cloned().unwrap_or(Bson::Null);
            return Ok(Bson::DbRef(DbRef {
                namespace: namespace.clone(),
                id: Box::new(id),
            }));
        }
    }

    Ok(Bson::Document(doc))
}

fn read_binary(bytes: &[u8], pos: &mut usize) -> Result<Binary> {
    let len = read_i32(bytes, pos)?;
    if len < 0 {
        return Err(Error::malformed(format!("invalid binary length {len}")));
    }

    let subtype = BinarySubtype::from(read_u8(bytes, pos)?);

    let payload = if subtype == BinarySubtype::BinaryOld {
        if len < 4 {
            return Err(Error::malformed(format!(
                "binary subtype 2 length {len} cannot hold its inner length"
            )));
        }
        let inner = read_i32(bytes, pos)?;
        if inner != len - 4 {
            return Err(Error::malformed(format!(
                "binary subtype 2 inner length {inner} does not match outer length {len}"
            )));
        }
        read_slice(bytes, pos, inner as usize)?
    } else {
        read_slice(bytes, pos, len as usize)?
    };

    Ok(Binary {
        subtype,
        bytes: payload.to_vec(),
    })
}

fn read_value(bytes: &[u8], pos: &mut usize, tag: u8, key: &str) -> Result<Bson> {
    match ElementType::from(tag) {
        Some(ElementType::Double) => Ok(Bson::Double(read_f64(bytes, pos)?)),
        Some(ElementType::String) => Ok(Bson::String(read_string(bytes, pos)?)),
        Some(ElementType::EmbeddedDocument) => read_embedded_document(bytes, pos),
        Some(ElementType::Array) => Ok(Bson::Array(read_array(bytes, pos)?)),
        Some(ElementType::Binary) => Ok(Bson::Binary(read_binary(bytes, pos)?)),
        // Deprecated; nothing meaningful to surface.
        Some(ElementType::Undefined) => Ok(Bson::Null),
        Some(ElementType::ObjectId) => Ok(Bson::ObjectId(read_oid_bytes(bytes, pos)?)),
        Some(ElementType::Boolean) => Ok(Bson::Boolean(read_u8(bytes, pos)? != 0)),
        Some(ElementType::DateTime) => {
            let millis = read_i64(bytes, pos)?;
            let datetime = Utc
                .timestamp_millis_opt(millis)
                .single()
                .ok_or_else(|| Error::malformed(format!("datetime {millis} ms is out of range")))?;
            Ok(Bson::DateTime(datetime))
        }
        Some(ElementType::Null) => Ok(Bson::Null),
        Some(ElementType::RegularExpression) => {
            let pattern = read_cstring(bytes, pos)?.to_owned();
            let options = read_cstring(bytes, pos)?.to_owned();
            Ok(Bson::RegularExpression(Regex { pattern, options }))
        }
        // Deprecated namespace/id pair; decoded to the DbRef it denotes.
        Some(ElementType::DbPointer) => {
            let namespace = read_string(bytes, pos)?;
            let id = read_oid_bytes(bytes, pos)?;
            Ok(Bson::DbRef(DbRef {
                namespace,
                id: Box::new(Bson::ObjectId(id)),
            }))
        }
        Some(ElementType::JavaScriptCode) => Ok(Bson::JavaScriptCode(read_string(bytes, pos)?)),
        Some(ElementType::Symbol) => Ok(Bson::Symbol(read_string(bytes, pos)?)),
        Some(ElementType::JavaScriptCodeWithScope) => {
            let start = *pos;
            let total = read_i32(bytes, pos)?;
            if total < 4 {
                return Err(Error::malformed(format!(
                    "invalid code-with-scope length {total}"
                )));
            }

            let code = read_string(bytes, pos)?;
            let scope = read_document(bytes, pos)?;

            check_frame_consumed(start, start + total as usize, *pos, "code with scope")?;
            Ok(Bson::JavaScriptCodeWithScope(JavaScriptCodeWithScope {
                code,
                scope,
            }))
        }
        Some(ElementType::Int32) => Ok(Bson::Integer(i64::from(read_i32(bytes, pos)?))),
        Some(ElementType::Timestamp) => {
            let increment = read_u32(bytes, pos)?;
            let time = read_u32(bytes, pos)?;
            Ok(Bson::Timestamp(Timestamp { time, increment }))
        }
        Some(ElementType::Int64) => Ok(Bson::Integer(read_i64(bytes, pos)?)),
        Some(ElementType::MaxKey) => Ok(Bson::MaxKey),
        Some(ElementType::MinKey) => Ok(Bson::MinKey),
        None => Err(ErrorKind::UnrecognizedElementType {
            key: key.to_owned(),
            element_type: tag,
        }
        .into()),
    }
}
