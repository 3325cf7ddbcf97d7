//! BSON value representation.

use std::fmt::{self, Display};

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};

use crate::{
    document::Document,
    error::{Error, ErrorKind},
    oid::ObjectId,
    spec::{BinarySubtype, ElementType},
};

/// Possible BSON value types.
///
/// Integers are carried in a single [`Bson::Integer`] variant; the
/// serializer picks the narrowest wire encoding per value and the
/// deserializer promotes both widths back, so integer values survive a
/// round trip unchanged.
#[derive(Clone, Debug, PartialEq)]
pub enum Bson {
    /// 64-bit floating point.
    Double(f64),
    /// UTF-8 string.
    String(String),
    /// Array of values.
    Array(Array),
    /// Embedded document.
    Document(Document),
    /// Boolean.
    Boolean(bool),
    /// Null.
    Null,
    /// Regular expression with its flag letters.
    RegularExpression(Regex),
    /// JavaScript source.
    JavaScriptCode(String),
    /// JavaScript source paired with a binding scope.
    JavaScriptCodeWithScope(JavaScriptCodeWithScope),
    /// 64-bit signed integer.
    Integer(i64),
    /// Internal MongoDB replication timestamp.
    Timestamp(Timestamp),
    /// Binary payload with a subtype marker.
    Binary(Binary),
    /// 12-byte object identifier.
    ObjectId(ObjectId),
    /// UTC datetime with millisecond precision.
    DateTime(DateTime<Utc>),
    /// Symbol (deprecated string flavor, kept distinct for fidelity).
    Symbol(String),
    /// Reference to a document in another namespace.
    DbRef(DbRef),
    /// Sentinel ordering below all other values.
    MinKey,
    /// Sentinel ordering above all other values.
    MaxKey,
}

/// Alias for `Vec<Bson>`.
pub type Array = Vec<Bson>;

/// A binary payload and its subtype byte.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Binary {
    pub subtype: BinarySubtype,
    pub bytes: Vec<u8>,
}

/// A regular expression: pattern plus flag letters.
///
/// The flag letters `i`, `m` and `x` carry the usual meanings; any other
/// letters are preserved verbatim. The serializer emits the letters in
/// sorted order regardless of how they are stored here.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Regex {
    pub pattern: String,
    pub options: String,
}

/// JavaScript source with the document of variable bindings it closes over.
#[derive(Clone, Debug, PartialEq)]
pub struct JavaScriptCodeWithScope {
    pub code: String,
    pub scope: Document,
}

/// Two 32-bit words used internally by MongoDB replication.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Timestamp {
    /// Seconds since the Unix epoch.
    pub time: u32,
    /// Ordinal within the second.
    pub increment: u32,
}

/// A reference to a document in another namespace.
///
/// Decoded both from embedded documents whose first key is `$ref` and from
/// the deprecated DBPointer wire form; always re-encoded as an embedded
/// `{"$ref": …, "$id": …}` document.
#[derive(Clone, Debug, PartialEq)]
pub struct DbRef {
    pub namespace: String,
    pub id: Box<Bson>,
}

/// Whether an integer value fits the 32-bit wire encoding.
pub(crate) fn fits_in_i32(value: i64) -> bool {
    i64::from(i32::MIN) <= value && value <= i64::from(i32::MAX)
}

impl Display for Bson {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bson::Double(v) => write!(fmt, "{}", v),
            Bson::String(s) => write!(fmt, "\"{}\"", s),
            Bson::Array(values) => {
                write!(fmt, "[")?;

                let mut first = true;
                for value in values {
                    if !first {
                        write!(fmt, ", ")?;
                    }
                    write!(fmt, "{}", value)?;
                    first = false;
                }

                write!(fmt, "]")
            }
            Bson::Document(doc) => write!(fmt, "{}", doc),
            Bson::Boolean(b) => write!(fmt, "{}", b),
            Bson::Null => write!(fmt, "null"),
            Bson::RegularExpression(Regex { pattern, options }) => {
                write!(fmt, "/{}/{}", pattern, options)
            }
            Bson::JavaScriptCode(code)
            | Bson::JavaScriptCodeWithScope(JavaScriptCodeWithScope { code, .. }) => {
                fmt.write_str(code)
            }
            Bson::Integer(v) => write!(fmt, "{}", v),
            Bson::Timestamp(Timestamp { time, increment }) => {
                write!(fmt, "Timestamp({}, {})", time, increment)
            }
            Bson::Binary(Binary { subtype, bytes }) => {
                write!(fmt, "BinData({}, 0x{})", u8::from(*subtype), hex::encode(bytes))
            }
            Bson::ObjectId(id) => write!(fmt, "ObjectId(\"{}\")", id),
            Bson::DateTime(datetime) => write!(fmt, "Date(\"{}\")", datetime),
            Bson::Symbol(s) => write!(fmt, "Symbol(\"{}\")", s),
            Bson::DbRef(DbRef { namespace, id }) => write!(fmt, "DBRef(\"{}\", {})", namespace, id),
            Bson::MinKey => write!(fmt, "MinKey"),
            Bson::MaxKey => write!(fmt, "MaxKey"),
        }
    }
}

impl From<f32> for Bson {
    fn from(value: f32) -> Bson {
        Bson::Double(f64::from(value))
    }
}

impl From<f64> for Bson {
    fn from(value: f64) -> Bson {
        Bson::Double(value)
    }
}

impl From<&str> for Bson {
    fn from(value: &str) -> Bson {
        Bson::String(value.to_owned())
    }
}

impl From<String> for Bson {
    fn from(value: String) -> Bson {
        Bson::String(value)
    }
}

impl From<&String> for Bson {
    fn from(value: &String) -> Bson {
        Bson::String(value.clone())
    }
}

impl From<bool> for Bson {
    fn from(value: bool) -> Bson {
        Bson::Boolean(value)
    }
}

impl From<i32> for Bson {
    fn from(value: i32) -> Bson {
        Bson::Integer(i64::from(value))
    }
}

impl From<i64> for Bson {
    fn from(value: i64) -> Bson {
        Bson::Integer(value)
    }
}

impl From<u32> for Bson {
    fn from(value: u32) -> Bson {
        Bson::Integer(i64::from(value))
    }
}

impl TryFrom<u64> for Bson {
    type Error = Error;

    fn try_from(value: u64) -> Result<Bson, Error> {
        i64::try_from(value)
            .map(Bson::Integer)
            .map_err(|_| Error::from(ErrorKind::IntegerOutOfRange {
                value: i128::from(value),
            }))
    }
}

impl TryFrom<i128> for Bson {
    type Error = Error;

    fn try_from(value: i128) -> Result<Bson, Error> {
        i64::try_from(value)
            .map(Bson::Integer)
            .map_err(|_| Error::from(ErrorKind::IntegerOutOfRange { value }))
    }
}

impl From<Array> for Bson {
    fn from(value: Array) -> Bson {
        Bson::Array(value)
    }
}

impl From<Document> for Bson {
    fn from(value: Document) -> Bson {
        Bson::Document(value)
    }
}

impl From<Regex> for Bson {
    fn from(value: Regex) -> Bson {
        Bson::RegularExpression(value)
    }
}

impl From<JavaScriptCodeWithScope> for Bson {
    fn from(value: JavaScriptCodeWithScope) -> Bson {
        Bson::JavaScriptCodeWithScope(value)
    }
}

impl From<Binary> for Bson {
    fn from(value: Binary) -> Bson {
        Bson::Binary(value)
    }
}

impl From<Timestamp> for Bson {
    fn from(value: Timestamp) -> Bson {
        Bson::Timestamp(value)
    }
}

impl From<DbRef> for Bson {
    fn from(value: DbRef) -> Bson {
        Bson::DbRef(value)
    }
}

impl From<ObjectId> for Bson {
    fn from(value: ObjectId) -> Bson {
        Bson::ObjectId(value)
    }
}

impl From<[u8; 12]> for Bson {
    fn from(bytes: [u8; 12]) -> Bson {
        Bson::ObjectId(ObjectId::with_bytes(bytes))
    }
}

impl From<DateTime<Utc>> for Bson {
    fn from(value: DateTime<Utc>) -> Bson {
        Bson::DateTime(value)
    }
}

impl Bson {
    /// The wire tag this value is emitted with.
    pub fn element_type(&self) -> ElementType {
        match self {
            Bson::Double(..) => ElementType::Double,
            Bson::String(..) => ElementType::String,
            Bson::Array(..) => ElementType::Array,
            Bson::Document(..) => ElementType::EmbeddedDocument,
            Bson::Boolean(..) => ElementType::Boolean,
            Bson::Null => ElementType::Null,
            Bson::RegularExpression(..) => ElementType::RegularExpression,
            Bson::JavaScriptCode(..) => ElementType::JavaScriptCode,
            Bson::JavaScriptCodeWithScope(..) => ElementType::JavaScriptCodeWithScope,
            Bson::Integer(v) if fits_in_i32(*v) => ElementType::Int32,
            Bson::Integer(..) => ElementType::Int64,
            Bson::Timestamp(..) => ElementType::Timestamp,
            Bson::Binary(..) => ElementType::Binary,
            Bson::ObjectId(..) => ElementType::ObjectId,
            Bson::DateTime(..) => ElementType::DateTime,
            Bson::Symbol(..) => ElementType::Symbol,
            Bson::DbRef(..) => ElementType::EmbeddedDocument,
            Bson::MinKey => ElementType::MinKey,
            Bson::MaxKey => ElementType::MaxKey,
        }
    }

    /// If this value is a `Double`, returns it.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Bson::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// If this value is a `String`, returns it.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Bson::String(s) => Some(s),
            _ => None,
        }
    }

    /// If this value is an `Array`, returns it.
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Bson::Array(values) => Some(values),
            _ => None,
        }
    }

    /// If this value is a `Document`, returns it.
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Bson::Document(doc) => Some(doc),
            _ => None,
        }
    }

    /// If this value is a `Boolean`, returns it.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Bson::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// If this value is an `Integer`, returns it.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Bson::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// If this value is an `ObjectId`, returns it.
    pub fn as_object_id(&self) -> Option<&ObjectId> {
        match self {
            Bson::ObjectId(id) => Some(id),
            _ => None,
        }
    }

    /// If this value is a `DateTime`, returns it.
    pub fn as_datetime(&self) -> Option<&DateTime<Utc>> {
        match self {
            Bson::DateTime(datetime) => Some(datetime),
            _ => None,
        }
    }

    /// If this value is a `Timestamp`, returns it.
    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            Bson::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    /// If this value is a `Symbol`, returns its spelling.
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Bson::Symbol(s) => Some(s),
            _ => None,
        }
    }

    /// If this value is `Null`, returns `()`.
    pub fn as_null(&self) -> Option<()> {
        match self {
            Bson::Null => Some(()),
            _ => None,
        }
    }

    /// Converts this value to the closest `serde_json::Value`.
    ///
    /// Types JSON has no spelling for use their extended-document form,
    /// e.g. an object id becomes `{"$oid": "..."}`.
    pub fn to_json(&self) -> Value {
        match self {
            Bson::Double(v) => json!(v),
            Bson::String(s) => json!(s),
            Bson::Array(values) => Value::Array(values.iter().map(Bson::to_json).collect()),
            Bson::Document(doc) => document_to_json(doc),
            Bson::Boolean(b) => json!(b),
            Bson::Null => Value::Null,
            Bson::Integer(v) => json!(v),
            _ => document_to_json(&self.to_extended_document()),
        }
    }

    /// Creates a `Bson` from a `serde_json::Value`.
    ///
    /// Objects whose keys match an extended-document form are converted to
    /// the corresponding variant; numbers too large for an `i64` fall back
    /// to `Double`.
    pub fn from_json(value: &Value) -> Bson {
        match value {
            Value::Number(n) => n
                .as_i64()
                .map(Bson::Integer)
                .or_else(|| n.as_f64().map(Bson::Double))
                .unwrap_or(Bson::Null),
            Value::String(s) => Bson::String(s.clone()),
            Value::Bool(b) => Bson::Boolean(*b),
            Value::Array(values) => Bson::Array(values.iter().map(Bson::from_json).collect()),
            Value::Object(map) => Bson::from_extended_document(
                map.iter()
                    .map(|(k, v)| (k.clone(), Bson::from_json(v)))
                    .collect(),
            ),
            Value::Null => Bson::Null,
        }
    }

    /// Converts this value into its extended-document form.
    ///
    /// Only meaningful for the variants plain JSON cannot express; the
    /// caller dispatches on the variant first.
    pub fn to_extended_document(&self) -> Document {
        match self {
            Bson::RegularExpression(Regex { pattern, options }) => {
                doc! {
                    "$regex" => (pattern.clone()),
                    "$options" => (options.clone())
                }
            }
            Bson::JavaScriptCode(code) => {
                doc! {
                    "$code" => (code.clone())
                }
            }
            Bson::JavaScriptCodeWithScope(JavaScriptCodeWithScope { code, scope }) => {
                doc! {
                    "$code" => (code.clone()),
                    "$scope" => (scope.clone())
                }
            }
            Bson::Timestamp(Timestamp { time, increment }) => {
                doc! {
                    "t" => (i64::from(*time)),
                    "i" => (i64::from(*increment))
                }
            }
            Bson::Binary(Binary { subtype, bytes }) => {
                doc! {
                    "$binary" => (hex::encode(bytes)),
                    "type" => (i64::from(u8::from(*subtype)))
                }
            }
            Bson::ObjectId(id) => {
                doc! {
                    "$oid" => (id.to_hex())
                }
            }
            Bson::DateTime(datetime) => {
                doc! {
                    "$date" => {
                        "$numberLong" => (datetime.timestamp_millis())
                    }
                }
            }
            Bson::Symbol(s) => {
                doc! {
                    "$symbol" => (s.clone())
                }
            }
            Bson::DbRef(DbRef { namespace, id }) => {
                doc! {
                    "$ref" => (namespace.clone()),
                    "$id" => ((**id).clone())
                }
            }
            Bson::MinKey => {
                doc! {
                    "$minKey" => 1
                }
            }
            Bson::MaxKey => {
                doc! {
                    "$maxKey" => 1
                }
            }
            _ => panic!("attempted extended-document conversion of plain value: {}", self),
        }
    }

    /// Reverses [`to_extended_document`](Self::to_extended_document).
    ///
    /// Documents that match no extended form — including ones that almost
    /// match but carry an invalid payload, like a `$oid` that is not a
    /// 24-character hex string — are returned as plain documents.
    pub fn from_extended_document(values: Document) -> Bson {
        if values.len() == 2 {
            if let (Ok(pattern), Ok(options)) =
                (values.get_str("$regex"), values.get_str("$options"))
            {
                return Bson::RegularExpression(Regex {
                    pattern: pattern.to_owned(),
                    options: options.to_owned(),
                });
            }

            if let (Ok(code), Ok(scope)) = (values.get_str("$code"), values.get_document("$scope"))
            {
                return Bson::JavaScriptCodeWithScope(JavaScriptCodeWithScope {
                    code: code.to_owned(),
                    scope: scope.clone(),
                });
            }

            if let (Ok(t), Ok(i)) = (values.get_i64("t"), values.get_i64("i")) {
                if let (Ok(time), Ok(increment)) = (u32::try_from(t), u32::try_from(i)) {
                    return Bson::Timestamp(Timestamp { time, increment });
                }
            }

            if let (Ok(payload), Ok(t)) = (values.get_str("$binary"), values.get_i64("type")) {
                if let (Ok(bytes), Ok(subtype)) = (hex::decode(payload), u8::try_from(t)) {
                    return Bson::Binary(Binary {
                        subtype: BinarySubtype::from(subtype),
                        bytes,
                    });
                }
            }

            if let Ok(namespace) = values.get_str("$ref") {
                if let Some(id) = values.get("$id") {
                    return Bson::DbRef(DbRef {
                        namespace: namespace.to_owned(),
                        id: Box::new(id.clone()),
                    });
                }
            }
        } else if values.len() == 1 {
            if let Ok(code) = values.get_str("$code") {
                return Bson::JavaScriptCode(code.to_owned());
            }

            if let Ok(hex_id) = values.get_str("$oid") {
                if let Ok(id) = ObjectId::with_string(hex_id) {
                    return Bson::ObjectId(id);
                }
            }

            if let Ok(millis) = values
                .get_document("$date")
                .and_then(|inner| inner.get_i64("$numberLong"))
            {
                if let Some(datetime) = Utc.timestamp_millis_opt(millis).single() {
                    return Bson::DateTime(datetime);
                }
            }

            if let Ok(s) = values.get_str("$symbol") {
                return Bson::Symbol(s.to_owned());
            }

            if matches!(values.get_i64("$minKey"), Ok(1)) {
                return Bson::MinKey;
            }

            if matches!(values.get_i64("$maxKey"), Ok(1)) {
                return Bson::MaxKey;
            }
        }

        Bson::Document(values)
    }
}

fn document_to_json(doc: &Document) -> Value {
    Value::Object(
        doc.iter()
            .map(|(key, value)| (key.clone(), value.to_json()))
            .collect(),
    )
}
