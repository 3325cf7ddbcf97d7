//! Mapping serde-serializable values into [`Bson`] trees.

use serde::ser::{
    Error as _,
    Serialize,
    SerializeMap as _,
};

use crate::{
    bson::{Array, Binary, Bson},
    document::Document,
    error::{Error, ErrorKind, Result},
    oid::ObjectId,
    spec::BinarySubtype,
};

/// Encode a `T` serializable into a BSON value.
pub fn to_bson<T>(value: &T) -> Result<Bson>
where
    T: Serialize + ?Sized,
{
    value.serialize(Serializer)
}

/// Encode a `T` serializable into a BSON document.
pub fn to_document<T>(value: &T) -> Result<Document>
where
    T: Serialize + ?Sized,
{
    match to_bson(value)? {
        Bson::Document(doc) => Ok(doc),
        bson => Err(Error::custom(format!(
            "expected a value that serializes to a document, got {:?}",
            bson.element_type()
        ))),
    }
}

impl Serialize for Document {
    #[inline]
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl Serialize for Bson {
    #[inline]
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Bson::Double(v) => serializer.serialize_f64(*v),
            Bson::String(s) => serializer.serialize_str(s),
            Bson::Array(values) => values.serialize(serializer),
            Bson::Document(doc) => doc.serialize(serializer),
            Bson::Boolean(v) => serializer.serialize_bool(*v),
            Bson::Null => serializer.serialize_unit(),
            Bson::Integer(v) => serializer.serialize_i64(*v),
            // Everything else travels in its extended-document spelling and
            // is recognized again on the way back in.
            _ => self.to_extended_document().serialize(serializer),
        }
    }
}

impl Serialize for ObjectId {
    #[inline]
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("$oid", &self.to_hex())?;
        map.end()
    }
}

/// A `serde::Serializer` whose output is a [`Bson`] tree.
pub struct Serializer;

impl serde::Serializer for Serializer {
    type Ok = Bson;
    type Error = Error;

    type SerializeSeq = ArraySerializer;
    type SerializeTuple = ArraySerializer;
    type SerializeTupleStruct = ArraySerializer;
    type SerializeTupleVariant = TupleVariantSerializer;
    type SerializeMap = MapSerializer;
    type SerializeStruct = StructSerializer;
    type SerializeStructVariant = StructVariantSerializer;

    #[inline]
    fn serialize_bool(self, value: bool) -> Result<Bson> {
        Ok(Bson::Boolean(value))
    }

    #[inline]
    fn serialize_i8(self, value: i8) -> Result<Bson> {
        Ok(Bson::Integer(i64::from(value)))
    }

    #[inline]
    fn serialize_i16(self, value: i16) -> Result<Bson> {
        Ok(Bson::Integer(i64::from(value)))
    }

    #[inline]
    fn serialize_i32(self, value: i32) -> Result<Bson> {
        Ok(Bson::Integer(i64::from(value)))
    }

    #[inline]
    fn serialize_i64(self, value: i64) -> Result<Bson> {
        Ok(Bson::Integer(value))
    }

    #[inline]
    fn serialize_u8(self, value: u8) -> Result<Bson> {
        Ok(Bson::Integer(i64::from(value)))
    }

    #[inline]
    fn serialize_u16(self, value: u16) -> Result<Bson> {
        Ok(Bson::Integer(i64::from(value)))
    }

    #[inline]
    fn serialize_u32(self, value: u32) -> Result<Bson> {
        Ok(Bson::Integer(i64::from(value)))
    }

    #[inline]
    fn serialize_u64(self, value: u64) -> Result<Bson> {
        i64::try_from(value).map(Bson::Integer).map_err(|_| {
            Error::from(ErrorKind::IntegerOutOfRange {
                value: i128::from(value),
            })
        })
    }

    #[inline]
    fn serialize_f32(self, value: f32) -> Result<Bson> {
        Ok(Bson::Double(f64::from(value)))
    }

    #[inline]
    fn serialize_f64(self, value: f64) -> Result<Bson> {
        Ok(Bson::Double(value))
    }

    #[inline]
    fn serialize_char(self, value: char) -> Result<Bson> {
        Ok(Bson::String(value.to_string()))
    }

    #[inline]
    fn serialize_str(self, value: &str) -> Result<Bson> {
        Ok(Bson::String(value.to_owned()))
    }

    #[inline]
    fn serialize_bytes(self, value: &[u8]) -> Result<Bson> {
        Ok(Bson::Binary(Binary {
            subtype: BinarySubtype::Generic,
            bytes: value.to_vec(),
        }))
    }

    #[inline]
    fn serialize_none(self) -> Result<Bson> {
        self.serialize_unit()
    }

    #[inline]
    fn serialize_some<T>(self, value: &T) -> Result<Bson>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self)
    }

    #[inline]
    fn serialize_unit(self) -> Result<Bson> {
        Ok(Bson::Null)
    }

    #[inline]
    fn serialize_unit_struct(self, _name: &'static str) -> Result<Bson> {
        self.serialize_unit()
    }

    #[inline]
    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Bson> {
        Ok(Bson::String(variant.to_owned()))
    }

    #[inline]
    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<Bson>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self)
    }

    #[inline]
    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Bson>
    where
        T: Serialize + ?Sized,
    {
        let mut doc = Document::new();
        doc.insert(variant, to_bson(value)?);
        Ok(Bson::Document(doc))
    }

    #[inline]
    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq> {
        Ok(ArraySerializer {
            array: Array::with_capacity(len.unwrap_or(0)),
        })
    }

    #[inline]
    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple> {
        self.serialize_seq(Some(len))
    }

    #[inline]
    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        self.serialize_seq(Some(len))
    }

    #[inline]
    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Ok(TupleVariantSerializer {
            variant,
            array: Array::with_capacity(len),
        })
    }

    #[inline]
    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Ok(MapSerializer {
            doc: Document::new(),
            next_key: None,
        })
    }

    #[inline]
    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Ok(StructSerializer {
            doc: Document::new(),
        })
    }

    #[inline]
    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Ok(StructVariantSerializer {
            variant,
            doc: Document::new(),
        })
    }
}

/// Serializes sequences and tuples into a BSON array.
pub struct ArraySerializer {
    array: Array,
}

impl serde::ser::SerializeSeq for ArraySerializer {
    type Ok = Bson;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        self.array.push(to_bson(value)?);
        Ok(())
    }

    fn end(self) -> Result<Bson> {
        Ok(Bson::Array(self.array))
    }
}

impl serde::ser::SerializeTuple for ArraySerializer {
    type Ok = Bson;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        serde::ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Bson> {
        serde::ser::SerializeSeq::end(self)
    }
}

impl serde::ser::SerializeTupleStruct for ArraySerializer {
    type Ok = Bson;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        serde::ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Bson> {
        serde::ser::SerializeSeq::end(self)
    }
}

/// Serializes a tuple enum variant into `{ variant: [ … ] }`.
pub struct TupleVariantSerializer {
    variant: &'static str,
    array: Array,
}

impl serde::ser::SerializeTupleVariant for TupleVariantSerializer {
    type Ok = Bson;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        self.array.push(to_bson(value)?);
        Ok(())
    }

    fn end(self) -> Result<Bson> {
        let mut doc = Document::new();
        doc.insert(self.variant, Bson::Array(self.array));
        Ok(Bson::Document(doc))
    }
}

/// Serializes maps into a BSON document.
///
/// When the finished document spells an extended form — the way
/// [`ObjectId`] and the other exotic variants serialize themselves — it is
/// converted back to that variant.
pub struct MapSerializer {
    doc: Document,
    next_key: Option<String>,
}

impl serde::ser::SerializeMap for MapSerializer {
    type Ok = Bson;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        match to_bson(key)? {
            Bson::String(s) => {
                self.next_key = Some(s);
                Ok(())
            }
            other => Err(Error::custom(format!("invalid map key type: {}", other))),
        }
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let key = self.next_key.take().unwrap_or_default();
        self.doc.insert(key, to_bson(value)?);
        Ok(())
    }

    fn end(self) -> Result<Bson> {
        Ok(Bson::from_extended_document(self.doc))
    }
}

/// Serializes structs into a BSON document.
pub struct StructSerializer {
    doc: Document,
}

impl serde::ser::SerializeStruct for StructSerializer {
    type Ok = Bson;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        self.doc.insert(key, to_bson(value)?);
        Ok(())
    }

    fn end(self) -> Result<Bson> {
        Ok(Bson::Document(self.doc))
    }
}

/// Serializes a struct enum variant into `{ variant: { … } }`.
pub struct StructVariantSerializer {
    variant: &'static str,
    doc: Document,
}

impl serde::ser::SerializeStructVariant for StructVariantSerializer {
    type Ok = Bson;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        self.doc.insert(key, to_bson(value)?);
        Ok(())
    }

    fn end(self) -> Result<Bson> {
        let mut doc = Document::new();
        doc.insert(self.variant, Bson::Document(self.doc));
        Ok(Bson::Document(doc))
    }
}
