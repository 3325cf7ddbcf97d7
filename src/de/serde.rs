//! Mapping [`Bson`] trees back into serde-deserializable values.

use serde::de::{
    self,
    Deserialize,
    DeserializeOwned,
    DeserializeSeed,
    IntoDeserializer,
    Visitor,
};

use crate::{
    bson::{Binary, Bson},
    document::{self, Document},
    error::{Error, Result},
    oid::ObjectId,
    spec::BinarySubtype,
};

/// Decode a BSON value into a `T` deserializable.
pub fn from_bson<T>(bson: Bson) -> Result<T>
where
    T: DeserializeOwned,
{
    T::deserialize(Deserializer::new(bson))
}

/// Decode a BSON document into a `T` deserializable.
pub fn from_document<T>(doc: Document) -> Result<T>
where
    T: DeserializeOwned,
{
    from_bson(Bson::Document(doc))
}

/// A `serde::Deserializer` that walks a [`Bson`] tree.
pub struct Deserializer {
    value: Bson,
}

impl Deserializer {
    pub fn new(value: Bson) -> Deserializer {
        Deserializer { value }
    }
}

impl<'de> de::Deserializer<'de> for Deserializer {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Bson::Double(v) => visitor.visit_f64(v),
            Bson::String(s) => visitor.visit_string(s),
            Bson::Array(values) => visitor.visit_seq(SeqDeserializer {
                iter: values.into_iter(),
            }),
            Bson::Document(doc) => visitor.visit_map(MapDeserializer {
                iter: doc.into_iter(),
                value: None,
            }),
            Bson::Boolean(v) => visitor.visit_bool(v),
            Bson::Null => visitor.visit_unit(),
            Bson::Integer(v) => visitor.visit_i64(v),
            // Exotic variants are presented in their extended-document
            // spelling, mirroring how they serialize.
            other => visitor.visit_map(MapDeserializer {
                iter: other.to_extended_document().into_iter(),
                value: None,
            }),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Bson::Null => visitor.visit_none(),
            other => visitor.visit_some(Deserializer::new(other)),
        }
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.value {
            // A bare string is a unit variant.
            Bson::String(variant) => visitor.visit_enum(variant.into_deserializer()),
            // Data-carrying variants travel as a single-entry document.
            Bson::Document(doc) => {
                let mut iter = doc.into_iter();
                let (variant, value) = match iter.next() {
                    Some(entry) => entry,
                    None => {
                        return Err(de::Error::custom(
                            "expected an enum variant, got an empty document",
                        ))
                    }
                };
                if iter.next().is_some() {
                    return Err(de::Error::custom(
                        "expected a document with a single variant key",
                    ));
                }

                visitor.visit_enum(EnumDeserializer { variant, value })
            }
            other => Err(de::Error::custom(format!(
                "expected an enum variant, got {other}"
            ))),
        }
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple tuple_struct map struct
        identifier ignored_any
    }
}

struct SeqDeserializer {
    iter: std::vec::IntoIter<Bson>,
}

impl<'de> de::SeqAccess<'de> for SeqDeserializer {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some(value) => seed.deserialize(Deserializer::new(value)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct MapDeserializer {
    iter: document::IntoIter,
    value: Option<Bson>,
}

impl<'de> de::MapAccess<'de> for MapDeserializer {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(key.into_deserializer()).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: DeserializeSeed<'de>,
    {
        let value = self
            .value
            .take()
            .ok_or_else(|| <Error as de::Error>::custom("map value read before its key"))?;
        seed.deserialize(Deserializer::new(value))
    }
}

struct EnumDeserializer {
    variant: String,
    value: Bson,
}

impl<'de> de::EnumAccess<'de> for EnumDeserializer {
    type Error = Error;
    type Variant = VariantDeserializer;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: DeserializeSeed<'de>,
    {
        let variant =
            seed.deserialize(IntoDeserializer::<Error>::into_deserializer(self.variant))?;
        Ok((variant, VariantDeserializer { value: self.value }))
    }
}

struct VariantDeserializer {
    value: Bson,
}

impl<'de> de::VariantAccess<'de> for VariantDeserializer {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            Bson::Null => Ok(()),
            other => Err(de::Error::custom(format!(
                "expected a unit variant, got {other}"
            ))),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: DeserializeSeed<'de>,
    {
        seed.deserialize(Deserializer::new(self.value))
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Bson::Array(values) => visitor.visit_seq(SeqDeserializer {
                iter: values.into_iter(),
            }),
            other => Err(de::Error::custom(format!(
                "expected a tuple variant array, got {other}"
            ))),
        }
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Bson::Document(doc) => visitor.visit_map(MapDeserializer {
                iter: doc.into_iter(),
                value: None,
            }),
            other => Err(de::Error::custom(format!(
                "expected a struct variant document, got {other}"
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for Bson {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_any(BsonVisitor)
    }
}

struct BsonVisitor;

impl<'de> Visitor<'de> for BsonVisitor {
    type Value = Bson;

    fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str("a BSON value")
    }

    fn visit_bool<E>(self, value: bool) -> std::result::Result<Bson, E>
    where
        E: de::Error,
    {
        Ok(Bson::Boolean(value))
    }

    fn visit_i8<E>(self, value: i8) -> std::result::Result<Bson, E>
    where
        E: de::Error,
    {
        Ok(Bson::Integer(i64::from(value)))
    }

    fn visit_i16<E>(self, value: i16) -> std::result::Result<Bson, E>
    where
        E: de::Error,
    {
        Ok(Bson::Integer(i64::from(value)))
    }

    fn visit_i32<E>(self, value: i32) -> std::result::Result<Bson, E>
    where
        E: de::Error,
    {
        Ok(Bson::Integer(i64::from(value)))
    }

    fn visit_i64<E>(self, value: i64) -> std::result::Result<Bson, E>
    where
        E: de::Error,
    {
        Ok(Bson::Integer(value))
    }

    fn visit_u64<E>(self, value: u64) -> std::result::Result<Bson, E>
    where
        E: de::Error,
    {
        i64::try_from(value)
            .map(Bson::Integer)
            .map_err(|_| E::custom(format!("integer out of range: {value}")))
    }

    fn visit_f64<E>(self, value: f64) -> std::result::Result<Bson, E>
    where
        E: de::Error,
    {
        Ok(Bson::Double(value))
    }

    fn visit_str<E>(self, value: &str) -> std::result::Result<Bson, E>
    where
        E: de::Error,
    {
        Ok(Bson::String(value.to_owned()))
    }

    fn visit_string<E>(self, value: String) -> std::result::Result<Bson, E>
    where
        E: de::Error,
    {
        Ok(Bson::String(value))
    }

    fn visit_bytes<E>(self, value: &[u8]) -> std::result::Result<Bson, E>
    where
        E: de::Error,
    {
        Ok(Bson::Binary(Binary {
            subtype: BinarySubtype::Generic,
            bytes: value.to_vec(),
        }))
    }

    fn visit_byte_buf<E>(self, value: Vec<u8>) -> std::result::Result<Bson, E>
    where
        E: de::Error,
    {
        Ok(Bson::Binary(Binary {
            subtype: BinarySubtype::Generic,
            bytes: value,
        }))
    }

    fn visit_none<E>(self) -> std::result::Result<Bson, E>
    where
        E: de::Error,
    {
        Ok(Bson::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> std::result::Result<Bson, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        Bson::deserialize(deserializer)
    }

    fn visit_unit<E>(self) -> std::result::Result<Bson, E>
    where
        E: de::Error,
    {
        Ok(Bson::Null)
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Bson, A::Error>
    where
        A: de::SeqAccess<'de>,
    {
        let mut values = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(value) = seq.next_element::<Bson>()? {
            values.push(value);
        }
        Ok(Bson::Array(values))
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<Bson, A::Error>
    where
        A: de::MapAccess<'de>,
    {
        let mut doc = Document::new();
        while let Some((key, value)) = map.next_entry::<String, Bson>()? {
            doc.insert(key, value);
        }
        Ok(Bson::from_extended_document(doc))
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_map(DocumentVisitor)
    }
}

struct DocumentVisitor;

impl<'de> Visitor<'de> for DocumentVisitor {
    type Value = Document;

    fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str("an ordered document")
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<Document, A::Error>
    where
        A: de::MapAccess<'de>,
    {
        let mut doc = Document::new();
        while let Some((key, value)) = map.next_entry::<String, Bson>()? {
            doc.insert(key, value);
        }
        Ok(doc)
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        match Bson::deserialize(deserializer)? {
            Bson::ObjectId(id) => Ok(id),
            Bson::String(hex) => ObjectId::with_string(&hex).map_err(de::Error::custom),
            other => Err(de::Error::custom(format!(
                "expected an object id, got {other}"
            ))),
        }
    }
}
