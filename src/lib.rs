//! BSON, short for Binary JSON, is a binary-encoded serialization of
//! JSON-like documents. Like JSON, BSON supports the embedding of documents
//! and arrays within other documents and arrays, and it extends JSON with
//! types such as datetimes, binary data and 12-byte object identifiers.
//!
//! ```text
//! // JSON equivalent
//! {"hello": "world"}
//!
//! // BSON encoding
//! \x16\x00\x00\x00                   // total document size
//! \x02                               // 0x02 = type String
//! hello\x00                          // field name
//! \x06\x00\x00\x00world\x00          // field value
//! \x00                               // 0x00 = type EOO ('end of object')
//! ```
//!
//! BSON is the wire representation used between a MongoDB driver and the
//! server; every request and reply travels as exactly one BSON document.
//! This crate is the codec for that traffic. For more information about
//! BSON itself, see [bsonspec.org](http://bsonspec.org).
//!
//! ## Documents and values
//!
//! BSON documents are ordered maps of UTF-8 string keys to BSON values,
//! modeled by the [`Document`] struct; the values themselves are modeled by
//! the [`Bson`] enum. Both can be built directly or with the [`doc!`] and
//! [`bson!`] macros:
//!
//! ```rust
//! use mongo_bson::{bson, doc, Bson};
//!
//! let value = Bson::Integer(5);
//! let value = bson!([5, false]);
//!
//! let doc = doc! {
//!     "hello" => "world",
//!     "subdoc" => { "cat" => true }
//! };
//! ```
//!
//! ## Going to and from bytes
//!
//! [`serialize`] turns a document into its wire bytes and [`deserialize`]
//! turns wire bytes back into a document:
//!
//! ```rust
//! use mongo_bson::{deserialize, doc, serialize};
//!
//! let doc = doc! { "i" => 1 };
//! let bytes = serialize(&doc, false, false).unwrap();
//! let decoded = deserialize(&bytes).unwrap();
//! assert_eq!(decoded, doc);
//! ```
//!
//! `serialize` takes two flags used by the driver: `check_keys` rejects
//! keys that start with `$` or contain `.`, and `move_id` emits a
//! top-level `_id` field first regardless of its position in the document.
//!
//! ## Strongly typed data
//!
//! Any type implementing [`serde::Serialize`] or [`serde::Deserialize`]
//! can be mapped through [`Bson`] with [`to_bson`]/[`to_document`] and
//! [`from_bson`]/[`from_document`], which removes the boilerplate of
//! checking keys and unwrapping variants by hand:
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use mongo_bson::{from_bson, to_bson};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Person {
//!     name: String,
//!     age: i64,
//! }
//!
//! let bson = to_bson(&Person {
//!     name: "Ada".to_owned(),
//!     age: 36,
//! })
//! .unwrap();
//!
//! let person: Person = from_bson(bson).unwrap();
//! ```

#[macro_use]
mod macros;
mod bson;
mod buffer;
pub mod de;
pub mod document;
pub mod error;
pub mod oid;
pub mod ser;
pub mod spec;
mod utf8;

pub use self::{
    bson::{Array, Binary, Bson, DbRef, JavaScriptCodeWithScope, Regex, Timestamp},
    de::{deserialize, from_bson, from_document, Deserializer},
    document::Document,
    error::{Error, ErrorKind, Result, ValueAccessErrorKind},
    oid::ObjectId,
    ser::{serialize, to_bson, to_document, Serializer},
};
