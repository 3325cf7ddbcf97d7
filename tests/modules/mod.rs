mod bson;
mod de;
mod macros;
mod serde;
