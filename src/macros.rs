/// Construct a BSON value.
///
/// Array and document literals nest, and any expression convertible to
/// [`Bson`](crate::Bson) can appear in value position:
///
/// ```rust
/// use mongo_bson::bson;
///
/// let value = bson!({
///     "name" => "Kyoto",
///     "population" => 1_463_000,
///     "wards" => ["Fushimi", "Ukyō"]
/// });
/// ```
#[macro_export]
macro_rules! bson {
    ([]) => {{ $crate::Bson::Array(Vec::new()) }};

    ([$($val:tt),* $(,)?]) => {{
        let mut array = Vec::new();

        $(
            array.push($crate::bson!($val));
        )*

        $crate::Bson::Array(array)
    }};

    ({ $($k:expr => $v:tt),* $(,)? }) => {{
        $crate::Bson::Document($crate::doc! {
            $(
                $k => $v
            ),*
        })
    }};

    ($val:expr) => {{
        $crate::Bson::from($val)
    }};
}

/// Construct a BSON [`Document`](crate::Document).
///
/// Entries are written as `key => value` and keep their order:
///
/// ```rust
/// use mongo_bson::doc;
///
/// let doc = doc! {
///     "crate" => "mongo-bson",
///     "stable" => true
/// };
/// ```
#[macro_export]
macro_rules! doc {
    () => {{ $crate::Document::new() }};

    ( $($key:expr => $val:tt),* $(,)? ) => {{
        let mut document = $crate::Document::new();

        $(
            document.insert($key, $crate::bson!($val));
        )*

        document
    }};
}
