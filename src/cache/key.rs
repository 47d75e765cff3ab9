//! Cache Key Module
//!
//! Derives deterministic string keys from a namespace prefix and a list of
//! structured input values.
//!
//! A key has the shape `prefix|part0|part1|...` where every part is rendered
//! with JSON-style punctuation. Object members are emitted in sorted key order,
//! so two structurally equal objects always produce the same key no matter how
//! their fields were ordered upstream. Arrays keep their order.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::Serialize;
use serde_json::{Number, Value};

/// Separator between the prefix and each serialized part.
pub const KEY_DELIMITER: char = '|';

// == Canonical Id ==
/// Capability for identifier types whose cache identity is a single
/// canonical string (for example a database object id).
///
/// Any id type from any storage client can opt in; the cache never inspects
/// the concrete type.
pub trait CanonicalId {
    /// Returns the canonical string form, e.g. a 24 char hex object id.
    fn canonical_id(&self) -> String;
}

// == Key Part ==
/// One structured input to key derivation.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyPart {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    /// Rendered as a quoted ISO-8601 UTC string with millisecond precision.
    DateTime(DateTime<Utc>),
    /// Canonical form of an opaque identifier.
    Id(String),
    Array(Vec<KeyPart>),
    /// Members in source order; sorted at serialization time.
    Object(Vec<(String, KeyPart)>),
}

impl KeyPart {
    /// Wraps an opaque identifier by its canonical string form.
    pub fn id<I: CanonicalId + ?Sized>(id: &I) -> Self {
        KeyPart::Id(id.canonical_id())
    }

    /// Builds an object part from `(key, value)` pairs in any order.
    pub fn object<I, K, V>(members: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<KeyPart>,
    {
        KeyPart::Object(
            members
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Best-effort conversion of any serializable value.
    ///
    /// Serde erases dates into strings, so every string that parses as an
    /// RFC 3339 timestamp is read back as a date. Values serde_json cannot
    /// represent fall back to `Null`.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Self {
        serde_json::to_value(value)
            .map(|value| KeyPart::from(value).with_dates_parsed())
            .unwrap_or(KeyPart::Null)
    }

    fn with_dates_parsed(self) -> Self {
        match self {
            KeyPart::String(s) => match DateTime::parse_from_rfc3339(&s) {
                Ok(dt) => KeyPart::from(dt),
                Err(_) => KeyPart::String(s),
            },
            KeyPart::Array(items) => {
                KeyPart::Array(items.into_iter().map(KeyPart::with_dates_parsed).collect())
            }
            KeyPart::Object(members) => KeyPart::Object(
                members
                    .into_iter()
                    .map(|(k, v)| (k, v.with_dates_parsed()))
                    .collect(),
            ),
            other => other,
        }
    }

    /// Appends the stable serialization of this part to `out`.
    pub fn write_to(&self, out: &mut String) {
        match self {
            KeyPart::DateTime(dt) => {
                write_quoted(out, &dt.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            KeyPart::Id(id) => write_quoted(out, id),
            KeyPart::Null => out.push_str("null"),
            KeyPart::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            KeyPart::Number(n) => out.push_str(&n.to_string()),
            KeyPart::String(s) => write_quoted(out, s),
            KeyPart::Array(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    item.write_to(out);
                }
                out.push(']');
            }
            KeyPart::Object(members) => {
                let mut sorted: Vec<&(String, KeyPart)> = members.iter().collect();
                sorted.sort_by(|a, b| a.0.cmp(&b.0));

                out.push('{');
                for (i, (key, value)) in sorted.into_iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    write_quoted(out, key);
                    out.push(':');
                    value.write_to(out);
                }
                out.push('}');
            }
        }
    }

    /// Returns the stable serialization of this part.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out);
        out
    }
}

fn write_quoted(out: &mut String, s: &str) {
    // Display on a JSON string value yields the quoted, escaped literal.
    out.push_str(&Value::String(s.to_owned()).to_string());
}

// == Derive Key ==
/// Builds the cache key for `prefix` and `parts`.
///
/// Pure and total: equal inputs always give byte-identical keys.
pub fn derive_key(prefix: &str, parts: &[KeyPart]) -> String {
    let mut key = String::from(prefix);
    key.push(KEY_DELIMITER);
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            key.push(KEY_DELIMITER);
        }
        part.write_to(&mut key);
    }
    key
}

/// Returns the string every key derived under `prefix` starts with.
pub fn namespace_of(prefix: &str) -> String {
    let mut ns = String::with_capacity(prefix.len() + 1);
    ns.push_str(prefix);
    ns.push(KEY_DELIMITER);
    ns
}

// == Conversions ==
impl From<bool> for KeyPart {
    fn from(value: bool) -> Self {
        KeyPart::Bool(value)
    }
}

macro_rules! impl_from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for KeyPart {
                fn from(value: $t) -> Self {
                    KeyPart::Number(Number::from(value))
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

/// Largest magnitude below which every integral f64 is exact as an i64.
const MAX_EXACT_FLOAT_INT: f64 = 9_007_199_254_740_992.0;

impl From<f64> for KeyPart {
    /// Integral values render as integers, so `1.0` keys like `1` and `-0.0`
    /// keys like `0`.
    fn from(value: f64) -> Self {
        if value.fract() == 0.0 && value.abs() < MAX_EXACT_FLOAT_INT {
            return KeyPart::Number(Number::from(value as i64));
        }
        Number::from_f64(value)
            .map(KeyPart::Number)
            .unwrap_or(KeyPart::Null)
    }
}

impl From<f32> for KeyPart {
    fn from(value: f32) -> Self {
        KeyPart::from(f64::from(value))
    }
}

impl From<&str> for KeyPart {
    fn from(value: &str) -> Self {
        KeyPart::String(value.to_owned())
    }
}

impl From<String> for KeyPart {
    fn from(value: String) -> Self {
        KeyPart::String(value)
    }
}

impl From<&String> for KeyPart {
    fn from(value: &String) -> Self {
        KeyPart::String(value.clone())
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for KeyPart {
    fn from(value: DateTime<Tz>) -> Self {
        KeyPart::DateTime(value.with_timezone(&Utc))
    }
}

impl<T: Into<KeyPart>> From<Option<T>> for KeyPart {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(KeyPart::Null)
    }
}

impl<T: Into<KeyPart>> From<Vec<T>> for KeyPart {
    fn from(value: Vec<T>) -> Self {
        KeyPart::Array(value.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<String>, V: Into<KeyPart>> From<HashMap<K, V>> for KeyPart {
    fn from(value: HashMap<K, V>) -> Self {
        KeyPart::object(value)
    }
}

impl<K: Into<String>, V: Into<KeyPart>> From<BTreeMap<K, V>> for KeyPart {
    fn from(value: BTreeMap<K, V>) -> Self {
        KeyPart::object(value)
    }
}

impl From<Value> for KeyPart {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => KeyPart::Null,
            Value::Bool(b) => KeyPart::Bool(b),
            Value::Number(n) => match n.as_f64() {
                Some(f) if n.is_f64() => KeyPart::from(f),
                _ => KeyPart::Number(n),
            },
            Value::String(s) => KeyPart::String(s),
            Value::Array(items) => KeyPart::Array(items.into_iter().map(KeyPart::from).collect()),
            Value::Object(map) => KeyPart::object(map),
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use serde_json::json;

    struct ObjectId([u8; 12]);

    impl CanonicalId for ObjectId {
        fn canonical_id(&self) -> String {
            self.0.iter().map(|b| format!("{:02x}", b)).collect()
        }
    }

    #[test]
    fn test_key_shape() {
        let key = derive_key("stats", &["2024".into(), "q1".into()]);
        assert_eq!(key, r#"stats|"2024"|"q1""#);
    }

    #[test]
    fn test_key_without_parts() {
        assert_eq!(derive_key("worlds:timeline:stats", &[]), "worlds:timeline:stats|");
    }

    #[test]
    fn test_scalars() {
        let key = derive_key(
            "p",
            &[KeyPart::Null, true.into(), 42u32.into(), (-7i64).into(), 1.5f64.into()],
        );
        assert_eq!(key, "p|null|true|42|-7|1.5");
    }

    #[test]
    fn test_non_finite_float_is_null() {
        assert_eq!(KeyPart::from(f64::NAN), KeyPart::Null);
        assert_eq!(KeyPart::from(f64::INFINITY).serialize(), "null");
    }

    #[test]
    fn test_integral_floats_render_as_integers() {
        assert_eq!(derive_key("p", &[0.0f64.into()]), "p|0");
        assert_eq!(derive_key("p", &[(-0.0f64).into()]), derive_key("p", &[0.0f64.into()]));
        assert_eq!(derive_key("p", &[1.0f64.into()]), derive_key("p", &[1i32.into()]));
        assert_eq!(derive_key("p", &[(-3.0f32).into()]), "p|-3");
        assert_eq!(KeyPart::from(2.5f64).serialize(), "2.5");
    }

    #[test]
    fn test_json_floats_match_native_floats() {
        assert_eq!(KeyPart::from(json!(1.0)), KeyPart::from(1));
        assert_eq!(KeyPart::from(json!(-0.0)).serialize(), "0");
        assert_eq!(KeyPart::from(json!(0.25)).serialize(), "0.25");
    }

    #[test]
    fn test_string_escaping() {
        let part = KeyPart::from("a\"|b");
        assert_eq!(part.serialize(), r#""a\"|b""#);

        // One string holding the delimiter never equals two separate parts.
        let joined = derive_key("p", &["a|b".into()]);
        let split = derive_key("p", &["a".into(), "b".into()]);
        assert_ne!(joined, split);
    }

    #[test]
    fn test_datetime_iso_millis_utc() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(KeyPart::from(dt).serialize(), r#""2024-01-02T03:04:05.000Z""#);
    }

    #[test]
    fn test_datetime_offsets_normalize() {
        let utc = Utc.with_ymd_and_hms(2024, 1, 2, 3, 0, 0).unwrap();
        let tokyo = utc.with_timezone(&FixedOffset::east_opt(9 * 3600).unwrap());
        assert_eq!(KeyPart::from(utc), KeyPart::from(tokyo));
    }

    #[test]
    fn test_canonical_id() {
        let id = ObjectId([0xab; 12]);
        let part = KeyPart::id(&id);
        assert_eq!(part.serialize(), format!("\"{}\"", "ab".repeat(12)));

        // Same logical id, separate instances.
        assert_eq!(part, KeyPart::id(&ObjectId([0xab; 12])));
    }

    #[test]
    fn test_object_keys_sorted() {
        let a = KeyPart::object([("b", 2), ("a", 1)]);
        assert_eq!(a.serialize(), r#"{"a":1,"b":2}"#);
    }

    #[test]
    fn test_object_order_insensitive() {
        let a = KeyPart::object([("a", 1), ("b", 2)]);
        let b = KeyPart::object([("b", 2), ("a", 1)]);
        assert_eq!(derive_key("p", &[a]), derive_key("p", &[b]));
    }

    #[test]
    fn test_array_order_sensitive() {
        let a = KeyPart::from(vec![1, 2]);
        let b = KeyPart::from(vec![2, 1]);
        assert_ne!(derive_key("p", &[a]), derive_key("p", &[b]));
    }

    #[test]
    fn test_nested_structures() {
        let filter = KeyPart::object([
            ("tags", KeyPart::from(vec!["horror", "puzzle"])),
            ("page", KeyPart::from(2)),
            (
                "range",
                KeyPart::object([
                    ("to", KeyPart::from(Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap())),
                    ("from", KeyPart::from(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())),
                ]),
            ),
        ]);
        assert_eq!(
            filter.serialize(),
            r#"{"page":2,"range":{"from":"2024-01-01T00:00:00.000Z","to":"2024-12-31T00:00:00.000Z"},"tags":["horror","puzzle"]}"#
        );
    }

    #[test]
    fn test_option_and_maps() {
        assert_eq!(KeyPart::from(None::<i32>), KeyPart::Null);
        assert_eq!(KeyPart::from(Some("x")).serialize(), r#""x""#);

        let mut map = HashMap::new();
        map.insert("z", 1);
        map.insert("m", 2);
        map.insert("a", 3);
        assert_eq!(KeyPart::from(map).serialize(), r#"{"a":3,"m":2,"z":1}"#);
    }

    #[test]
    fn test_json_value_and_serialize() {
        #[derive(Serialize)]
        struct Query {
            sort: &'static str,
            limit: u32,
        }

        let from_struct = KeyPart::from_serialize(&Query {
            sort: "new",
            limit: 20,
        });
        let from_json = KeyPart::from(json!({ "limit": 20, "sort": "new" }));
        assert_eq!(from_struct.serialize(), from_json.serialize());
        assert_eq!(from_json.serialize(), r#"{"limit":20,"sort":"new"}"#);
    }

    #[test]
    fn test_serialized_dates_match_native_dates() {
        #[derive(Serialize)]
        struct Window {
            since: DateTime<FixedOffset>,
            label: &'static str,
        }

        let utc = Utc.with_ymd_and_hms(2024, 1, 2, 3, 0, 0).unwrap();
        let tokyo = utc.with_timezone(&FixedOffset::east_opt(9 * 3600).unwrap());

        let native = derive_key("p", &[utc.into()]);
        assert_eq!(derive_key("p", &[KeyPart::from_serialize(&utc)]), native);
        assert_eq!(derive_key("p", &[KeyPart::from_serialize(&tokyo)]), native);
        assert_eq!(native, r#"p|"2024-01-02T03:00:00.000Z""#);

        let nested = KeyPart::from_serialize(&Window {
            since: tokyo,
            label: "not a date",
        });
        assert_eq!(
            nested.serialize(),
            r#"{"label":"not a date","since":"2024-01-02T03:00:00.000Z"}"#
        );
    }

    #[test]
    fn test_namespace_isolation() {
        let worlds = derive_key("worlds", &["x".into()]);
        let worlds_tag = derive_key("worldsTag", &["x".into()]);
        assert_ne!(worlds, worlds_tag);
        assert!(worlds.starts_with(&namespace_of("worlds")));
        assert!(!worlds_tag.starts_with(&namespace_of("worlds")));
    }
}
