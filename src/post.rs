//! Post records as they travel between a remote site and the local store.
//!
//! A remote post is kept as a JSON object rather than a fixed struct: keys the
//! field table does not know about pass through untouched into the local
//! insert.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ClientError;

/// Remote key → local insert key.
///
/// `ID` is the key used by older versions of the REST API; `id` by newer ones.
pub const FIELD_MAP: &[(&str, &str)] = &[
    ("title", "post_title"),
    ("content", "post_content"),
    ("slug", "post_name"),
    ("status", "post_status"),
    ("parent", "post_parent"),
    ("excerpt", "post_excerpt"),
    ("date", "post_date"),
    ("type", "post_type"),
    ("ID", "import_id"),
    ("id", "import_id"),
];

/// A post decoded from a remote site's REST response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RemotePost(Map<String, Value>);

impl RemotePost {
    /// Accept a decoded JSON value, failing for anything that is not an object.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` naming `function` for non-object values.
    pub fn from_value(value: Value, function: &'static str) -> Result<Self, ClientError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(ClientError::InvalidInput { function }),
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    #[must_use]
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl TryFrom<Value> for RemotePost {
    type Error = ClientError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value, "import")
    }
}

/// Field set handed to the local insert operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LocalPostFields(Map<String, Value>);

impl LocalPostFields {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// String value of a field.
    ///
    /// Numbers and booleans are rendered; an object with a `rendered` string
    /// (the newer API's `{"rendered": ..}` shape) yields that string.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Object(obj) => obj.get("rendered").and_then(Value::as_str).map(String::from),
            _ => None,
        }
    }

    /// Integer value of a field.
    ///
    /// Accepts numeric strings and embedded records carrying an `ID` or `id`,
    /// e.g. a parent post object.
    #[must_use]
    pub fn integer(&self, key: &str) -> Option<i64> {
        as_integer(self.0.get(key)?)
    }

    /// Suggested local identifier carried over from the remote post.
    #[must_use]
    pub fn import_id(&self) -> Option<i64> {
        self.integer("import_id")
    }

    /// Known fields whose value does not fit their column type.
    #[must_use]
    pub fn unmapped(&self) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(k, v)| is_known_local_key(k) && !v.is_null() && !self.fits_column(k))
            .map(|(k, _)| k.as_str())
            .collect()
    }

    /// Fields with no column to hold them: unknown keys plus known keys
    /// whose value does not fit (see [`Self::unmapped`]).
    #[must_use]
    pub fn extra(&self) -> Map<String, Value> {
        let unmapped = self.unmapped();
        self.0
            .iter()
            .filter(|(k, _)| !is_known_local_key(k) || unmapped.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn fits_column(&self, key: &str) -> bool {
        if INTEGER_FIELDS.contains(&key) {
            self.integer(key).is_some()
        } else {
            self.text(key).is_some()
        }
    }
}

/// Local fields stored as integers; every other known field is text.
const INTEGER_FIELDS: &[&str] = &["post_parent", "post_author", "import_id"];

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Object(obj) => obj.get("ID").or_else(|| obj.get("id")).and_then(as_integer),
        _ => None,
    }
}

fn is_known_local_key(key: &str) -> bool {
    key == "post_author" || FIELD_MAP.iter().any(|(_, to)| *to == key)
}

/// Result of translating a remote post: the insert fields plus the pieces
/// that travel separately.
#[derive(Debug, Clone, PartialEq)]
pub struct Translated {
    pub fields: LocalPostFields,
    /// Taxonomy assignments, removed from `fields`.
    pub terms: Value,
    /// Remote identifier, also present in `fields` as `import_id`.
    pub import_id: Option<Value>,
}

/// Rename remote keys to the names the local insert expects.
///
/// Keys outside [`FIELD_MAP`] are copied as-is. `author` is replaced by
/// `post_author` and `terms` is split off.
///
/// # Errors
///
/// Returns `MissingField("author.id")` when the post has no author identifier.
pub fn translate(post: RemotePost) -> Result<Translated, ClientError> {
    let mut map = post.into_inner();

    for (from, to) in FIELD_MAP {
        if let Some(value) = map.remove(*from) {
            if !value.is_null() {
                map.insert((*to).to_string(), value);
            }
        }
    }

    let author_id = map
        .remove("author")
        .and_then(|author| match author {
            Value::Object(mut author) => author.remove("id").or_else(|| author.remove("ID")),
            _ => None,
        })
        .filter(|id| !id.is_null())
        .ok_or(ClientError::MissingField { field: "author.id" })?;
    map.insert("post_author".to_string(), author_id);

    let terms = match map.remove("terms") {
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(terms) => terms,
    };

    let import_id = map.get("import_id").cloned();

    Ok(Translated {
        fields: LocalPostFields(map),
        terms,
        import_id,
    })
}
