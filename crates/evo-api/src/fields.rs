//! Field-by-field reading of JSON response objects.
//!
//! Evolution responses vary between server versions: the same value can
//! arrive under camelCase or snake_case keys, numbers can arrive as
//! strings, and objects can be wrapped or flat. Models are therefore read
//! through a [`FieldReader`] instead of a strict serde derive. The reader
//! accepts every documented alias, coerces numeric strings, and records a
//! [`Violation`] with the dotted field path for every value it cannot use.
//! Parsing fails once, at the end, with all violations listed.

use std::collections::HashMap;

use evolution_sdk_client::{Error, Result, Violation};
use serde_json::{Map, Value};

/// A model that can be read from an Evolution response object.
pub trait FromResponse: Sized {
    /// Read the model, recording violations on the reader.
    fn read(fields: &mut FieldReader<'_>) -> Self;

    /// The model for an empty reply body, if the model accepts one.
    fn empty() -> Option<Self> {
        None
    }

    /// Parse a JSON value into the model.
    fn from_value(value: &Value) -> Result<Self> {
        parse(value)
    }
}

/// Parse a JSON object into a model.
pub fn parse<T: FromResponse>(value: &Value) -> Result<T> {
    if value.is_null() {
        if let Some(model) = T::empty() {
            return Ok(model);
        }
    }
    match value {
        Value::Object(map) => {
            let mut reader = FieldReader::new(map, "");
            let model = T::read(&mut reader);
            reader.finish().map(|()| model)
        }
        other => Err(Error::invalid_response(vec![Violation::new(
            "",
            format!("expected object, got {}", type_name(other)),
        )])),
    }
}

/// Parse a JSON array of objects into models.
///
/// `null` yields an empty list and a single object a one-element list.
pub fn parse_list<T: FromResponse>(value: &Value) -> Result<Vec<T>> {
    let items: &[Value] = match value {
        Value::Array(items) => items,
        Value::Null => return Ok(Vec::new()),
        Value::Object(_) => std::slice::from_ref(value),
        other => {
            return Err(Error::invalid_response(vec![Violation::new(
                "",
                format!("expected array, got {}", type_name(other)),
            )]))
        }
    };

    let mut violations = Vec::new();
    let models = read_items(items, "", &mut violations);
    if violations.is_empty() {
        Ok(models)
    } else {
        Err(Error::invalid_response(violations))
    }
}

fn read_items<T: FromResponse>(
    items: &[Value],
    path: &str,
    violations: &mut Vec<Violation>,
) -> Vec<T> {
    let mut models = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let item_path = format!("{path}[{index}]");
        match item {
            Value::Object(map) => {
                let mut reader = FieldReader::new(map, item_path);
                models.push(T::read(&mut reader));
                violations.append(&mut reader.violations);
            }
            other => violations.push(Violation::new(
                item_path,
                format!("expected object, got {}", type_name(other)),
            )),
        }
    }
    models
}

/// Name of a JSON value's type, for violation messages.
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Reads typed fields out of one JSON object.
#[derive(Debug)]
pub struct FieldReader<'a> {
    map: &'a Map<String, Value>,
    path: String,
    consumed: Vec<&'a str>,
    violations: Vec<Violation>,
}

impl<'a> FieldReader<'a> {
    /// Create a reader over an object located at `path`.
    pub fn new(map: &'a Map<String, Value>, path: impl Into<String>) -> Self {
        Self {
            map,
            path: path.into(),
            consumed: Vec::new(),
            violations: Vec::new(),
        }
    }

    /// The underlying object.
    pub fn object(&self) -> &'a Map<String, Value> {
        self.map
    }

    /// Dotted path of a key below this object.
    pub fn path_of(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{key}", self.path)
        }
    }

    /// Returns true if any of the keys is present with a non-null value.
    pub fn has(&self, keys: &[&str]) -> bool {
        keys.iter()
            .any(|key| self.map.get(*key).is_some_and(|v| !v.is_null()))
    }

    /// Record a violation against a key of this object.
    pub fn violate(&mut self, key: &str, message: impl Into<String>) {
        let field = self.path_of(key);
        self.violations.push(Violation::new(field, message));
    }

    /// Record violations found by a nested reader.
    pub(crate) fn extend_violations(&mut self, violations: Vec<Violation>) {
        self.violations.extend(violations);
    }

    /// First present, non-null value among the aliases. Every alias
    /// found is marked consumed.
    fn lookup(&mut self, keys: &[&str]) -> Option<(&'a str, &'a Value)> {
        let map = self.map;
        let mut found = None;
        for key in keys {
            if let Some((name, value)) = map.get_key_value(*key) {
                self.consumed.push(name.as_str());
                if found.is_none() && !value.is_null() {
                    found = Some((name.as_str(), value));
                }
            }
        }
        found
    }

    /// The raw value, whatever its type.
    pub fn raw(&mut self, keys: &[&str]) -> Option<&'a Value> {
        self.lookup(keys).map(|(_, value)| value)
    }

    /// A string. Numbers and booleans are accepted and rendered as text.
    pub fn string(&mut self, keys: &[&str]) -> Option<String> {
        let (key, value) = self.lookup(keys)?;
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            other => {
                self.violate(key, format!("expected string, got {}", type_name(other)));
                None
            }
        }
    }

    /// A string that must be present.
    pub fn required_string(&mut self, keys: &[&str]) -> String {
        let present = self.has(keys);
        match self.string(keys) {
            Some(value) => value,
            None => {
                if !present {
                    let key = keys.first().copied().unwrap_or_default();
                    self.violate(key, "is required");
                }
                String::new()
            }
        }
    }

    /// A boolean. `"true"`/`"false"` and `0`/`1` are accepted.
    pub fn bool(&mut self, keys: &[&str]) -> Option<bool> {
        let (key, value) = self.lookup(keys)?;
        let parsed = match value {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            Value::Number(n) => match n.as_u64() {
                Some(0) => Some(false),
                Some(1) => Some(true),
                _ => None,
            },
            _ => None,
        };
        if parsed.is_none() {
            self.violate(key, format!("expected boolean, got {}", describe(value)));
        }
        parsed
    }

    /// An integer. Integral floats and numeric strings are accepted.
    pub fn int(&mut self, keys: &[&str]) -> Option<i64> {
        let (key, value) = self.lookup(keys)?;
        let parsed = match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            Value::String(s) => {
                let s = s.trim();
                s.parse::<i64>().ok().or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite() && f.fract() == 0.0)
                        .map(|f| f as i64)
                })
            }
            _ => None,
        };
        if parsed.is_none() {
            self.violate(key, format!("expected integer, got {}", describe(value)));
        }
        parsed
    }

    /// A number. Numeric strings are accepted.
    pub fn float(&mut self, keys: &[&str]) -> Option<f64> {
        let (key, value) = self.lookup(keys)?;
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            _ => None,
        };
        if parsed.is_none() {
            self.violate(key, format!("expected number, got {}", describe(value)));
        }
        parsed
    }

    /// An open enumeration read from a string.
    pub fn enumeration<E: From<String>>(&mut self, keys: &[&str]) -> Option<E> {
        self.string(keys).map(E::from)
    }

    /// A nested object.
    pub fn nested<T: FromResponse>(&mut self, keys: &[&str]) -> Option<T> {
        let (key, value) = self.lookup(keys)?;
        match value {
            Value::Object(map) => {
                let mut child = FieldReader::new(map, self.path_of(key));
                let model = T::read(&mut child);
                self.violations.append(&mut child.violations);
                Some(model)
            }
            other => {
                self.violate(key, format!("expected object, got {}", type_name(other)));
                None
            }
        }
    }

    /// Read this same object as another model, sharing the path.
    pub fn flatten<T: FromResponse>(&mut self) -> T {
        let mut child = FieldReader::new(self.map, self.path.clone());
        let model = T::read(&mut child);
        self.consumed.append(&mut child.consumed);
        self.violations.append(&mut child.violations);
        model
    }

    /// A list of objects. A single object is read as a one-element list.
    pub fn list<T: FromResponse>(&mut self, keys: &[&str]) -> Vec<T> {
        let Some((key, value)) = self.lookup(keys) else {
            return Vec::new();
        };
        let path = self.path_of(key);
        match value {
            Value::Array(items) => read_items(items, &path, &mut self.violations),
            Value::Object(_) => read_items(std::slice::from_ref(value), &path, &mut self.violations),
            other => {
                self.violate(key, format!("expected array, got {}", type_name(other)));
                Vec::new()
            }
        }
    }

    /// A list of strings. A single string is read as a one-element list.
    pub fn strings(&mut self, keys: &[&str]) -> Vec<String> {
        let Some((key, value)) = self.lookup(keys) else {
            return Vec::new();
        };
        match value {
            Value::String(s) => vec![s.clone()],
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    match item {
                        Value::String(s) => out.push(s.clone()),
                        Value::Number(n) => out.push(n.to_string()),
                        other => {
                            let field = format!("{}[{index}]", self.path_of(key));
                            self.violations.push(Violation::new(
                                field,
                                format!("expected string, got {}", type_name(other)),
                            ));
                        }
                    }
                }
                out
            }
            other => {
                self.violate(key, format!("expected array, got {}", type_name(other)));
                Vec::new()
            }
        }
    }

    /// An object of string values, such as HTTP headers.
    pub fn string_map(&mut self, keys: &[&str]) -> HashMap<String, String> {
        let Some((key, value)) = self.lookup(keys) else {
            return HashMap::new();
        };
        match value {
            Value::Object(map) => map
                .iter()
                .map(|(k, v)| {
                    let v = match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    (k.clone(), v)
                })
                .collect(),
            other => {
                self.violate(key, format!("expected object, got {}", type_name(other)));
                HashMap::new()
            }
        }
    }

    /// Fields not read so far, kept for forward compatibility.
    pub fn extra(&self) -> Map<String, Value> {
        self.map
            .iter()
            .filter(|(k, _)| !self.consumed.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Violations recorded so far.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Finish reading, failing with every recorded violation.
    pub fn finish(self) -> Result<()> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(Error::invalid_response(self.violations))
        }
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => format!("string {s:?}"),
        other => type_name(other).to_string(),
    }
}
