use geo::Coord;
use serde::{Deserialize, Serialize};

/// Unique, stable identifier of one input line feature.
pub type FeatId = i64;

/// Attribute field value, resolved to a concrete variant once at ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl AttrValue {
    pub fn kind(&self) -> Option<FieldKind> {
        match self {
            AttrValue::Null => None,
            AttrValue::Bool(_) => Some(FieldKind::Bool),
            AttrValue::Int(_) => Some(FieldKind::Int),
            AttrValue::Float(_) => Some(FieldKind::Float),
            AttrValue::Str(_) => Some(FieldKind::Str),
        }
    }

    pub fn from_json(value: &serde_json::Value) -> AttrValue {
        match value {
            serde_json::Value::Null => AttrValue::Null,
            serde_json::Value::Bool(b) => AttrValue::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => AttrValue::Int(i),
                None => AttrValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => AttrValue::Str(s.clone()),
            // Nested containers are flattened to their JSON text; attribute
            // bags are scalar-per-field.
            other => AttrValue::Str(other.to_string()),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            AttrValue::Null => serde_json::Value::Null,
            AttrValue::Bool(b) => serde_json::Value::Bool(*b),
            AttrValue::Int(i) => serde_json::Value::from(*i),
            AttrValue::Float(f) => serde_json::Value::from(*f),
            AttrValue::Str(s) => serde_json::Value::from(s.as_str()),
        }
    }
}

/// Ordered field-name -> value mapping. Order is the field order of the
/// source layer, preserved through to emitted layers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttrBag(pub Vec<(String, AttrValue)>);

impl AttrBag {
    pub fn new() -> Self {
        AttrBag(Vec::new())
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Replace an existing field or append a new one at the end.
    pub fn set(&mut self, name: &str, value: AttrValue) {
        match self.0.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value,
            None => self.0.push((name.to_string(), value)),
        }
    }
}

impl FromIterator<(String, AttrValue)> for AttrBag {
    fn from_iter<T: IntoIterator<Item = (String, AttrValue)>>(iter: T) -> Self {
        AttrBag(iter.into_iter().collect())
    }
}

/// Field type as exposed by the attribute schema accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Str,
    Int,
    Float,
    Bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
}

/// Ordered list of attribute fields. Opaque pass-through data from the
/// core's perspective, used only when emitting derived layers.
pub type Schema = Vec<FieldSpec>;

/// One input line feature: identifier, ordered vertex sequence, attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub feat_id: FeatId,
    pub geometry: Vec<Coord>,
    pub attrs: AttrBag,
}

impl Feature {
    pub fn new(feat_id: FeatId, geometry: Vec<Coord>, attrs: AttrBag) -> Self {
        Feature {
            feat_id,
            geometry,
            attrs,
        }
    }
}
