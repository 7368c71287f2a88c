//! Curves and ordered curve collections.
//!
//! A [`CurveCollection`] keeps its entries in insertion order. Some engine
//! commands depend on that order (several efficiency curves keyed by head,
//! for example), so nothing in this module ever sorts keys.

use crate::time::{format_timestamp, parse_timestamp};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;

/// An x/y relationship. Index `i` pairs `x_values[i]` with `y_values[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_unit: Option<String>,
    pub x_values: Vec<f64>,
    pub y_values: Vec<f64>,
}

impl Curve {
    /// Creates a curve without unit labels.
    pub fn new(x_values: Vec<f64>, y_values: Vec<f64>) -> Self {
        Self {
            x_unit: None,
            y_unit: None,
            x_values,
            y_values,
        }
    }

    /// Attaches unit labels.
    #[must_use]
    pub fn with_units(mut self, x_unit: Option<String>, y_unit: Option<String>) -> Self {
        self.x_unit = x_unit;
        self.y_unit = y_unit;
        self
    }

    /// Returns an error unless both sequences have the same length.
    pub fn check_aligned(&self) -> Result<()> {
        if self.x_values.len() == self.y_values.len() {
            Ok(())
        } else {
            Err(Error::ShapeMismatch(format!(
                "curve has {} x values but {} y values",
                self.x_values.len(),
                self.y_values.len()
            )))
        }
    }
}

/// Reference key of a curve collection, stored as text in JSON objects.
pub trait CollectionKey: Clone + PartialEq + Sized {
    /// Text form used as the JSON object key.
    fn to_key(&self) -> String;

    /// Parses the JSON object key back.
    fn parse_key(raw: &str) -> Result<Self>;
}

impl CollectionKey for f64 {
    fn to_key(&self) -> String {
        self.to_string()
    }

    fn parse_key(raw: &str) -> Result<Self> {
        match raw.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(Error::InvalidCollectionKey(raw.to_string())),
        }
    }
}

impl CollectionKey for DateTime<Utc> {
    fn to_key(&self) -> String {
        format_timestamp(self)
    }

    fn parse_key(raw: &str) -> Result<Self> {
        parse_timestamp(raw).map_err(|_| Error::InvalidCollectionKey(raw.to_string()))
    }
}

/// Ordered mapping from a reference key to a curve.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveCollection<K> {
    entries: Vec<(K, Curve)>,
}

/// Curves keyed by a number (head, for example).
pub type FloatCurveCollection = CurveCollection<f64>;

/// Curves keyed by a point in time.
pub type TimeCurveCollection = CurveCollection<DateTime<Utc>>;

impl<K: CollectionKey> CurveCollection<K> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Inserts a curve. A new key goes to the end; an existing key keeps its
    /// position and has its curve replaced.
    pub fn insert(&mut self, key: K, curve: Curve) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = curve,
            None => self.entries.push((key, curve)),
        }
    }

    pub fn get(&self, key: &K) -> Option<&Curve> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, c)| c)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &Curve)> {
        self.entries.iter().map(|(k, c)| (k, c))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: CollectionKey> Default for CurveCollection<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: CollectionKey> FromIterator<(K, Curve)> for CurveCollection<K> {
    fn from_iter<I: IntoIterator<Item = (K, Curve)>>(iter: I) -> Self {
        let mut collection = Self::new();
        for (key, curve) in iter {
            collection.insert(key, curve);
        }
        collection
    }
}

impl<K> IntoIterator for CurveCollection<K> {
    type Item = (K, Curve);
    type IntoIter = std::vec::IntoIter<(K, Curve)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: CollectionKey> Serialize for CurveCollection<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, curve) in &self.entries {
            map.serialize_entry(&key.to_key(), curve)?;
        }
        map.end()
    }
}

struct CollectionVisitor<K>(PhantomData<K>);

impl<'de, K: CollectionKey> Visitor<'de> for CollectionVisitor<K> {
    type Value = CurveCollection<K>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object mapping reference keys to curves")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
        let mut collection = CurveCollection::new();
        while let Some((raw, curve)) = access.next_entry::<String, Curve>()? {
            let key = K::parse_key(&raw).map_err(serde::de::Error::custom)?;
            collection.insert(key, curve);
        }
        Ok(collection)
    }
}

impl<'de, K: CollectionKey> Deserialize<'de> for CurveCollection<K> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(CollectionVisitor(PhantomData))
    }
}
