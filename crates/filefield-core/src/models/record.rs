use std::collections::BTreeMap;

use serde::Serialize;

use super::file::FileValue;

/// One entry of a decoded form.
///
/// `List` holds every occurrence of a repeated field and never nests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    File(FileValue),
    List(Vec<FieldValue>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileValue> {
        match self {
            FieldValue::File(file) => Some(file),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, FieldValue::List(_))
    }

    /// Number of occurrences this value stands for.
    pub fn occurrences(&self) -> usize {
        match self {
            FieldValue::List(items) => items.len(),
            _ => 1,
        }
    }

    /// Every occurrence, whether the value is bare or a list.
    pub fn iter(&self) -> impl Iterator<Item = &FieldValue> {
        let items: &[FieldValue] = match self {
            FieldValue::List(items) => items,
            single => std::slice::from_ref(single),
        };
        items.iter()
    }
}

/// The decoded body: field key to value.
///
/// Keys are normalized part names (array marker stripped). A field's first occurrence is
/// stored bare and promoted to a `List` when a second one arrives, unless the caller asks
/// for a sequence from the start.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResultRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl ResultRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value` under `key`, promoting an existing bare value to a list.
    pub fn append(&mut self, key: &str, value: FieldValue, as_sequence: bool) {
        let incoming = match value {
            FieldValue::List(items) => items,
            single => vec![single],
        };

        match self.fields.remove(key) {
            None if as_sequence || incoming.len() > 1 => {
                self.fields
                    .insert(key.to_string(), FieldValue::List(incoming));
            }
            None => {
                if let Some(single) = incoming.into_iter().next() {
                    self.fields.insert(key.to_string(), single);
                }
            }
            Some(FieldValue::List(mut items)) => {
                items.extend(incoming);
                self.fields.insert(key.to_string(), FieldValue::List(items));
            }
            Some(existing) => {
                let mut items = Vec::with_capacity(incoming.len() + 1);
                items.push(existing);
                items.extend(incoming);
                self.fields.insert(key.to_string(), FieldValue::List(items));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Number of values currently stored under `key`.
    pub fn count(&self, key: &str) -> usize {
        self.fields.get(key).map_or(0, FieldValue::occurrences)
    }

    /// The bare text value stored under `key`.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(FieldValue::as_text)
    }

    /// The bare file value stored under `key`.
    pub fn file(&self, key: &str) -> Option<&FileValue> {
        self.fields.get(key).and_then(FieldValue::as_file)
    }

    /// Every file stored under `key`, bare or listed.
    pub fn files(&self, key: &str) -> Vec<&FileValue> {
        self.fields
            .get(key)
            .map(|value| value.iter().filter_map(FieldValue::as_file).collect())
            .unwrap_or_default()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        self.fields.remove(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_inner(self) -> BTreeMap<String, FieldValue> {
        self.fields
    }
}
