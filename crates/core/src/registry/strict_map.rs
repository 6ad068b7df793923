//! [`StrictMap`]: name-keyed collection with short-name aliases and ambiguity markers.

use std::collections::HashMap;

use crate::error::LookupError;

/// Marker left behind when two qualified names share one short name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ambiguity {
    subject: String,
}

impl Ambiguity {
    pub fn subject(&self) -> &str {
        &self.subject
    }
}

#[derive(Debug, Clone)]
enum Slot<V> {
    /// Value registered under its own key.
    Bound(V),
    /// Short-name alias of the qualified key `target`.
    Alias { target: String, value: V },
    Ambiguous(Ambiguity),
}

/// Trailing segment after the last `.`, if the key has one.
pub fn short_name(key: &str) -> Option<&str> {
    key.rsplit_once('.')
        .map(|(_, short)| short)
        .filter(|short| !short.is_empty())
}

/// A name-keyed map where inserting `namespace.id` also makes the value
/// reachable as `id`, unless another qualified key already claimed `id`,
/// in which case `id` turns into a permanent [`Ambiguity`].
///
/// Re-inserting an existing key replaces it, and drops that key's own
/// short-name alias first, so reloading the same entry never marks its
/// short name ambiguous.
#[derive(Debug, Clone)]
pub struct StrictMap<V> {
    name: &'static str,
    slots: HashMap<String, Slot<V>>,
}

impl<V: Clone> StrictMap<V> {
    /// Create an empty map; `name` appears in lookup errors.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            slots: HashMap::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Bind `key` to `value`, returning the value previously bound to `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        let key = key.into();
        let previous = self.remove(&key);

        if let Some(short) = short_name(&key) {
            let slot = if self.slots.contains_key(short) {
                Slot::Ambiguous(Ambiguity {
                    subject: short.to_string(),
                })
            } else {
                Slot::Alias {
                    target: key.clone(),
                    value: value.clone(),
                }
            };
            self.slots.insert(short.to_string(), slot);
        }

        self.slots.insert(key, Slot::Bound(value));
        previous
    }

    /// Remove whatever is bound at `key`, plus the short-name alias it owns.
    ///
    /// Ambiguity markers on the short name are left in place.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        let removed = self.slots.remove(key)?;

        if let Some(short) = short_name(key) {
            let owns_alias = matches!(
                self.slots.get(short),
                Some(Slot::Alias { target, .. }) if target == key
            );
            if owns_alias {
                self.slots.remove(short);
            }
        }

        match removed {
            Slot::Bound(value) | Slot::Alias { value, .. } => Some(value),
            Slot::Ambiguous(_) => None,
        }
    }

    /// Look up a qualified name or an unambiguous short name.
    pub fn get(&self, name: &str) -> Result<&V, LookupError> {
        match self.slots.get(name) {
            Some(Slot::Bound(value)) | Some(Slot::Alias { value, .. }) => Ok(value),
            Some(Slot::Ambiguous(ambiguity)) => Err(LookupError::Ambiguous {
                collection: self.name,
                name: ambiguity.subject.clone(),
            }),
            None => Err(LookupError::NotFound {
                collection: self.name,
                name: name.to_string(),
            }),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_ok()
    }

    pub fn is_ambiguous(&self, name: &str) -> bool {
        self.ambiguity(name).is_some()
    }

    pub fn ambiguity(&self, name: &str) -> Option<&Ambiguity> {
        match self.slots.get(name) {
            Some(Slot::Ambiguous(ambiguity)) => Some(ambiguity),
            _ => None,
        }
    }

    /// Number of values registered under their own key (aliases excluded).
    pub fn len(&self) -> usize {
        self.slots
            .values()
            .filter(|slot| matches!(slot, Slot::Bound(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys registered directly (no aliases, no markers).
    pub fn qualified_names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().filter_map(|(key, slot)| match slot {
            Slot::Bound(_) => Some(key.as_str()),
            _ => None,
        })
    }

    /// Values registered directly, each once.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.slots.values().filter_map(|slot| match slot {
            Slot::Bound(value) => Some(value),
            _ => None,
        })
    }
}
