//! Array and object operations on stored values.

use serde::Serialize;

use crate::error::{JsonKvError, Result};
use crate::store::JsonKv;
use crate::value::{MAX_DEPTH, Value};

impl JsonKv {
    /// Appends `value` to the array stored under `key`.
    ///
    /// A missing key, or one holding anything other than an array, is first
    /// replaced with an empty array. The previous value is discarded without
    /// error. The array adds one level of nesting, so `value` must stay
    /// below [`MAX_DEPTH`]. Returns the new length.
    pub fn push<T: Serialize>(&mut self, key: &str, value: T) -> Result<usize> {
        let value = Value::from_serialize(value)?;
        if value.depth() >= MAX_DEPTH {
            return Err(JsonKvError::InvalidValue(format!(
                "pushing onto {key:?} would nest deeper than {MAX_DEPTH} levels"
            )));
        }
        self.mutate(|data| {
            let entry = data.entry(key.to_string()).or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(items) = &mut *entry {
                items.push(value);
                return Ok(items.len());
            }
            *entry = Value::Array(vec![value]);
            Ok(1)
        })
    }

    /// Returns the element at `index` of the array stored under `key`.
    ///
    /// An index past the end yields `Ok(None)`.
    pub fn array_fetch(&self, key: &str, index: usize) -> Result<Option<&Value>> {
        match self.fetch(key) {
            Some(Value::Array(items)) => Ok(items.get(index)),
            _ => Err(JsonKvError::ArrayNotFound(key.to_string())),
        }
    }

    /// Removes every element equal to `value` from the array under `key`.
    ///
    /// Does nothing when the key does not hold an array. Returns the number
    /// of elements removed.
    pub fn delete<T: Serialize>(&mut self, key: &str, value: T) -> Result<usize> {
        let value = Value::from_serialize(value)?;
        if !self.fetch(key).is_some_and(Value::is_array) {
            return Ok(0);
        }
        self.mutate(|data| match data.get_mut(key) {
            Some(Value::Array(items)) => {
                let before = items.len();
                items.retain(|item| *item != value);
                Ok(before - items.len())
            }
            _ => Ok(0),
        })
    }

    /// Returns `sub_key` of the object stored under `key`.
    pub fn object_fetch(&self, key: &str, sub_key: &str) -> Result<Option<&Value>> {
        match self.fetch(key) {
            Some(Value::Object(map)) => Ok(map.get(sub_key)),
            _ => Err(JsonKvError::ObjectNotFound(key.to_string())),
        }
    }

    /// Removes `key` from the object stored under `object_key`.
    pub fn delete_key(&mut self, object_key: &str, key: &str) -> Result<bool> {
        if !self.fetch(object_key).is_some_and(Value::is_object) {
            return Err(JsonKvError::ObjectNotFound(object_key.to_string()));
        }
        self.mutate(|data| match data.get_mut(object_key) {
            Some(Value::Object(map)) => Ok(map.shift_remove(key).is_some()),
            _ => Err(JsonKvError::ObjectNotFound(object_key.to_string())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn open() -> (TempDir, JsonKv) {
        let dir = tempfile::tempdir().unwrap();
        let kv = JsonKv::open(dir.path().join("collections.json")).unwrap();
        (dir, kv)
    }

    #[test]
    fn test_push_creates_and_appends() {
        let (dir, mut kv) = open();

        assert_eq!(kv.push("list", 1).unwrap(), 1);
        assert_eq!(kv.push("list", "two").unwrap(), 2);
        assert_eq!(kv.fetch("list"), Some(&Value::from(vec![Value::from(1), Value::from("two")])));

        let reopened = JsonKv::open(dir.path().join("collections.json")).unwrap();
        assert_eq!(reopened.array_fetch("list", 1).unwrap(), Some(&Value::from("two")));
    }

    #[test]
    fn test_push_replaces_non_array() {
        let (_dir, mut kv) = open();
        kv.set("a", "not a list").unwrap();

        assert_eq!(kv.push("a", 1).unwrap(), 1);
        assert_eq!(kv.fetch("a"), Some(&Value::from(vec![1])));
    }

    #[test]
    fn test_push_rejects_null() {
        let (_dir, mut kv) = open();
        let err = kv.push("a", None::<i32>).unwrap_err();
        assert!(matches!(err, JsonKvError::InvalidValue(_)));
        assert!(!kv.has("a"));
    }

    #[test]
    fn test_array_fetch() {
        let (_dir, mut kv) = open();
        kv.set("pair", vec![10, 20]).unwrap();
        kv.set("name", "alice").unwrap();

        assert_eq!(kv.array_fetch("pair", 0).unwrap(), Some(&Value::from(10)));
        assert_eq!(kv.array_fetch("pair", 5).unwrap(), None);
        assert!(matches!(kv.array_fetch("name", 0), Err(JsonKvError::ArrayNotFound(_))));
        assert!(matches!(kv.array_fetch("missing", 0), Err(JsonKvError::ArrayNotFound(_))));
    }

    #[test]
    fn test_delete_removes_all_matches() {
        let (_dir, mut kv) = open();
        kv.set("tags", json!(["a", "b", "a", {"k": 1}, {"k": 1}])).unwrap();

        assert_eq!(kv.delete("tags", "a").unwrap(), 2);
        assert_eq!(kv.delete("tags", json!({"k": 1})).unwrap(), 2);
        assert_eq!(kv.fetch("tags"), Some(&Value::from(vec!["b"])));
        assert_eq!(kv.delete("tags", "zzz").unwrap(), 0);
    }

    #[test]
    fn test_delete_on_non_array_is_noop() {
        let (_dir, mut kv) = open();
        kv.set("name", "alice").unwrap();

        assert_eq!(kv.delete("name", "alice").unwrap(), 0);
        assert_eq!(kv.delete("missing", 1).unwrap(), 0);
        assert_eq!(kv.fetch("name"), Some(&Value::from("alice")));
        assert!(!kv.has("missing"));
    }

    #[test]
    fn test_object_fetch() {
        let (_dir, mut kv) = open();
        kv.set("cfg", json!({"host": "localhost", "port": 8080})).unwrap();
        kv.set("list", vec![1]).unwrap();

        assert_eq!(kv.object_fetch("cfg", "port").unwrap(), Some(&Value::from(8080)));
        assert_eq!(kv.object_fetch("cfg", "missing").unwrap(), None);
        assert!(matches!(kv.object_fetch("list", "x"), Err(JsonKvError::ObjectNotFound(_))));
        assert!(matches!(kv.object_fetch("nope", "x"), Err(JsonKvError::ObjectNotFound(_))));
    }

    #[test]
    fn test_delete_key() {
        let (dir, mut kv) = open();
        kv.set("cfg", json!({"host": "localhost", "port": 8080, "debug": true})).unwrap();

        assert!(kv.delete_key("cfg", "port").unwrap());
        assert!(!kv.delete_key("cfg", "port").unwrap());
        assert!(matches!(kv.delete_key("missing", "x"), Err(JsonKvError::ObjectNotFound(_))));

        let reopened = JsonKv::open(dir.path().join("collections.json")).unwrap();
        let cfg = reopened.fetch("cfg").and_then(Value::as_object).unwrap();
        assert_eq!(cfg.keys().collect::<Vec<_>>(), ["host", "debug"]);
    }
}
