use {Error, Ticket};
use context::ChangeContext;
use json;
use std::fmt;
use op::RemoveOperation;
use super::{JsonArray, set_in_object};
use value::{IntoValue, Record, Value};

/// A mutable view of an object inside a transaction.
pub struct JsonObject<'c, 'r: 'c> {
    context: &'c mut ChangeContext<'r>,
    id: Ticket,
}

impl<'c, 'r> JsonObject<'c, 'r> {
    pub(crate) fn new(context: &'c mut ChangeContext<'r>, id: Ticket) -> Self {
        JsonObject{context, id}
    }

    /// The ticket of the object.
    pub fn id(&self) -> &Ticket {
        &self.id
    }

    /// Binds `value` under `key`, replacing the current value.
    /// Nothing is changed if `value` cannot be converted.
    pub fn set<V: IntoValue>(&mut self, key: &str, value: V) -> Result<(), Error> {
        let value = value.into_value()?;
        let _ = set_in_object(self.context, &self.id, key, value)?;
        Ok(())
    }

    /// Binds several members in the given order. Every value is
    /// converted before the first one is bound.
    pub fn set_values<K, V, I>(&mut self, members: I) -> Result<(), Error>
        where K: Into<String>, V: IntoValue, I: IntoIterator<Item=(K, V)>
    {
        let members = members.into_iter()
            .map(|(k, v)| Ok((k.into(), v.into_value()?)))
            .collect::<Result<Vec<(String, Value)>, Error>>()?;
        for (key, value) in members {
            let _ = set_in_object(self.context, &self.id, &key, value)?;
        }
        Ok(())
    }

    /// Binds a record under `key` as a nested object.
    pub fn set_record<R: Record + ?Sized>(&mut self, key: &str, record: &R) -> Result<(), Error> {
        self.set(key, Value::from_record(record))
    }

    /// Binds an empty object under `key` and returns a view of it.
    pub fn set_object<'s>(&'s mut self, key: &str) -> Result<JsonObject<'s, 'r>, Error> {
        let id = set_in_object(self.context, &self.id, key, Value::Object(vec![]))?;
        Ok(JsonObject::new(self.context, id))
    }

    /// Binds an empty array under `key` and returns a view of it.
    pub fn set_array<'s>(&'s mut self, key: &str) -> Result<JsonArray<'s, 'r>, Error> {
        let id = set_in_object(self.context, &self.id, key, Value::Array(vec![]))?;
        Ok(JsonArray::new(self.context, id))
    }

    /// Returns a snapshot of the value under `key`.
    pub fn get(&self, key: &str) -> Option<Value> {
        let root = self.context.root();
        let element = root.object_get(&self.id, key).ok()?;
        root.element_value(element.created_at()).ok()
    }

    /// Returns a view of the object under `key`.
    pub fn get_object<'s>(&'s mut self, key: &str) -> Result<JsonObject<'s, 'r>, Error> {
        let id = {
            let element = self.context.root().object_get(&self.id, key)?;
            element.as_object()?;
            element.created_at().clone()
        };
        Ok(JsonObject::new(self.context, id))
    }

    /// Returns a view of the array under `key`.
    pub fn get_array<'s>(&'s mut self, key: &str) -> Result<JsonArray<'s, 'r>, Error> {
        let id = {
            let element = self.context.root().object_get(&self.id, key)?;
            element.as_array()?;
            element.created_at().clone()
        };
        Ok(JsonArray::new(self.context, id))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.context.root().object_get(&self.id, key).is_ok()
    }

    /// Keys holding live values, in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.context.root().object_keys(&self.id).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.keys().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes the value under `key` and returns a snapshot of it.
    /// Removing a missing key does nothing.
    pub fn remove(&mut self, key: &str) -> Result<Option<Value>, Error> {
        let (created_at, value) = {
            let root = self.context.root();
            let element = match root.object_get(&self.id, key) {
                Ok(element) => element,
                Err(Error::NotFound) => return Ok(None),
                Err(err) => return Err(err),
            };
            (element.created_at().clone(), root.element_value(element.created_at())?)
        };
        let ticket = self.context.issue_ticket();
        self.context.push(RemoveOperation::new(self.id.clone(), ticket, created_at))?;
        Ok(Some(value))
    }

    /// Returns a snapshot of the whole object.
    pub fn to_value(&self) -> Value {
        self.context.root().element_value(&self.id).unwrap_or(Value::Object(vec![]))
    }

    pub fn to_json(&self) -> String {
        json::to_json(&self.to_value())
    }

    pub fn to_sorted_json(&self) -> String {
        json::to_sorted_json(&self.to_value())
    }
}

impl<'c, 'r> fmt::Debug for JsonObject<'c, 'r> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("JsonObject").field("id", &self.id).finish()
    }
}
