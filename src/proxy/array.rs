use {Error, Ticket};
use context::ChangeContext;
use json;
use op::{MoveOperation, RemoveOperation};
use std::cmp;
use std::fmt;
use super::{JsonObject, add_to_array};
use value::{IntoValue, Value};

/// Returned by searches that find nothing.
pub const NOT_FOUND: i64 = -1;

/// A mutable view of an array inside a transaction. Elements are
/// addressed either by their index among live elements or by ticket.
pub struct JsonArray<'c, 'r: 'c> {
    context: &'c mut ChangeContext<'r>,
    id: Ticket,
}

impl<'c, 'r> JsonArray<'c, 'r> {
    pub(crate) fn new(context: &'c mut ChangeContext<'r>, id: Ticket) -> Self {
        JsonArray{context, id}
    }

    /// The ticket of the array.
    pub fn id(&self) -> &Ticket {
        &self.id
    }

    pub fn len(&self) -> usize {
        self.context.root().array_len(&self.id).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn last_slot(&self) -> Result<Ticket, Error> {
        Ok(self.context.root().find(&self.id).ok_or(Error::NotFound)?.as_array()?.last().clone())
    }

    fn live_ids(&self) -> Vec<Ticket> {
        self.context.root().array_live_ids(&self.id).unwrap_or_default()
    }

    /// Appends `value` and returns the ticket of the new element.
    pub fn push<V: IntoValue>(&mut self, value: V) -> Result<Ticket, Error> {
        let value = value.into_value()?;
        let last = self.last_slot()?;
        add_to_array(self.context, &self.id, &last, value)
    }

    /// Appends an empty object and returns a view of it.
    pub fn push_object<'s>(&'s mut self) -> Result<JsonObject<'s, 'r>, Error> {
        let id = self.push(Value::Object(vec![]))?;
        Ok(JsonObject::new(self.context, id))
    }

    /// Appends an empty array and returns a view of it.
    pub fn push_array<'s>(&'s mut self) -> Result<JsonArray<'s, 'r>, Error> {
        let id = self.push(Value::Array(vec![]))?;
        Ok(JsonArray::new(self.context, id))
    }

    /// Inserts `value` directly after the element `prev`.
    pub fn insert_after<V: IntoValue>(&mut self, prev: &Ticket, value: V) -> Result<Ticket, Error> {
        let value = value.into_value()?;
        self.context.root().array_get_by_id(&self.id, prev)?;
        let slot = self.context.root().array_slot_of(&self.id, prev)?;
        add_to_array(self.context, &self.id, &slot, value)
    }

    /// Inserts `value` directly before the element `next`.
    pub fn insert_before<V: IntoValue>(&mut self, next: &Ticket, value: V) -> Result<Ticket, Error> {
        let value = value.into_value()?;
        self.context.root().array_get_by_id(&self.id, next)?;
        let prev = self.context.root().array_slot_before(&self.id, next)?;
        add_to_array(self.context, &self.id, &prev, value)
    }

    /// Returns a snapshot of the element at `index`.
    pub fn get(&self, index: usize) -> Option<Value> {
        let root = self.context.root();
        let element = root.array_get_by_index(&self.id, index).ok()?;
        root.element_value(element.created_at()).ok()
    }

    /// Returns a snapshot of the live element `id`.
    pub fn get_by_id(&self, id: &Ticket) -> Option<Value> {
        let root = self.context.root();
        let element = root.array_get_by_id(&self.id, id).ok()?;
        root.element_value(element.created_at()).ok()
    }

    pub fn get_last(&self) -> Option<Value> {
        let root = self.context.root();
        let element = root.array_get_last(&self.id).ok()?;
        root.element_value(element.created_at()).ok()
    }

    /// Returns the ticket of the element at `index`.
    pub fn id_at(&self, index: usize) -> Option<Ticket> {
        let element = self.context.root().array_get_by_index(&self.id, index).ok()?;
        Some(element.created_at().clone())
    }

    /// Returns a view of the object at `index`.
    pub fn get_object<'s>(&'s mut self, index: usize) -> Result<JsonObject<'s, 'r>, Error> {
        let id = {
            let element = self.context.root().array_get_by_index(&self.id, index)?;
            element.as_object()?;
            element.created_at().clone()
        };
        Ok(JsonObject::new(self.context, id))
    }

    /// Returns a view of the array at `index`.
    pub fn get_array<'s>(&'s mut self, index: usize) -> Result<JsonArray<'s, 'r>, Error> {
        let id = {
            let element = self.context.root().array_get_by_index(&self.id, index)?;
            element.as_array()?;
            element.created_at().clone()
        };
        Ok(JsonArray::new(self.context, id))
    }

    /// Removes the element at `index` and returns a snapshot of it.
    /// An index past the end does nothing.
    pub fn remove(&mut self, index: usize) -> Result<Option<Value>, Error> {
        match self.id_at(index) {
            Some(id) => self.remove_by_id(&id),
            None => Ok(None),
        }
    }

    /// Removes the element `id` and returns a snapshot of it. Removing
    /// an element that is already removed does nothing.
    pub fn remove_by_id(&mut self, id: &Ticket) -> Result<Option<Value>, Error> {
        let value = match self.get_by_id(id) {
            Some(value) => value,
            None => return Ok(None),
        };
        let ticket = self.context.issue_ticket();
        self.context.push(RemoveOperation::new(self.id.clone(), ticket, id.clone()))?;
        Ok(Some(value))
    }

    fn move_after_slot(&mut self, prev: Ticket, id: &Ticket) -> Result<(), Error> {
        self.context.root().array_get_by_id(&self.id, id)?;
        if self.context.root().array_slot_of(&self.id, id)? == prev {
            return Ok(())
        }
        let ticket = self.context.issue_ticket();
        self.context.push(MoveOperation::new(self.id.clone(), ticket, prev, id.clone()))
    }

    /// Moves the element `id` directly after the element `prev`.
    pub fn move_after(&mut self, prev: &Ticket, id: &Ticket) -> Result<(), Error> {
        self.context.root().array_get_by_id(&self.id, prev)?;
        let slot = self.context.root().array_slot_of(&self.id, prev)?;
        self.move_after_slot(slot, id)
    }

    /// Moves the element `id` directly before the element `next`.
    pub fn move_before(&mut self, next: &Ticket, id: &Ticket) -> Result<(), Error> {
        if next == id {
            return self.context.root().array_get_by_id(&self.id, id).map(|_| ())
        }
        self.context.root().array_get_by_id(&self.id, next)?;
        let prev = self.context.root().array_slot_before(&self.id, next)?;
        self.move_after_slot(prev, id)
    }

    pub fn move_front(&mut self, id: &Ticket) -> Result<(), Error> {
        self.move_after_slot(Ticket::initial(), id)
    }

    pub fn move_last(&mut self, id: &Ticket) -> Result<(), Error> {
        let last = self.last_slot()?;
        self.move_after_slot(last, id)
    }

    /// Removes `delete_count` elements starting at `start` and inserts
    /// `items` in their place, with the semantics of JavaScript's
    /// `Array.prototype.splice`. A negative `start` counts from the
    /// end; a missing `delete_count` deletes through the end. Returns
    /// snapshots of the removed elements.
    pub fn splice<V: IntoValue>(&mut self, start: i64, delete_count: Option<i64>, items: Vec<V>) -> Result<Vec<Value>, Error> {
        let items = items.into_iter().map(|v| v.into_value()).collect::<Result<Vec<_>, _>>()?;
        let ids = self.live_ids();
        let len = ids.len() as i64;

        let from = match start < 0 {
            true => cmp::max(len + start, 0),
            false => cmp::min(start, len),
        };
        let to = match delete_count {
            None => len,
            Some(count) if count < 0 => from,
            Some(count) => cmp::min(from.saturating_add(count), len),
        };

        let mut removed = Vec::with_capacity((to - from) as usize);
        for id in &ids[from as usize..to as usize] {
            if let Some(value) = self.remove_by_id(id)? {
                removed.push(value);
            }
        }

        let mut prev = match from {
            0 => Ticket::initial(),
            _ => self.context.root().array_slot_of(&self.id, &ids[from as usize - 1])?,
        };
        for item in items {
            prev = add_to_array(self.context, &self.id, &prev, item)?;
        }
        Ok(removed)
    }

    /// Returns the index of the first element equal to `value`, searching
    /// forward from `from_index`, or `NOT_FOUND`.
    pub fn index_of(&self, value: &Value, from_index: Option<i64>) -> i64 {
        let items = self.items();
        let len = items.len() as i64;
        let start = match from_index.unwrap_or(0) {
            n if n >= len => return NOT_FOUND,
            n if n >= 0 => n,
            n => cmp::max(len + n, 0),
        };
        (start..len)
            .find(|&i| items[i as usize].same_as(value))
            .unwrap_or(NOT_FOUND)
    }

    /// Returns the index of the last element equal to `value`, searching
    /// backward from `from_index`, or `NOT_FOUND`.
    pub fn last_index_of(&self, value: &Value, from_index: Option<i64>) -> i64 {
        let items = self.items();
        let len = items.len() as i64;
        let start = match from_index.unwrap_or(len - 1) {
            n if n >= 0 => cmp::min(n, len - 1),
            n => len + n,
        };
        if start < 0 {
            return NOT_FOUND
        }
        (0..start + 1).rev()
            .find(|&i| items[i as usize].same_as(value))
            .unwrap_or(NOT_FOUND)
    }

    pub fn includes(&self, value: &Value, from_index: Option<i64>) -> bool {
        self.index_of(value, from_index) != NOT_FOUND
    }

    fn items(&self) -> Vec<Value> {
        match self.to_value() {
            Value::Array(items) => items,
            _ => vec![],
        }
    }

    /// Returns a snapshot of the whole array.
    pub fn to_value(&self) -> Value {
        self.context.root().element_value(&self.id).unwrap_or(Value::Array(vec![]))
    }

    pub fn to_json(&self) -> String {
        json::to_json(&self.to_value())
    }

    pub fn to_sorted_json(&self) -> String {
        json::to_sorted_json(&self.to_value())
    }
}

impl<'c, 'r> fmt::Debug for JsonArray<'c, 'r> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("JsonArray").field("id", &self.id).finish()
    }
}
