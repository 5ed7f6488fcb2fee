//! The `Root` is the arena every element of a document lives in.
//! Elements are registered by their `created_at` ticket and refer to
//! their parent and children by ticket only, so any element can be
//! resolved in O(1) regardless of how deep it is nested.
//!
//! Tombstoned elements stay registered until garbage collection. The
//! root keeps the set of tombstoned elements so that the amount of
//! garbage can be reported without walking the tree.

use {ActorId, Error, Ticket};
use element::{Element, ElementBody};
use object::ObjectNode;
use std::collections::{BTreeSet, HashMap, HashSet};
use value::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct Root {
    root_id: Ticket,
    elements: HashMap<Ticket, Element>,
    removed: BTreeSet<Ticket>,
}

impl Root {
    /// Creates a root holding an empty object.
    pub fn new() -> Self {
        let root_id = Ticket::initial();
        let object = Element::new(root_id.clone(), ElementBody::Object(ObjectNode::new()));
        let mut elements = HashMap::new();
        elements.insert(root_id.clone(), object);
        Root{root_id, elements, removed: BTreeSet::new()}
    }

    /// The ticket of the root object.
    pub fn id(&self) -> &Ticket {
        &self.root_id
    }

    pub fn find(&self, created_at: &Ticket) -> Option<&Element> {
        self.elements.get(created_at)
    }

    pub(crate) fn find_mut(&mut self, created_at: &Ticket) -> Option<&mut Element> {
        self.elements.get_mut(created_at)
    }

    pub fn contains(&self, created_at: &Ticket) -> bool {
        self.elements.contains_key(created_at)
    }

    /// The number of registered elements, tombstones and the root
    /// object included.
    pub fn element_len(&self) -> usize {
        self.elements.len()
    }

    pub(crate) fn register(&mut self, element: Element) {
        if element.is_removed() {
            self.removed.insert(element.created_at().clone());
        }
        self.elements.insert(element.created_at().clone(), element);
    }

    /// Tombstones an element at `at` and records it as garbage.
    /// Returns true iff the element was live before.
    pub(crate) fn tombstone(&mut self, created_at: &Ticket, at: &Ticket) -> Result<bool, Error> {
        try_assert!(*created_at != self.root_id, Error::TypeMismatch);
        let was_live = self.elements.get_mut(created_at).ok_or(Error::NotFound)?.remove(at);
        self.removed.insert(created_at.clone());
        Ok(was_live)
    }

    /// Returns `created_at` followed by every registered descendant.
    pub fn subtree(&self, created_at: &Ticket) -> Vec<Ticket> {
        let mut result = vec![];
        let mut stack = vec![created_at.clone()];
        while let Some(id) = stack.pop() {
            if let Some(element) = self.elements.get(&id) {
                stack.extend(element.children());
                result.push(id);
            }
        }
        result
    }

    /// Returns the number of elements garbage collection would purge
    /// with an open-ended threshold: every tombstoned element plus
    /// everything nested in one.
    pub fn garbage_len(&self) -> usize {
        let mut seen = HashSet::new();
        for id in &self.removed {
            for descendant in self.subtree(id) {
                seen.insert(descendant);
            }
        }
        seen.len()
    }

    /// Purges every element tombstoned at or before `threshold`,
    /// along with everything nested in it, and returns the number
    /// of elements purged.
    pub fn garbage_collect(&mut self, threshold: &Ticket) -> usize {
        let expired: Vec<Ticket> = self.removed.iter()
            .filter(|id| match self.elements.get(id).and_then(|e| e.removed_at()) {
                Some(removed_at) => removed_at <= threshold,
                None => true,
            })
            .cloned()
            .collect();

        let mut purged = 0;
        for id in expired {
            if !self.elements.contains_key(&id) {
                self.removed.remove(&id);
                continue
            }
            self.detach(&id);
            for descendant in self.subtree(&id) {
                self.removed.remove(&descendant);
                if self.elements.remove(&descendant).is_some() {
                    purged += 1;
                }
            }
        }
        debug!(purged, threshold = %threshold, "collected garbage");
        purged
    }

    fn detach(&mut self, created_at: &Ticket) {
        let parent = match self.elements.get(created_at).and_then(|e| e.parent()) {
            Some(parent) => parent.clone(),
            None => return,
        };
        match self.elements.get_mut(&parent).map(|e| e.body_mut()) {
            Some(ElementBody::Object(object)) => object.purge(created_at),
            Some(ElementBody::Array(array)) => array.purge(created_at),
            _ => (),
        }
    }

    /// Returns the path of a live element, e.g. `$.todos.0.title`.
    /// Segments are object keys and array indices with `$`, `.` and
    /// `\` escaped.
    pub fn path_of(&self, created_at: &Ticket) -> Result<String, Error> {
        let mut segments = vec![];
        let mut current = created_at.clone();
        while current != self.root_id {
            let element = self.elements.get(&current).ok_or(Error::NotFound)?;
            let parent_id = element.parent().ok_or(Error::NotFound)?.clone();
            let parent = self.elements.get(&parent_id).ok_or(Error::NotFound)?;
            let segment = match *parent.body() {
                ElementBody::Object(ref object) =>
                    object.key_of(&current).ok_or(Error::NotFound)?.to_owned(),
                ElementBody::Array(_) =>
                    self.array_index_of_id(&parent_id, &current)?.to_string(),
                ElementBody::Primitive(_) => return Err(Error::TypeMismatch),
            };
            segments.push(escape_segment(&segment));
            current = parent_id;
        }

        let mut path = String::from("$");
        for segment in segments.iter().rev() {
            path.push('.');
            path.push_str(segment);
        }
        Ok(path)
    }

    /// Returns an owned snapshot of the live tree.
    pub fn to_value(&self) -> Value {
        self.element_value(&self.root_id).unwrap_or(Value::Object(vec![]))
    }

    /// Returns an owned snapshot of the subtree rooted at `created_at`.
    pub fn element_value(&self, created_at: &Ticket) -> Result<Value, Error> {
        let element = self.elements.get(created_at).ok_or(Error::NotFound)?;
        Ok(match *element.body() {
            ElementBody::Primitive(ref p) => p.to_value(),
            ElementBody::Object(ref object) => {
                let mut members = vec![];
                for (key, child) in object.members() {
                    match self.elements.get(child) {
                        Some(e) if !e.is_removed() => members.push((key.clone(), self.element_value(child)?)),
                        _ => (),
                    }
                }
                Value::Object(members)
            }
            ElementBody::Array(_) => {
                let mut items = vec![];
                for child in self.array_live_ids(created_at)? {
                    items.push(self.element_value(&child)?);
                }
                Value::Array(items)
            }
        })
    }

    /// Binds `actor` to every ticket minted before the replica had one.
    pub(crate) fn set_actor(&mut self, actor: &ActorId) {
        self.root_id.set_actor(actor);
        self.elements = self.elements.drain()
            .map(|(mut id, mut element)| {
                id.set_actor(actor);
                element.set_actor(actor);
                (id, element)
            })
            .collect();
        let removed = ::std::mem::replace(&mut self.removed, BTreeSet::new());
        self.removed = removed.into_iter()
            .map(|mut id| { id.set_actor(actor); id })
            .collect();
    }
}

impl Default for Root {
    fn default() -> Self {
        Root::new()
    }
}

pub fn escape_segment(segment: &str) -> String {
    let mut escaped = String::with_capacity(segment.len());
    for c in segment.chars() {
        if c == '$' || c == '.' || c == '\\' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
