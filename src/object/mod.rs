//! An object node maps string keys to child elements. When several
//! values are bound to the same key, the value created with the
//! greatest ticket wins and every other value is tombstoned.

use {ActorId, Error, Ticket};
use element::Element;
use indexmap::IndexMap;
use root::Root;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectNode {
    members: IndexMap<String, Ticket>,
    children: HashMap<Ticket, String>,
    bound: HashMap<String, Vec<Ticket>>,
}

/// The outcome of binding a value to a key.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// The value now holds the key; `previous` is the value it displaced.
    Bound{previous: Option<Ticket>},
    /// A value with a greater ticket already holds the key.
    Superseded{by: Ticket},
}

impl ObjectNode {
    pub fn new() -> Self {
        ObjectNode{members: IndexMap::new(), children: HashMap::new(), bound: HashMap::new()}
    }

    /// Binds the child `created_at` to `key` under last-writer-wins.
    pub fn bind(&mut self, key: &str, created_at: Ticket) -> Binding {
        if self.children.insert(created_at.clone(), key.to_owned()).is_none() {
            self.bound.entry(key.to_owned()).or_insert_with(Vec::new).push(created_at.clone());
        }
        if let Some(current) = self.members.get(key) {
            if !created_at.after(current) {
                return Binding::Superseded{by: current.clone()}
            }
        }
        let previous = self.members.insert(key.to_owned(), created_at);
        Binding::Bound{previous}
    }

    /// Returns the ticket of the value holding `key`. The value
    /// may be tombstoned.
    pub fn get(&self, key: &str) -> Option<&Ticket> {
        self.members.get(key)
    }

    /// Returns the key a child was bound to.
    pub fn key_of(&self, created_at: &Ticket) -> Option<&str> {
        self.children.get(created_at).map(|k| k.as_str())
    }

    pub fn has_child(&self, created_at: &Ticket) -> bool {
        self.children.contains_key(created_at)
    }

    /// Every child ever bound to `key` except `except`.
    pub fn bound_to(&self, key: &str, except: &Ticket) -> Vec<Ticket> {
        self.bound.get(key)
            .map(|tickets| tickets.iter().filter(|t| *t != except).cloned().collect())
            .unwrap_or_default()
    }

    /// Iterates over keys and their current values in first-insertion order.
    pub fn members(&self) -> impl Iterator<Item=(&String, &Ticket)> {
        self.members.iter()
    }

    /// Iterates over every child ever bound to the object.
    pub fn children(&self) -> impl Iterator<Item=&Ticket> {
        self.children.keys()
    }

    /// Forgets a child for good. Used by garbage collection.
    pub fn purge(&mut self, created_at: &Ticket) {
        let key = match self.children.remove(created_at) {
            Some(key) => key,
            None => return,
        };
        if self.members.get(&key) == Some(created_at) {
            let _ = self.members.shift_remove(&key);
        }
        let emptied = match self.bound.get_mut(&key) {
            Some(tickets) => {
                tickets.retain(|t| t != created_at);
                tickets.is_empty()
            }
            None => false,
        };
        if emptied {
            self.bound.remove(&key);
        }
    }

    pub(crate) fn set_actor(&mut self, actor: &ActorId) {
        for ticket in self.members.values_mut() {
            ticket.set_actor(actor);
        }
        self.children = self.children.drain()
            .map(|(mut ticket, key)| { ticket.set_actor(actor); (ticket, key) })
            .collect();
        for ticket in self.bound.values_mut().flat_map(|tickets| tickets.iter_mut()) {
            ticket.set_actor(actor);
        }
    }
}

impl Default for ObjectNode {
    fn default() -> Self {
        ObjectNode::new()
    }
}

impl Root {
    /// Binds `element` under `key` in the object `object`. The loser
    /// of the last-writer-wins comparison (the displaced value, or
    /// `element` itself if a newer value already holds the key) is
    /// tombstoned at the winner's ticket and returned.
    ///
    /// Values that lost the key earlier are re-tombstoned at the new
    /// winner, so every loser ends up removed at the greatest ticket
    /// ever bound to the key whatever the delivery order.
    pub fn object_set(&mut self, object: &Ticket, key: &str, mut element: Element) -> Result<Option<Ticket>, Error> {
        let created_at = element.created_at().clone();
        element.set_parent(object.clone());

        let binding = self.find_mut(object).ok_or(Error::NotFound)?
            .as_object_mut()?
            .bind(key, created_at.clone());
        self.register(element);

        match binding {
            Binding::Bound{..} => {
                let losers = self.find(object).ok_or(Error::NotFound)?
                    .as_object()?
                    .bound_to(key, &created_at);
                let mut displaced = None;
                for loser in losers {
                    if self.tombstone(&loser, &created_at)? {
                        displaced = Some(loser);
                    }
                }
                Ok(displaced)
            }
            Binding::Superseded{by} => {
                let _ = self.tombstone(&created_at, &by)?;
                Ok(Some(created_at))
            }
        }
    }

    /// Tombstones the live value under `key`.
    pub fn object_remove(&mut self, object: &Ticket, key: &str, at: &Ticket) -> Result<Ticket, Error> {
        let created_at = self.object_get(object, key)?.created_at().clone();
        let _ = self.tombstone(&created_at, at)?;
        Ok(created_at)
    }

    /// Returns the live value under `key`.
    pub fn object_get(&self, object: &Ticket, key: &str) -> Result<&Element, Error> {
        let node = self.find(object).ok_or(Error::NotFound)?.as_object()?;
        let created_at = node.get(key).ok_or(Error::NotFound)?;
        match self.find(created_at) {
            Some(element) if !element.is_removed() => Ok(element),
            _ => Err(Error::NotFound),
        }
    }

    /// Returns the keys holding live values, in first-insertion order.
    pub fn object_keys(&self, object: &Ticket) -> Result<Vec<String>, Error> {
        let node = self.find(object).ok_or(Error::NotFound)?.as_object()?;
        Ok(node.members()
            .filter(|&(_, t)| self.find(t).map_or(false, |e| !e.is_removed()))
            .map(|(k, _)| k.clone())
            .collect())
    }
}
