//! An array node keeps its children in a doubly-linked list of slots
//! anchored on a virtual head. A slot is a position an element has
//! occupied: one is linked when the element is inserted, keyed by its
//! creation ticket, and one more for every move, keyed by the move's
//! ticket. Slots are never unlinked while the element exists, so an
//! anchor resolves to the same place on every replica.
//!
//! ## Implementation Notes
//!
//! Concurrent slots linked after the same anchor are ordered the RGA
//! way: a new slot is placed after every following slot with a greater
//! ticket. An element is shown at its newest slot; older slots stay in
//! the list as dead positions. A stale move still links its slot, but
//! the slot is dead from the start. Together these make the final
//! order independent of the order operations are executed in.

use {ActorId, Error, Ticket};
use element::Element;
use root::Root;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayNode {
    head: Ticket,
    last: Ticket,
    links: HashMap<Ticket, Link>,
    current: HashMap<Ticket, Ticket>,
}

#[derive(Debug, Clone, PartialEq)]
struct Link {
    element: Ticket,
    prev: Option<Ticket>,
    next: Option<Ticket>,
}

pub struct Iter<'a> {
    node: &'a ArrayNode,
    cursor: Option<&'a Ticket>,
}

impl ArrayNode {
    pub fn new() -> Self {
        let head = Ticket::initial();
        let mut links = HashMap::new();
        links.insert(head.clone(), Link{element: head.clone(), prev: None, next: None});
        ArrayNode{last: head.clone(), head, links, current: HashMap::new()}
    }

    /// The ticket of the virtual head. Inserting or moving after it
    /// places an element at the front.
    pub fn head(&self) -> &Ticket {
        &self.head
    }

    /// The ticket of the last linked slot, dead slots included.
    pub fn last(&self) -> &Ticket {
        &self.last
    }

    /// Returns true iff `slot` is the head or a linked slot.
    pub fn contains(&self, slot: &Ticket) -> bool {
        self.links.contains_key(slot)
    }

    pub fn has_child(&self, id: &Ticket) -> bool {
        self.current.contains_key(id)
    }

    /// The slot the child `id` currently occupies.
    pub fn slot_of(&self, id: &Ticket) -> Option<&Ticket> {
        self.current.get(id)
    }

    /// The child that was linked through `slot`.
    pub fn element_at(&self, slot: &Ticket) -> Option<&Ticket> {
        self.links.get(slot).map(|l| &l.element)
    }

    pub fn next_of(&self, slot: &Ticket) -> Option<&Ticket> {
        self.links.get(slot).and_then(|l| l.next.as_ref())
    }

    pub fn prev_of(&self, slot: &Ticket) -> Option<&Ticket> {
        self.links.get(slot).and_then(|l| l.prev.as_ref())
    }

    /// Iterates over children at their current slots, tombstones
    /// included, in order.
    pub fn children(&self) -> Iter {
        Iter{node: self, cursor: self.next_of(&self.head)}
    }

    /// Links a slot for the child `id` directly after `prev`. The slot
    /// does not become the child's current slot.
    pub fn link_after(&mut self, prev: &Ticket, slot: Ticket, id: Ticket) -> Result<(), Error> {
        try_assert!(!self.links.contains_key(&slot), Error::Inconsistent(format!("{} is already linked", slot)));
        let next = {
            let link = self.links.get_mut(prev).ok_or(Error::NotFound)?;
            let next = link.next.take();
            link.next = Some(slot.clone());
            next
        };
        match next {
            Some(ref next) => {
                if let Some(link) = self.links.get_mut(next) {
                    link.prev = Some(slot.clone());
                }
            }
            None => self.last = slot.clone(),
        }
        self.links.insert(slot, Link{element: id, prev: Some(prev.clone()), next});
        Ok(())
    }

    /// Makes `slot` the current slot of the child `id` unless the child
    /// already sits in a newer one. Returns true iff it did.
    pub fn occupy(&mut self, id: &Ticket, slot: &Ticket) -> bool {
        let newer = match self.current.get(id) {
            Some(current) => slot.after(current),
            None => true,
        };
        if newer {
            self.current.insert(id.clone(), slot.clone());
        }
        newer
    }

    /// Unlinks `slot`, joining its neighbours.
    pub fn unlink(&mut self, slot: &Ticket) -> Result<(), Error> {
        try_assert!(*slot != self.head, Error::OutOfBounds);
        let link = self.links.remove(slot).ok_or(Error::NotFound)?;
        if let Some(ref prev) = link.prev {
            if let Some(prev_link) = self.links.get_mut(prev) {
                prev_link.next = link.next.clone();
            }
        }
        match link.next {
            Some(ref next) => {
                if let Some(next_link) = self.links.get_mut(next) {
                    next_link.prev = link.prev.clone();
                }
            }
            None => self.last = link.prev.unwrap_or_else(|| self.head.clone()),
        }
        Ok(())
    }

    /// Unlinks every slot of the child `id` and forgets it.
    pub fn purge(&mut self, id: &Ticket) {
        let slots: Vec<Ticket> = self.links.iter()
            .filter(|&(slot, link)| link.element == *id && *slot != self.head)
            .map(|(slot, _)| slot.clone())
            .collect();
        for slot in slots {
            let _ = self.unlink(&slot);
        }
        self.current.remove(id);
    }

    pub(crate) fn set_actor(&mut self, actor: &ActorId) {
        self.head.set_actor(actor);
        self.last.set_actor(actor);
        self.links = self.links.drain()
            .map(|(mut slot, mut link)| {
                slot.set_actor(actor);
                link.element.set_actor(actor);
                if let Some(ref mut t) = link.prev { t.set_actor(actor) }
                if let Some(ref mut t) = link.next { t.set_actor(actor) }
                (slot, link)
            })
            .collect();
        self.current = self.current.drain()
            .map(|(mut id, mut slot)| {
                id.set_actor(actor);
                slot.set_actor(actor);
                (id, slot)
            })
            .collect();
    }
}

impl Default for ArrayNode {
    fn default() -> Self {
        ArrayNode::new()
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Ticket;

    fn next(&mut self) -> Option<&'a Ticket> {
        let node = self.node;
        loop {
            let slot = try_opt!(self.cursor);
            self.cursor = node.next_of(slot);
            if let Some(link) = node.links.get(slot) {
                if node.current.get(&link.element) == Some(slot) {
                    return Some(&link.element)
                }
            }
        }
    }
}

impl Root {
    fn array_node(&self, array: &Ticket) -> Result<&ArrayNode, Error> {
        self.find(array).ok_or(Error::NotFound)?.as_array()
    }

    fn array_node_mut(&mut self, array: &Ticket) -> Result<&mut ArrayNode, Error> {
        self.find_mut(array).ok_or(Error::NotFound)?.as_array_mut()
    }

    /// Starting at the slot `prev`, skips every following slot linked
    /// after `slot`, and returns the slot to link after.
    fn find_next_before(&self, array: &Ticket, prev: &Ticket, slot: &Ticket) -> Result<Ticket, Error> {
        let node = self.array_node(array)?;
        try_assert!(node.contains(prev), Error::NotFound);

        let mut current = prev;
        while let Some(next) = node.next_of(current) {
            if !next.after(slot) {
                break
            }
            current = next;
        }
        Ok(current.clone())
    }

    /// Inserts `element` after the slot `prev` (or the head).
    pub fn array_insert_after(&mut self, array: &Ticket, prev: &Ticket, mut element: Element) -> Result<(), Error> {
        let created_at = element.created_at().clone();
        let anchor = self.find_next_before(array, prev, &created_at)?;
        element.set_parent(array.clone());
        {
            let node = self.array_node_mut(array)?;
            node.link_after(&anchor, created_at.clone(), created_at.clone())?;
            node.occupy(&created_at, &created_at);
        }
        self.register(element);
        Ok(())
    }

    /// Inserts `element` directly before the child `next`.
    pub fn array_insert_before(&mut self, array: &Ticket, next: &Ticket, element: Element) -> Result<(), Error> {
        let prev = self.array_slot_before(array, next)?;
        self.array_insert_after(array, &prev, element)
    }

    /// Inserts `element` after the last slot.
    pub fn array_append(&mut self, array: &Ticket, element: Element) -> Result<(), Error> {
        let last = self.array_node(array)?.last().clone();
        self.array_insert_after(array, &last, element)
    }

    /// Returns the slot the child `id` currently occupies.
    pub fn array_slot_of(&self, array: &Ticket, id: &Ticket) -> Result<Ticket, Error> {
        self.array_node(array)?.slot_of(id).cloned().ok_or(Error::NotFound)
    }

    /// Returns the slot linked before the current slot of `next`,
    /// which is the head for the first slot.
    pub fn array_slot_before(&self, array: &Ticket, next: &Ticket) -> Result<Ticket, Error> {
        let node = self.array_node(array)?;
        let slot = node.slot_of(next).ok_or(Error::NotFound)?;
        node.prev_of(slot).cloned().ok_or(Error::NotFound)
    }

    /// Links a new slot for `id` after the slot `prev`, keyed by `at`.
    /// The element takes the slot unless it already sits in a newer
    /// one. Returns true iff the element moved. Replaying a move that
    /// already linked its slot does nothing.
    pub fn array_move_after(&mut self, array: &Ticket, prev: &Ticket, id: &Ticket, at: &Ticket) -> Result<bool, Error> {
        {
            let node = self.array_node(array)?;
            try_assert!(node.contains(prev), Error::NotFound);
            try_assert!(node.has_child(id), Error::NotFound);
            if node.contains(at) {
                return Ok(false)
            }
        }

        let anchor = self.find_next_before(array, prev, at)?;
        let moved = {
            let node = self.array_node_mut(array)?;
            node.link_after(&anchor, at.clone(), id.clone())?;
            node.occupy(id, at)
        };
        if moved {
            if let Some(element) = self.find_mut(id) {
                element.set_moved_at(at.clone());
            }
        }
        Ok(moved)
    }

    /// Moves `id` directly before the child `next`.
    pub fn array_move_before(&mut self, array: &Ticket, next: &Ticket, id: &Ticket, at: &Ticket) -> Result<bool, Error> {
        let prev = self.array_slot_before(array, next)?;
        self.array_move_after(array, &prev, id, at)
    }

    /// Moves `id` to the front of the array.
    pub fn array_move_front(&mut self, array: &Ticket, id: &Ticket, at: &Ticket) -> Result<bool, Error> {
        let head = self.array_node(array)?.head().clone();
        self.array_move_after(array, &head, id, at)
    }

    /// Moves `id` to the end of the array.
    pub fn array_move_last(&mut self, array: &Ticket, id: &Ticket, at: &Ticket) -> Result<bool, Error> {
        let last = self.array_node(array)?.last().clone();
        self.array_move_after(array, &last, id, at)
    }

    /// Tombstones the live element at `index`.
    pub fn array_remove_by_index(&mut self, array: &Ticket, index: usize, at: &Ticket) -> Result<Ticket, Error> {
        let id = self.array_get_by_index(array, index)?.created_at().clone();
        let _ = self.tombstone(&id, at)?;
        Ok(id)
    }

    /// Tombstones the child `id`.
    pub fn array_remove_by_id(&mut self, array: &Ticket, id: &Ticket, at: &Ticket) -> Result<Ticket, Error> {
        try_assert!(self.array_node(array)?.has_child(id), Error::NotFound);
        let _ = self.tombstone(id, at)?;
        Ok(id.clone())
    }

    /// Returns the live children in order.
    pub fn array_live_ids(&self, array: &Ticket) -> Result<Vec<Ticket>, Error> {
        let node = self.array_node(array)?;
        Ok(node.children()
            .filter(|id| self.find(id).map_or(false, |e| !e.is_removed()))
            .cloned()
            .collect())
    }

    /// Returns the number of live children.
    pub fn array_len(&self, array: &Ticket) -> Result<usize, Error> {
        let node = self.array_node(array)?;
        Ok(node.children()
            .filter(|id| self.find(id).map_or(false, |e| !e.is_removed()))
            .count())
    }

    pub fn array_get_by_index(&self, array: &Ticket, index: usize) -> Result<&Element, Error> {
        let node = self.array_node(array)?;
        node.children()
            .filter_map(|id| self.find(id))
            .filter(|e| !e.is_removed())
            .nth(index)
            .ok_or(Error::NotFound)
    }

    pub fn array_get_by_id(&self, array: &Ticket, id: &Ticket) -> Result<&Element, Error> {
        try_assert!(self.array_node(array)?.has_child(id), Error::NotFound);
        match self.find(id) {
            Some(element) if !element.is_removed() => Ok(element),
            _ => Err(Error::NotFound),
        }
    }

    pub fn array_get_last(&self, array: &Ticket) -> Result<&Element, Error> {
        let ids = self.array_live_ids(array)?;
        let last = ids.last().ok_or(Error::NotFound)?;
        self.find(last).ok_or(Error::NotFound)
    }

    /// Returns the number of live elements linked before `id`.
    pub fn array_index_of_id(&self, array: &Ticket, id: &Ticket) -> Result<usize, Error> {
        let node = self.array_node(array)?;
        try_assert!(node.has_child(id), Error::NotFound);
        Ok(node.children()
            .take_while(|child| *child != id)
            .filter(|child| self.find(child).map_or(false, |e| !e.is_removed()))
            .count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use element::ElementBody;
    use primitive::Primitive;

    fn ticket(lamport: i64, delimiter: u32, actor: &str) -> Ticket {
        Ticket::new(lamport, delimiter, Some(ActorId::new(actor)))
    }

    fn long(created_at: Ticket, value: i64) -> Element {
        Element::new(created_at, ElementBody::Primitive(Primitive::Long(value)))
    }

    fn values(root: &Root, array: &Ticket) -> Vec<i64> {
        root.array_live_ids(array).unwrap().iter()
            .map(|id| match *root.find(id).unwrap().as_primitive().unwrap() {
                Primitive::Long(v) => v,
                _ => panic!("not a long"),
            })
            .collect()
    }

    /// Builds `[0, 1, 2]` under key "list", created by actor "a" at lamport 1.
    fn setup() -> (Root, Ticket, Vec<Ticket>) {
        let mut root = Root::new();
        let root_id = root.id().clone();
        let array = ticket(1, 1, "a");
        let element = Element::new(array.clone(), ElementBody::Array(ArrayNode::new()));
        root.object_set(&root_id, "list", element).unwrap();

        let mut ids = vec![];
        for i in 0..3 {
            let id = ticket(1, 2 + i as u32, "a");
            root.array_append(&array, long(id.clone(), i)).unwrap();
            ids.push(id);
        }
        (root, array, ids)
    }

    #[test]
    fn test_link_and_unlink() {
        let mut node = ArrayNode::new();
        let head = node.head().clone();
        let (a, b, c) = (ticket(1, 1, "a"), ticket(1, 2, "a"), ticket(1, 3, "a"));
        for &(ref prev, ref id) in &[(&head, &a), (&a, &b), (&head, &c)] {
            node.link_after(prev, (*id).clone(), (*id).clone()).unwrap();
            assert!(node.occupy(id, id));
        }
        let order: Vec<&Ticket> = node.children().collect();
        assert_eq!(order, [&c, &a, &b]);
        assert_eq!(node.last(), &b);

        node.unlink(&b).unwrap();
        assert_eq!(node.last(), &a);
        assert_eq!(node.unlink(&head), Err(Error::OutOfBounds));
        assert_eq!(node.unlink(&ticket(9, 9, "a")), Err(Error::NotFound));
    }

    #[test]
    fn test_children_skip_vacated_slots() {
        let mut node = ArrayNode::new();
        let head = node.head().clone();
        let (a, b, moved) = (ticket(1, 1, "a"), ticket(1, 2, "a"), ticket(2, 1, "a"));
        node.link_after(&head, a.clone(), a.clone()).unwrap();
        node.occupy(&a, &a);
        node.link_after(&a, b.clone(), b.clone()).unwrap();
        node.occupy(&b, &b);

        node.link_after(&b, moved.clone(), a.clone()).unwrap();
        assert!(node.occupy(&a, &moved));
        assert!(!node.occupy(&a, &a));
        assert_eq!(node.children().collect::<Vec<_>>(), [&b, &a]);
        assert_eq!(node.slot_of(&a), Some(&moved));
        assert_eq!(node.element_at(&a), Some(&a));

        node.purge(&a);
        assert_eq!(node.children().collect::<Vec<_>>(), [&b]);
        assert!(!node.contains(&moved));
        assert_eq!(node.last(), &b);
    }

    #[test]
    fn test_append_and_get() {
        let (root, array, ids) = setup();
        assert_eq!(values(&root, &array), [0, 1, 2]);
        assert_eq!(root.array_len(&array), Ok(3));
        assert_eq!(root.array_get_by_index(&array, 1).unwrap().created_at(), &ids[1]);
        assert_eq!(root.array_get_by_index(&array, 3), Err(Error::NotFound));
        assert_eq!(root.array_get_last(&array).unwrap().created_at(), &ids[2]);
    }

    #[test]
    fn test_insert_before() {
        let (mut root, array, ids) = setup();
        root.array_insert_before(&array, &ids[0], long(ticket(2, 1, "a"), 3)).unwrap();
        root.array_insert_before(&array, &ids[2], long(ticket(2, 2, "a"), 4)).unwrap();
        assert_eq!(values(&root, &array), [3, 0, 1, 4, 2]);
    }

    #[test]
    fn test_concurrent_inserts_at_same_anchor() {
        let (mut root1, array, ids) = setup();
        let mut root2 = root1.clone();
        let x = long(ticket(2, 1, "a"), 10);
        let y = long(ticket(2, 1, "b"), 20);

        root1.array_insert_after(&array, &ids[0], x.clone()).unwrap();
        root1.array_insert_after(&array, &ids[0], y.clone()).unwrap();
        root2.array_insert_after(&array, &ids[0], y).unwrap();
        root2.array_insert_after(&array, &ids[0], x).unwrap();

        assert_eq!(values(&root1, &array), [0, 20, 10, 1, 2]);
        assert_eq!(values(&root1, &array), values(&root2, &array));
    }

    #[test]
    fn test_move_after() {
        let (mut root, array, ids) = setup();
        assert_eq!(root.array_move_after(&array, &ids[2], &ids[0], &ticket(2, 1, "a")), Ok(true));
        assert_eq!(values(&root, &array), [1, 2, 0]);
        assert_eq!(root.find(&ids[0]).unwrap().moved_at(), Some(&ticket(2, 1, "a")));
    }

    #[test]
    fn test_stale_move_is_ignored() {
        let (mut root, array, ids) = setup();
        assert_eq!(root.array_move_front(&array, &ids[2], &ticket(3, 1, "a")), Ok(true));
        assert_eq!(root.array_move_last(&array, &ids[2], &ticket(2, 1, "a")), Ok(false));
        assert_eq!(values(&root, &array), [2, 0, 1]);
    }

    #[test]
    fn test_moves_commute() {
        let (mut root1, array, ids) = setup();
        let mut root2 = root1.clone();
        let head = Ticket::initial();
        let t1 = ticket(2, 1, "a");
        let t2 = ticket(2, 1, "b");

        root1.array_move_after(&array, &head, &ids[1], &t1).unwrap();
        root1.array_move_after(&array, &ids[2], &ids[1], &t2).unwrap();
        root2.array_move_after(&array, &ids[2], &ids[1], &t2).unwrap();
        root2.array_move_after(&array, &head, &ids[1], &t1).unwrap();

        assert_eq!(values(&root1, &array), [0, 2, 1]);
        assert_eq!(values(&root1, &array), values(&root2, &array));
    }

    #[test]
    fn test_move_before_own_slot_keeps_order() {
        let (mut root, array, ids) = setup();
        assert_eq!(root.array_move_before(&array, &ids[2], &ids[0], &ticket(2, 1, "a")), Ok(true));
        assert_eq!(values(&root, &array), [1, 0, 2]);
        assert_eq!(root.array_move_before(&array, &ids[2], &ids[0], &ticket(2, 2, "a")), Ok(true));
        assert_eq!(values(&root, &array), [1, 0, 2]);
        assert_eq!(root.array_slot_of(&array, &ids[0]), Ok(ticket(2, 2, "a")));
    }

    #[test]
    fn test_replayed_move_links_once() {
        let (mut root, array, ids) = setup();
        let at = ticket(2, 1, "a");
        assert_eq!(root.array_move_front(&array, &ids[2], &at), Ok(true));
        assert_eq!(root.array_move_last(&array, &ids[2], &at), Ok(false));
        assert_eq!(values(&root, &array), [2, 0, 1]);
    }

    #[test]
    fn test_insert_after_moved_anchor_converges() {
        // [x, y, z]: one replica moves x to the end while another
        // inserts w after x's slot.
        let (mut root1, array, ids) = setup();
        let mut root2 = root1.clone();
        let moved_at = ticket(2, 1, "a");
        let w = long(ticket(2, 1, "b"), 3);

        let last = root1.find(&array).unwrap().as_array().unwrap().last().clone();
        root1.array_move_after(&array, &last, &ids[0], &moved_at).unwrap();
        root1.array_insert_after(&array, &ids[0], w.clone()).unwrap();
        root2.array_insert_after(&array, &ids[0], w).unwrap();
        root2.array_move_after(&array, &last, &ids[0], &moved_at).unwrap();

        assert_eq!(values(&root1, &array), [3, 1, 2, 0]);
        assert_eq!(values(&root2, &array), [3, 1, 2, 0]);
        assert_eq!(root1, root2);
    }

    #[test]
    fn test_stale_move_still_links_its_slot() {
        let (mut root1, array, ids) = setup();
        let mut root2 = root1.clone();
        let late = ticket(3, 1, "a");
        let stale = ticket(2, 1, "b");
        let w = long(ticket(4, 1, "b"), 3);

        root1.array_move_front(&array, &ids[2], &late).unwrap();
        assert_eq!(root1.array_move_after(&array, &ids[0], &ids[2], &stale), Ok(false));
        root2.array_move_after(&array, &ids[0], &ids[2], &stale).unwrap();
        root2.array_move_front(&array, &ids[2], &late).unwrap();
        root1.array_insert_after(&array, &stale, w.clone()).unwrap();
        root2.array_insert_after(&array, &stale, w).unwrap();

        assert_eq!(values(&root1, &array), [2, 0, 3, 1]);
        assert_eq!(root1, root2);
    }

    #[test]
    fn test_remove_by_index_and_id() {
        let (mut root, array, ids) = setup();
        assert_eq!(root.array_remove_by_index(&array, 1, &ticket(2, 1, "a")), Ok(ids[1].clone()));
        assert_eq!(values(&root, &array), [0, 2]);
        assert_eq!(root.array_index_of_id(&array, &ids[2]), Ok(1));
        assert_eq!(root.array_get_by_id(&array, &ids[1]), Err(Error::NotFound));

        assert_eq!(root.array_remove_by_id(&array, &ids[0], &ticket(2, 2, "a")), Ok(ids[0].clone()));
        assert_eq!(values(&root, &array), [2]);
        assert_eq!(root.array_remove_by_index(&array, 5, &ticket(2, 3, "a")), Err(Error::NotFound));
    }
}
