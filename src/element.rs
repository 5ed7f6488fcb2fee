//! An `Element` is one node of the document tree: a primitive,
//! an object or an array. Elements live in the root's registry
//! and refer to each other by ticket only.

use {ActorId, Error, Ticket};
use array::ArrayNode;
use object::ObjectNode;
use primitive::Primitive;

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    created_at: Ticket,
    removed_at: Option<Ticket>,
    moved_at: Option<Ticket>,
    parent: Option<Ticket>,
    body: ElementBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementBody {
    Primitive(Primitive),
    Object(ObjectNode),
    Array(ArrayNode),
}

/// The shape of a freshly created element as carried by `Set` and
/// `Add` operations. Containers are always created empty; their
/// children follow as separate operations of the same change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ElementSeed {
    Primitive{created_at: Ticket, value: Primitive},
    Object{created_at: Ticket},
    Array{created_at: Ticket},
}

impl Element {
    pub fn new(created_at: Ticket, body: ElementBody) -> Self {
        Element{created_at, removed_at: None, moved_at: None, parent: None, body}
    }

    pub fn created_at(&self) -> &Ticket {
        &self.created_at
    }

    pub fn removed_at(&self) -> Option<&Ticket> {
        self.removed_at.as_ref()
    }

    /// The ticket of the move that placed this element in its current
    /// array slot, if any.
    pub fn moved_at(&self) -> Option<&Ticket> {
        self.moved_at.as_ref()
    }

    pub fn parent(&self) -> Option<&Ticket> {
        self.parent.as_ref()
    }

    pub fn body(&self) -> &ElementBody {
        &self.body
    }

    pub(crate) fn body_mut(&mut self) -> &mut ElementBody {
        &mut self.body
    }

    pub fn is_removed(&self) -> bool {
        self.removed_at.is_some()
    }

    pub fn type_name(&self) -> &'static str {
        match self.body {
            ElementBody::Primitive(ref p) => p.type_name(),
            ElementBody::Object(_) => "object",
            ElementBody::Array(_) => "array",
        }
    }

    /// Tombstones the element. Removal time only moves forward, so
    /// replaying removals in any order settles on the latest one.
    /// Returns true iff the element was live before the call.
    pub fn remove(&mut self, at: &Ticket) -> bool {
        let was_live = self.removed_at.is_none();
        let later = match self.removed_at {
            Some(ref removed_at) => at.after(removed_at),
            None => true,
        };
        if later {
            self.removed_at = Some(at.clone());
        }
        was_live
    }

    pub(crate) fn set_moved_at(&mut self, at: Ticket) {
        self.moved_at = Some(at);
    }

    pub(crate) fn set_parent(&mut self, parent: Ticket) {
        self.parent = Some(parent);
    }

    pub fn as_primitive(&self) -> Result<&Primitive, Error> {
        match self.body {
            ElementBody::Primitive(ref p) => Ok(p),
            _ => Err(Error::TypeMismatch),
        }
    }

    pub fn as_object(&self) -> Result<&ObjectNode, Error> {
        match self.body {
            ElementBody::Object(ref o) => Ok(o),
            _ => Err(Error::TypeMismatch),
        }
    }

    pub fn as_array(&self) -> Result<&ArrayNode, Error> {
        match self.body {
            ElementBody::Array(ref a) => Ok(a),
            _ => Err(Error::TypeMismatch),
        }
    }

    pub(crate) fn as_object_mut(&mut self) -> Result<&mut ObjectNode, Error> {
        match self.body {
            ElementBody::Object(ref mut o) => Ok(o),
            _ => Err(Error::TypeMismatch),
        }
    }

    pub(crate) fn as_array_mut(&mut self) -> Result<&mut ArrayNode, Error> {
        match self.body {
            ElementBody::Array(ref mut a) => Ok(a),
            _ => Err(Error::TypeMismatch),
        }
    }

    /// Tickets of every child this element has ever held.
    pub fn children(&self) -> Vec<Ticket> {
        match self.body {
            ElementBody::Primitive(_) => vec![],
            ElementBody::Object(ref o) => o.children().cloned().collect(),
            ElementBody::Array(ref a) => a.children().cloned().collect(),
        }
    }

    /// Returns a seed that recreates this element (without children)
    /// on another replica.
    pub fn to_seed(&self) -> ElementSeed {
        let created_at = self.created_at.clone();
        match self.body {
            ElementBody::Primitive(ref value) => ElementSeed::Primitive{created_at, value: value.clone()},
            ElementBody::Object(_) => ElementSeed::Object{created_at},
            ElementBody::Array(_) => ElementSeed::Array{created_at},
        }
    }

    pub(crate) fn set_actor(&mut self, actor: &ActorId) {
        self.created_at.set_actor(actor);
        if let Some(ref mut t) = self.removed_at { t.set_actor(actor) }
        if let Some(ref mut t) = self.moved_at { t.set_actor(actor) }
        if let Some(ref mut t) = self.parent { t.set_actor(actor) }
        match self.body {
            ElementBody::Primitive(_) => (),
            ElementBody::Object(ref mut o) => o.set_actor(actor),
            ElementBody::Array(ref mut a) => a.set_actor(actor),
        }
    }
}

impl ElementSeed {
    pub fn created_at(&self) -> &Ticket {
        match *self {
            ElementSeed::Primitive{ref created_at, ..} => created_at,
            ElementSeed::Object{ref created_at} => created_at,
            ElementSeed::Array{ref created_at} => created_at,
        }
    }

    pub fn into_element(self) -> Element {
        match self {
            ElementSeed::Primitive{created_at, value} =>
                Element::new(created_at, ElementBody::Primitive(value)),
            ElementSeed::Object{created_at} =>
                Element::new(created_at, ElementBody::Object(ObjectNode::new())),
            ElementSeed::Array{created_at} =>
                Element::new(created_at, ElementBody::Array(ArrayNode::new())),
        }
    }

    pub fn set_actor(&mut self, actor: &ActorId) {
        match *self {
            ElementSeed::Primitive{ref mut created_at, ..} => created_at.set_actor(actor),
            ElementSeed::Object{ref mut created_at} => created_at.set_actor(actor),
            ElementSeed::Array{ref mut created_at} => created_at.set_actor(actor),
        }
    }
}
