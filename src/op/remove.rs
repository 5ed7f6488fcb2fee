use {Error, Ticket};
use element::ElementBody;
use root::Root;
use super::resolve_parent;

/// Tombstones a child of an object or an array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoveOperation {
    pub parent_created_at: Ticket,
    pub executed_at: Ticket,
    pub created_at: Ticket,
}

impl RemoveOperation {
    pub fn new(parent_created_at: Ticket, executed_at: Ticket, created_at: Ticket) -> Self {
        RemoveOperation{parent_created_at, executed_at, created_at}
    }

    pub fn execute(&self, root: &mut Root) -> Result<Vec<Ticket>, Error> {
        let is_child = match *resolve_parent(root, &self.parent_created_at, "remove")?.body() {
            ElementBody::Object(ref object) => object.has_child(&self.created_at),
            ElementBody::Array(ref array) => array.has_child(&self.created_at),
            ElementBody::Primitive(_) =>
                return Err(inconsistent!("remove: parent {} is not a container", self.parent_created_at)),
        };
        if !is_child || !root.contains(&self.created_at) {
            return Err(inconsistent!("remove: {} is not a child of {}", self.created_at, self.parent_created_at))
        }

        match root.tombstone(&self.created_at, &self.executed_at)? {
            true => Ok(vec![self.created_at.clone()]),
            false => Ok(vec![]),
        }
    }
}
