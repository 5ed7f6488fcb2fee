use {Error, Ticket};
use root::Root;
use super::resolve_parent;

/// Links a new slot for an element of an array after the slot
/// `prev_created_at`. The element takes the slot unless a move with a
/// greater ticket already placed it. The slot is linked either way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveOperation {
    pub parent_created_at: Ticket,
    pub executed_at: Ticket,
    pub prev_created_at: Ticket,
    pub created_at: Ticket,
}

impl MoveOperation {
    pub fn new(parent_created_at: Ticket, executed_at: Ticket, prev_created_at: Ticket, created_at: Ticket) -> Self {
        MoveOperation{parent_created_at, executed_at, prev_created_at, created_at}
    }

    pub fn execute(&self, root: &mut Root) -> Result<Vec<Ticket>, Error> {
        let parent = resolve_parent(root, &self.parent_created_at, "move")?;
        let (knows_prev, knows_target) = match parent.as_array() {
            Ok(array) => (array.contains(&self.prev_created_at), array.has_child(&self.created_at)),
            Err(_) => return Err(inconsistent!("move: parent {} is a {}, not an array", self.parent_created_at, parent.type_name())),
        };
        if !knows_prev || !knows_target {
            return Err(inconsistent!("move: {} or {} is not in array {}", self.prev_created_at, self.created_at, self.parent_created_at))
        }

        let moved = root.array_move_after(&self.parent_created_at, &self.prev_created_at, &self.created_at, &self.executed_at)?;
        if !moved {
            trace!(element = %self.created_at, at = %self.executed_at, "move left element in place");
        }
        Ok(vec![])
    }
}
