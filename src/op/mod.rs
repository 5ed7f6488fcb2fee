//! Operations are the unit of replication. Every mutation made through
//! the facade is recorded as one, and remote replicas replay them with
//! the same `execute` entry point, so a local edit and its remote
//! counterpart can never behave differently.

mod add;
mod moves;
mod remove;
mod set;

pub use self::add::AddOperation;
pub use self::moves::MoveOperation;
pub use self::remove::RemoveOperation;
pub use self::set::SetOperation;

use {ActorId, Error, Ticket};
use element::Element;
use root::Root;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    Set(SetOperation),
    Remove(RemoveOperation),
    Add(AddOperation),
    Move(MoveOperation),
}

impl Operation {
    /// Executes the operation against `root` and returns the elements
    /// it tombstoned. Executing an operation twice has the same effect
    /// as executing it once.
    pub fn execute(&self, root: &mut Root) -> Result<Vec<Ticket>, Error> {
        trace!(op = %self, "executing operation");
        match *self {
            Operation::Set(ref op) => op.execute(root),
            Operation::Remove(ref op) => op.execute(root),
            Operation::Add(ref op) => op.execute(root),
            Operation::Move(ref op) => op.execute(root),
        }
    }

    pub fn parent_created_at(&self) -> &Ticket {
        match *self {
            Operation::Set(ref op) => &op.parent_created_at,
            Operation::Remove(ref op) => &op.parent_created_at,
            Operation::Add(ref op) => &op.parent_created_at,
            Operation::Move(ref op) => &op.parent_created_at,
        }
    }

    pub fn executed_at(&self) -> &Ticket {
        match *self {
            Operation::Set(ref op) => &op.executed_at,
            Operation::Remove(ref op) => &op.executed_at,
            Operation::Add(ref op) => &op.executed_at,
            Operation::Move(ref op) => &op.executed_at,
        }
    }

    /// The element whose path changed: the created value for `Set`
    /// and `Add`, the target for `Remove` and `Move`.
    pub fn effected_created_at(&self) -> &Ticket {
        match *self {
            Operation::Set(ref op) => op.value.created_at(),
            Operation::Remove(ref op) => &op.created_at,
            Operation::Add(ref op) => op.value.created_at(),
            Operation::Move(ref op) => &op.created_at,
        }
    }

    /// The element the operation creates, if any.
    pub fn created(&self) -> Option<&Ticket> {
        match *self {
            Operation::Set(ref op) => Some(op.value.created_at()),
            Operation::Add(ref op) => Some(op.value.created_at()),
            _ => None,
        }
    }

    /// Binds `actor` to every ticket in the operation that has none.
    pub fn set_actor(&mut self, actor: &ActorId) {
        match *self {
            Operation::Set(ref mut op) => {
                op.parent_created_at.set_actor(actor);
                op.executed_at.set_actor(actor);
                op.value.set_actor(actor);
            }
            Operation::Remove(ref mut op) => {
                op.parent_created_at.set_actor(actor);
                op.executed_at.set_actor(actor);
                op.created_at.set_actor(actor);
            }
            Operation::Add(ref mut op) => {
                op.parent_created_at.set_actor(actor);
                op.executed_at.set_actor(actor);
                op.prev_created_at.set_actor(actor);
                op.value.set_actor(actor);
            }
            Operation::Move(ref mut op) => {
                op.parent_created_at.set_actor(actor);
                op.executed_at.set_actor(actor);
                op.prev_created_at.set_actor(actor);
                op.created_at.set_actor(actor);
            }
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Operation::Set(ref op) =>
                write!(f, "{}.SET.{}={}", op.parent_created_at, op.key, op.value.created_at()),
            Operation::Remove(ref op) =>
                write!(f, "{}.REMOVE.{}", op.parent_created_at, op.created_at),
            Operation::Add(ref op) =>
                write!(f, "{}.ADD.{}:{}", op.parent_created_at, op.prev_created_at, op.value.created_at()),
            Operation::Move(ref op) =>
                write!(f, "{}.MOV.{}:{}", op.parent_created_at, op.prev_created_at, op.created_at),
        }
    }
}

impl From<SetOperation> for Operation {
    fn from(op: SetOperation) -> Self { Operation::Set(op) }
}

impl From<RemoveOperation> for Operation {
    fn from(op: RemoveOperation) -> Self { Operation::Remove(op) }
}

impl From<AddOperation> for Operation {
    fn from(op: AddOperation) -> Self { Operation::Add(op) }
}

impl From<MoveOperation> for Operation {
    fn from(op: MoveOperation) -> Self { Operation::Move(op) }
}

/// Resolves the parent of an operation. A parent that is missing is a
/// consistency violation, not a user error.
fn resolve_parent<'a>(root: &'a Root, parent_created_at: &Ticket, kind: &str) -> Result<&'a Element, Error> {
    root.find(parent_created_at)
        .ok_or_else(|| inconsistent!("{}: parent {} does not exist", kind, parent_created_at))
}
