//! A `Change` is the committed result of one transaction: the
//! operations it produced, stamped with the `ChangeId` that reserved
//! the transaction's lamport value.

use {ActorId, Error, Ticket};
use op::Operation;
use root::Root;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeId {
    client_seq: u32,
    lamport: i64,
    actor: Option<ActorId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    id: ChangeId,
    operations: Vec<Operation>,
    message: Option<String>,
}

impl ChangeId {
    pub fn new(client_seq: u32, lamport: i64, actor: Option<ActorId>) -> Self {
        ChangeId{client_seq, lamport, actor}
    }

    /// The id of a document that has not committed anything yet.
    pub fn initial(actor: Option<ActorId>) -> Self {
        ChangeId::new(0, 0, actor)
    }

    pub fn client_seq(&self) -> u32 {
        self.client_seq
    }

    pub fn lamport(&self) -> i64 {
        self.lamport
    }

    pub fn actor(&self) -> Option<&ActorId> {
        self.actor.as_ref()
    }

    /// The id of the next local change. Fails once either counter
    /// has reached its maximum.
    pub fn next(&self) -> Result<ChangeId, Error> {
        let client_seq = self.client_seq.checked_add(1).ok_or(Error::ClockExhausted)?;
        let lamport = self.lamport.checked_add(1).ok_or(Error::ClockExhausted)?;
        Ok(ChangeId::new(client_seq, lamport, self.actor.clone()))
    }

    /// Advances the clock past a lamport value seen on another replica.
    /// The clock saturates at `i64::MAX`; `next` then fails.
    pub fn sync_lamport(&self, other: i64) -> ChangeId {
        match self.lamport < other {
            true => ChangeId::new(self.client_seq, other, self.actor.clone()),
            false => ChangeId::new(self.client_seq, self.lamport.saturating_add(1), self.actor.clone()),
        }
    }

    pub fn create_ticket(&self, delimiter: u32) -> Ticket {
        Ticket::new(self.lamport, delimiter, self.actor.clone())
    }

    pub fn set_actor(&mut self, actor: &ActorId) {
        if self.actor.is_none() {
            self.actor = Some(actor.clone());
        }
    }
}

impl Change {
    pub fn new(id: ChangeId, operations: Vec<Operation>, message: Option<String>) -> Self {
        Change{id, operations, message}
    }

    pub fn id(&self) -> &ChangeId {
        &self.id
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_ref().map(|m| m.as_str())
    }

    /// Executes every operation in order and returns the elements
    /// they tombstoned.
    pub fn execute(&self, root: &mut Root) -> Result<Vec<Ticket>, Error> {
        let mut tombstoned = vec![];
        for op in &self.operations {
            tombstoned.extend(op.execute(root)?);
        }
        Ok(tombstoned)
    }

    pub fn set_actor(&mut self, actor: &ActorId) {
        self.id.set_actor(actor);
        for op in &mut self.operations {
            op.set_actor(actor);
        }
    }
}
