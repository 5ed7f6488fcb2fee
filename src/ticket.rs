//! A `Ticket` is a timestamp of the logical clock. Every element
//! in a document and every operation executed on it carries one.
//!
//! Tickets are totally ordered: first by lamport, then by actor,
//! then by delimiter. Within one transaction all tickets share a
//! lamport and are told apart by their delimiters; across replicas
//! the actor breaks lamport ties.

use rand::{self, Rng};
use std::cmp::Ordering;
use std::fmt;

const INITIAL_ACTOR: &str = "000000000000000000000000";
const MAX_ACTOR: &str = "ffffffffffffffffffffffff";
const ACTOR_LEN: usize = 24;

lazy_static! {
    static ref INITIAL: Ticket = Ticket::new(0, 0, Some(ActorId::new(INITIAL_ACTOR)));
    static ref MAX: Ticket = Ticket::new(i64::max_value(), u32::max_value(), Some(ActorId::new(MAX_ACTOR)));
}

/// The identity of a replica.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorId(String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ticket {
    lamport: i64,
    delimiter: u32,
    actor: Option<ActorId>,
}

impl ActorId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        ActorId(id.into())
    }

    /// Generates a random actor id of 24 lowercase hex digits.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let id: String = (0..ACTOR_LEN)
            .map(|_| ::std::char::from_digit(rng.gen_range(0..16), 16).unwrap_or('0'))
            .collect();
        ActorId(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'a> From<&'a str> for ActorId {
    fn from(id: &'a str) -> Self {
        ActorId::new(id)
    }
}

impl Ticket {
    pub fn new(lamport: i64, delimiter: u32, actor: Option<ActorId>) -> Self {
        Ticket{lamport, delimiter, actor}
    }

    /// The first ticket of every document. The root object and the
    /// head of every array are anchored on it.
    pub fn initial() -> Self {
        INITIAL.clone()
    }

    /// The greatest possible ticket; used as an open-ended
    /// garbage collection threshold.
    pub fn max() -> Self {
        MAX.clone()
    }

    pub fn lamport(&self) -> i64 {
        self.lamport
    }

    pub fn delimiter(&self) -> u32 {
        self.delimiter
    }

    pub fn actor(&self) -> Option<&ActorId> {
        self.actor.as_ref()
    }

    /// Returns true iff the ticket was minted before its
    /// replica knew its own identity.
    pub fn is_unbound(&self) -> bool {
        self.actor.is_none()
    }

    /// Binds the actor of a ticket that was issued without one.
    /// Tickets that already have an actor are left alone.
    pub fn set_actor(&mut self, actor: &ActorId) {
        if self.actor.is_none() {
            self.actor = Some(actor.clone());
        }
    }

    /// Returns true iff `self` comes strictly after `other`.
    pub fn after(&self, other: &Ticket) -> bool {
        self > other
    }
}

impl PartialOrd for Ticket {
    fn partial_cmp(&self, other: &Ticket) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ticket {
    fn cmp(&self, other: &Ticket) -> Ordering {
        self.lamport.cmp(&other.lamport)
            .then_with(|| self.actor.cmp(&other.actor))
            .then_with(|| self.delimiter.cmp(&other.delimiter))
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.actor {
            Some(ref actor) => write!(f, "{}:{}:{}", self.lamport, actor, self.delimiter),
            None => write!(f, "{}:nil:{}", self.lamport, self.delimiter),
        }
    }
}
