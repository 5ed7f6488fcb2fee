//! A `Document` owns a replica's element tree and is the only way to
//! change it. Writers (`update`, `apply`, `apply_change`, `set_actor`
//! and `garbage_collect`) are admitted one at a time, in the order they
//! arrived. A transaction body runs against a private draft of the
//! tree; the draft replaces the committed tree only if the body
//! succeeds, so readers never observe a half-applied transaction and a
//! failed body leaves no trace.
//!
//! A transaction body must not call back into the document that is
//! running it; doing so waits forever on its own admission.

use {ActorId, Error, Ticket};
use change::{Change, ChangeId};
use context::{self, ChangeContext};
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use json;
use op::Operation;
use parking_lot::{Condvar, Mutex};
use proxy::JsonObject;
use root::Root;
use value::Value;

/// Events published to subscribers after the tree changed.
#[derive(Debug, Clone, PartialEq)]
pub enum DocEvent {
    /// A local transaction was committed.
    LocalChange{message: Option<String>, paths: Vec<String>},
    /// Operations from another replica were applied.
    RemoteChange{paths: Vec<String>},
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentOptions {
    /// The identity of this replica. Without one, tickets are minted
    /// unbound until `Document::set_actor` is called.
    pub actor: Option<ActorId>,
    /// Turns `Document::garbage_collect` into a no-op.
    pub disable_gc: bool,
}

pub struct Document {
    key: String,
    disable_gc: bool,
    state: Mutex<State>,
    turnstile: Turnstile,
    subscribers: Mutex<Vec<UnboundedSender<DocEvent>>>,
}

struct State {
    root: Root,
    change_id: ChangeId,
    local_changes: Vec<Change>,
}

/// A FIFO ticket lock. Each writer draws a number and waits until
/// that number is served.
struct Turnstile {
    queue: Mutex<Queue>,
    turn: Condvar,
}

struct Queue {
    next: u64,
    serving: u64,
}

struct Admission<'a> {
    turnstile: &'a Turnstile,
}

impl Turnstile {
    fn new() -> Self {
        Turnstile{queue: Mutex::new(Queue{next: 0, serving: 0}), turn: Condvar::new()}
    }

    fn enter(&self) -> Admission {
        let mut queue = self.queue.lock();
        let number = queue.next;
        queue.next += 1;
        while queue.serving != number {
            self.turn.wait(&mut queue);
        }
        Admission{turnstile: self}
    }
}

impl<'a> Drop for Admission<'a> {
    fn drop(&mut self) {
        let mut queue = self.turnstile.queue.lock();
        queue.serving += 1;
        self.turnstile.turn.notify_all();
    }
}

impl Document {
    /// Creates a document for a replica that does not know its
    /// identity yet.
    pub fn new<S: Into<String>>(key: S) -> Self {
        Document::with_options(key, DocumentOptions::default())
    }

    pub fn with_actor<S: Into<String>>(key: S, actor: ActorId) -> Self {
        Document::with_options(key, DocumentOptions{actor: Some(actor), ..DocumentOptions::default()})
    }

    pub fn with_options<S: Into<String>>(key: S, options: DocumentOptions) -> Self {
        let state = State{
            root: Root::new(),
            change_id: ChangeId::initial(options.actor),
            local_changes: vec![],
        };
        Document{
            key: key.into(),
            disable_gc: options.disable_gc,
            state: Mutex::new(state),
            turnstile: Turnstile::new(),
            subscribers: Mutex::new(vec![]),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn actor(&self) -> Option<ActorId> {
        self.state.lock().change_id.actor().cloned()
    }

    /// Runs `body` as one transaction over the root object.
    ///
    /// If `body` returns `Ok`, its edits are committed as one `Change`
    /// and a `DocEvent::LocalChange` is published. If it returns `Err`,
    /// the tree is left exactly as it was and the error is returned.
    ///
    /// `body` edits a copy of the whole tree, tombstones included, which
    /// replaces the live tree on commit. Every call therefore costs time
    /// and memory proportional to the document size, however small the
    /// edit.
    pub fn update<F>(&self, body: F) -> Result<(), Error>
        where F: FnOnce(&mut JsonObject) -> Result<(), Error>
    {
        self.transact(None, body)
    }

    /// Like `update`, tagging the committed change with `message`.
    pub fn update_with_message<F>(&self, message: &str, body: F) -> Result<(), Error>
        where F: FnOnce(&mut JsonObject) -> Result<(), Error>
    {
        self.transact(Some(message.to_owned()), body)
    }

    fn transact<F>(&self, message: Option<String>, body: F) -> Result<(), Error>
        where F: FnOnce(&mut JsonObject) -> Result<(), Error>
    {
        let _admission = self.turnstile.enter();
        let (mut draft, id) = {
            let state = self.state.lock();
            (state.root.clone(), state.change_id.next()?)
        };

        let (change, paths) = {
            let mut context = ChangeContext::new(id, &mut draft, message.clone());
            let root_id = context.root().id().clone();
            let result = body(&mut JsonObject::new(&mut context, root_id));
            if let Err(err) = result {
                warn!(key = %self.key, error = %err, "transaction failed; discarding its edits");
                return Err(err)
            }
            if !context.has_operations() {
                return Ok(())
            }
            let paths = context.paths();
            (context.into_change(), paths)
        };

        {
            let mut state = self.state.lock();
            state.root = draft;
            state.change_id = change.id().clone();
            state.local_changes.push(change);
        }
        debug!(key = %self.key, paths = ?paths, "committed local change");
        self.publish(DocEvent::LocalChange{message, paths});
        Ok(())
    }

    /// Executes one operation received from another replica. Fails with
    /// `Error::ActorUnset` until the replica has an actor.
    pub fn apply(&self, operation: Operation) -> Result<(), Error> {
        let lamport = operation.executed_at().lamport();
        self.apply_operations(&[operation], lamport)
    }

    /// Executes every operation of a change received from another replica.
    pub fn apply_change(&self, change: Change) -> Result<(), Error> {
        self.apply_operations(change.operations(), change.id().lamport())
    }

    fn apply_operations(&self, operations: &[Operation], lamport: i64) -> Result<(), Error> {
        let _admission = self.turnstile.enter();
        let mut draft = {
            let state = self.state.lock();
            if state.change_id.actor().is_none() {
                warn!(key = %self.key, "rejected remote operations before an actor was bound");
                return Err(Error::ActorUnset)
            }
            state.root.clone()
        };

        let mut paths = vec![];
        for op in operations {
            op.execute(&mut draft)?;
            if let Ok(path) = draft.path_of(op.effected_created_at()) {
                paths.push(path);
            }
        }
        let paths = context::minimal_paths(&paths);

        {
            let mut state = self.state.lock();
            state.root = draft;
            state.change_id = state.change_id.sync_lamport(lamport);
        }
        debug!(key = %self.key, operations = operations.len(), "applied remote operations");
        self.publish(DocEvent::RemoteChange{paths});
        Ok(())
    }

    /// Binds `actor` to this replica and to every ticket minted before
    /// it had one, including those in local changes not yet sent. A
    /// replica only accepts remote operations once it has an actor.
    pub fn set_actor(&self, actor: ActorId) {
        let _admission = self.turnstile.enter();
        let mut state = self.state.lock();
        state.root.set_actor(&actor);
        state.change_id.set_actor(&actor);
        for change in &mut state.local_changes {
            change.set_actor(&actor);
        }
        debug!(key = %self.key, actor = %actor, "bound actor");
    }

    /// Returns a stream of the events published from now on.
    pub fn subscribe(&self) -> UnboundedReceiver<DocEvent> {
        let (sender, receiver) = mpsc::unbounded();
        self.subscribers.lock().push(sender);
        receiver
    }

    fn publish(&self, event: DocEvent) {
        self.subscribers.lock().retain(|s| s.unbounded_send(event.clone()).is_ok());
    }

    /// The most recently committed local change.
    pub fn last_change(&self) -> Option<Change> {
        self.state.lock().local_changes.last().cloned()
    }

    /// Local changes committed since the last drain, oldest first.
    pub fn local_changes(&self) -> Vec<Change> {
        self.state.lock().local_changes.clone()
    }

    pub fn drain_local_changes(&self) -> Vec<Change> {
        let mut state = self.state.lock();
        ::std::mem::replace(&mut state.local_changes, vec![])
    }

    /// Returns a snapshot of the whole document.
    pub fn get_root(&self) -> Value {
        self.state.lock().root.to_value()
    }

    pub fn to_json(&self) -> String {
        json::to_json(&self.get_root())
    }

    pub fn to_sorted_json(&self) -> String {
        json::to_sorted_json(&self.get_root())
    }

    /// Purges elements tombstoned at or before `threshold` and returns
    /// how many were purged. Callers must only pass a threshold every
    /// replica has seen.
    pub fn garbage_collect(&self, threshold: &Ticket) -> usize {
        if self.disable_gc {
            return 0
        }
        let _admission = self.turnstile.enter();
        self.state.lock().root.garbage_collect(threshold)
    }

    /// The number of elements the next open-ended collection would purge.
    pub fn garbage_len(&self) -> usize {
        self.state.lock().root.garbage_len()
    }
}
