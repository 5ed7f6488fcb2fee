//! # Tandem
//!
//! Tandem is a replicated JSON document built on
//! [CRDTs](https://en.wikipedia.org/wiki/Conflict-free_replicated_data_type).
//! Several replicas edit their own copy of a document and exchange the
//! operations they produce; every replica that has executed the same set
//! of operations holds the same document, regardless of the order in
//! which the operations arrived.
//!
//! ## Example
//!
//! ```rust
//! extern crate tandem;
//! use tandem::{ActorId, Document, Value};
//!
//! fn main() {
//!     let doc1 = Document::with_actor("todo", ActorId::new("a1"));
//!     let doc2 = Document::with_actor("todo", ActorId::new("a2"));
//!
//!     // Edit the first replica. Every edit happens inside a
//!     // transaction and is recorded as an operation.
//!     doc1.update(|root| {
//!         root.set("title", "groceries")?;
//!         root.set("items", vec!["milk", "eggs"])?;
//!         Ok(())
//!     }).unwrap();
//!
//!     // Ship the committed change to the second replica.
//!     let change = doc1.last_change().unwrap();
//!     doc2.apply_change(change).unwrap();
//!
//!     assert_eq!(doc1.to_sorted_json(), doc2.to_sorted_json());
//!     assert_eq!(doc2.get_root().get("title"), Some(&Value::from("groceries")));
//! }
//! ```
//!
//! ## Using documents
//!
//! A `Document` owns the element tree. The only way to change the tree is
//! `Document::update`, which hands the caller a `JsonObject` facade over
//! the root object. Facade calls mutate the tree and append the matching
//! operation in the same step, so the tree and the operation log never
//! disagree. When the closure returns `Ok`, the operations are committed
//! as one `Change`; when it returns `Err`, nothing it did survives.
//!
//! Outside a transaction the document can only be read, through owned
//! `Value` snapshots (`get_root`) or JSON strings (`to_json`,
//! `to_sorted_json`).
//!
//! ### Identity and ordering
//!
//! Every element and every operation is stamped with a `Ticket`, a
//! `(lamport, actor, delimiter)` triple with a total order. Concurrent
//! writes to the same object key are resolved last-writer-wins by ticket;
//! concurrent inserts and moves in an array are resolved by ticket as
//! well, so the outcome does not depend on delivery order.
//!
//! A replica may edit before it knows its actor id. Tickets minted in
//! the meantime carry no actor; `Document::set_actor` rebinds them, both
//! in the tree and in the cached local changes, before they are sent.
//!
//! ### Sending changes
//!
//! Operations, changes and tickets are serializable with
//! [Serde](https://serde.rs). `Document::last_change` and
//! `Document::drain_local_changes` hand out committed local changes;
//! `Document::apply` and `Document::apply_change` execute operations
//! received from other replicas.
//!
//! ### Garbage collection
//!
//! Removed elements are kept as tombstones so that late operations which
//! reference them still resolve. Once every replica has seen a removal,
//! `Document::garbage_collect` purges tombstones up to a ticket threshold.

extern crate base64;
#[macro_use] extern crate failure;
extern crate futures;
extern crate indexmap;
#[macro_use] extern crate lazy_static;
extern crate parking_lot;
extern crate rand;
extern crate serde;
#[macro_use] extern crate serde_derive;
extern crate serde_json;
#[macro_use] extern crate tracing;

#[cfg(test)]
#[macro_use]
extern crate assert_matches;

#[macro_use] mod macros;

pub mod array;
pub mod change;
pub mod context;
pub mod document;
pub mod element;
pub mod json;
pub mod object;
pub mod op;
pub mod primitive;
pub mod proxy;
pub mod root;
pub mod ticket;
pub mod value;

mod error;

pub use error::Error;
pub use ticket::{ActorId, Ticket};

pub use change::{Change, ChangeId};
pub use context::ChangeContext;
pub use document::{DocEvent, Document, DocumentOptions};
pub use element::{Element, ElementBody, ElementSeed};
pub use op::Operation;
pub use primitive::Primitive;
pub use proxy::{JsonArray, JsonObject};
pub use root::Root;
pub use value::{IntoValue, Record, Value};
