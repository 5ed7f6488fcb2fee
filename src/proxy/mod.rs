//! Facades over the containers of a document. They are the only way a
//! transaction can change the tree: every mutating call issues a
//! ticket, executes the matching operation and records it in the
//! transaction's `ChangeContext`.
//!
//! Composite values are translated recursively. A container is created
//! empty by one operation and filled by the operations that follow it,
//! so a remote replica rebuilds it exactly as it was built here.

mod array;
mod object;

pub use self::array::JsonArray;
pub use self::object::JsonObject;

use {Error, Ticket};
use context::ChangeContext;
use element::ElementSeed;
use op::{AddOperation, SetOperation};
use primitive::Primitive;
use value::Value;

/// The shape of the element that will hold `value`.
fn seed_of(value: &Value, created_at: Ticket) -> ElementSeed {
    let primitive = match *value {
        Value::Object(_) => return ElementSeed::Object{created_at},
        Value::Array(_) => return ElementSeed::Array{created_at},
        Value::Null => Primitive::Null,
        Value::Bool(b) => Primitive::Boolean(b),
        Value::Int32(i) => Primitive::Integer(i),
        Value::Int64(i) => Primitive::Long(i),
        Value::Double(d) => Primitive::Double(d),
        Value::String(ref s) => Primitive::String(s.clone()),
        Value::Bytes(ref b) => Primitive::Bytes(b.clone()),
        Value::Timestamp(ms) => Primitive::Date(ms),
    };
    ElementSeed::Primitive{created_at, value: primitive}
}

/// Fills a freshly created container with the members or items of `value`.
fn populate(context: &mut ChangeContext, container: &Ticket, value: Value) -> Result<(), Error> {
    match value {
        Value::Object(members) => {
            for (key, member) in members {
                let _ = set_in_object(context, container, &key, member)?;
            }
        }
        Value::Array(items) => {
            let mut prev = Ticket::initial();
            for item in items {
                prev = add_to_array(context, container, &prev, item)?;
            }
        }
        _ => (),
    }
    Ok(())
}

/// Binds `value` under `key` and returns the ticket of the new element.
fn set_in_object(context: &mut ChangeContext, object: &Ticket, key: &str, value: Value) -> Result<Ticket, Error> {
    let ticket = context.issue_ticket();
    let seed = seed_of(&value, ticket.clone());
    context.push(SetOperation::new(object.clone(), ticket.clone(), key.to_owned(), seed))?;
    populate(context, &ticket, value)?;
    Ok(ticket)
}

/// Inserts `value` after `prev` and returns the ticket of the new element.
fn add_to_array(context: &mut ChangeContext, array: &Ticket, prev: &Ticket, value: Value) -> Result<Ticket, Error> {
    let ticket = context.issue_ticket();
    let seed = seed_of(&value, ticket.clone());
    context.push(AddOperation::new(array.clone(), ticket.clone(), prev.clone(), seed))?;
    populate(context, &ticket, value)?;
    Ok(ticket)
}
