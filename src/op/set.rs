use {Error, Ticket};
use element::ElementSeed;
use root::Root;
use super::resolve_parent;

/// Binds a new value under a key of an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetOperation {
    pub parent_created_at: Ticket,
    pub executed_at: Ticket,
    pub key: String,
    pub value: ElementSeed,
}

impl SetOperation {
    pub fn new(parent_created_at: Ticket, executed_at: Ticket, key: String, value: ElementSeed) -> Self {
        SetOperation{parent_created_at, executed_at, key, value}
    }

    pub fn execute(&self, root: &mut Root) -> Result<Vec<Ticket>, Error> {
        let parent = resolve_parent(root, &self.parent_created_at, "set")?;
        if parent.as_object().is_err() {
            return Err(inconsistent!("set: parent {} is a {}, not an object", self.parent_created_at, parent.type_name()))
        }
        if root.contains(self.value.created_at()) {
            return Ok(vec![])
        }

        let element = self.value.clone().into_element();
        let tombstoned = root.object_set(&self.parent_created_at, &self.key, element)?;
        Ok(tombstoned.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ActorId;
    use primitive::Primitive;

    fn ticket(lamport: i64, actor: &str) -> Ticket {
        Ticket::new(lamport, 1, Some(ActorId::new(actor)))
    }

    fn set(key: &str, at: Ticket, value: i64) -> SetOperation {
        let seed = ElementSeed::Primitive{created_at: at.clone(), value: Primitive::Long(value)};
        SetOperation::new(Ticket::initial(), at, key.to_owned(), seed)
    }

    #[test]
    fn test_execute() {
        let mut root = Root::new();
        assert_eq!(set("k", ticket(1, "a"), 1).execute(&mut root), Ok(vec![]));
        assert_eq!(set("k", ticket(2, "a"), 2).execute(&mut root), Ok(vec![ticket(1, "a")]));
        assert_eq!(root.to_value().get("k").and_then(|v| v.as_i64()), Some(2));
    }

    #[test]
    fn test_execute_is_idempotent() {
        let mut root = Root::new();
        let op = set("k", ticket(1, "a"), 1);
        op.execute(&mut root).unwrap();
        let snapshot = root.clone();
        assert_eq!(op.execute(&mut root), Ok(vec![]));
        assert_eq!(root, snapshot);
    }

    #[test]
    fn test_concurrent_sets_converge() {
        let (op1, op2) = (set("k", ticket(3, "a"), 1), set("k", ticket(3, "b"), 2));
        let mut root1 = Root::new();
        let mut root2 = Root::new();
        op1.execute(&mut root1).unwrap();
        op2.execute(&mut root1).unwrap();
        op2.execute(&mut root2).unwrap();
        op1.execute(&mut root2).unwrap();

        assert_eq!(root1.to_value(), root2.to_value());
        assert_eq!(root1.to_value().get("k").and_then(|v| v.as_i64()), Some(2));
        assert_eq!(root2.find(&ticket(3, "a")).unwrap().removed_at(), Some(&ticket(3, "b")));
    }

    #[test]
    fn test_missing_parent_is_fatal() {
        let mut root = Root::new();
        let mut op = set("k", ticket(1, "a"), 1);
        op.parent_created_at = ticket(9, "z");
        let err = op.execute(&mut root).unwrap_err();
        assert!(err.is_fatal());
    }
}
