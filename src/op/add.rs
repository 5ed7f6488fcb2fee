use {Error, Ticket};
use element::ElementSeed;
use root::Root;
use super::resolve_parent;

/// Inserts a new value into an array after the slot `prev_created_at`,
/// which is the creation ticket of an element or the ticket of a move.
/// The array's head ticket inserts at the front.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddOperation {
    pub parent_created_at: Ticket,
    pub executed_at: Ticket,
    pub prev_created_at: Ticket,
    pub value: ElementSeed,
}

impl AddOperation {
    pub fn new(parent_created_at: Ticket, executed_at: Ticket, prev_created_at: Ticket, value: ElementSeed) -> Self {
        AddOperation{parent_created_at, executed_at, prev_created_at, value}
    }

    pub fn execute(&self, root: &mut Root) -> Result<Vec<Ticket>, Error> {
        let parent = resolve_parent(root, &self.parent_created_at, "add")?;
        let knows_prev = match parent.as_array() {
            Ok(array) => array.contains(&self.prev_created_at),
            Err(_) => return Err(inconsistent!("add: parent {} is a {}, not an array", self.parent_created_at, parent.type_name())),
        };
        if !knows_prev {
            return Err(inconsistent!("add: {} is not in array {}", self.prev_created_at, self.parent_created_at))
        }
        if root.contains(self.value.created_at()) {
            return Ok(vec![])
        }

        let element = self.value.clone().into_element();
        root.array_insert_after(&self.parent_created_at, &self.prev_created_at, element)?;
        Ok(vec![])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ActorId;
    use element::{Element, ElementBody};
    use array::ArrayNode;
    use primitive::Primitive;

    fn ticket(lamport: i64, actor: &str) -> Ticket {
        Ticket::new(lamport, 1, Some(ActorId::new(actor)))
    }

    fn list() -> (Root, Ticket) {
        let mut root = Root::new();
        let id = root.id().clone();
        let list = Ticket::new(1, 1, Some(ActorId::new("a")));
        let element = Element::new(list.clone(), ElementBody::Array(ArrayNode::new()));
        root.object_set(&id, "list", element).unwrap();
        (root, list)
    }

    fn add(list: &Ticket, prev: Ticket, at: Ticket, value: &str) -> AddOperation {
        let seed = ElementSeed::Primitive{created_at: at.clone(), value: Primitive::String(value.to_owned())};
        AddOperation::new(list.clone(), at, prev, seed)
    }

    #[test]
    fn test_concurrent_adds_converge() {
        let (mut root1, list) = list();
        let mut root2 = root1.clone();
        let x = add(&list, Ticket::initial(), ticket(2, "a"), "x");
        let y = add(&list, Ticket::initial(), ticket(2, "b"), "y");
        let z = add(&list, ticket(2, "a"), ticket(3, "a"), "z");

        for op in &[&x, &z, &y] { op.execute(&mut root1).unwrap(); }
        for op in &[&y, &x, &z] { op.execute(&mut root2).unwrap(); }

        assert_eq!(root1.to_value(), root2.to_value());
        assert_eq!(root1.to_value().get("list").unwrap().to_json(), r#"["y","x","z"]"#);
    }

    #[test]
    fn test_execute_is_idempotent() {
        let (mut root, list) = list();
        let op = add(&list, Ticket::initial(), ticket(2, "a"), "x");
        op.execute(&mut root).unwrap();
        op.execute(&mut root).unwrap();
        assert_eq!(root.array_len(&list), Ok(1));
    }

    #[test]
    fn test_add_to_object_is_fatal() {
        let (mut root, _) = list();
        let op = add(&Ticket::initial(), Ticket::initial(), ticket(2, "a"), "x");
        assert_matches!(op.execute(&mut root), Err(Error::Inconsistent(_)));
    }

    #[test]
    fn test_unknown_prev_is_fatal() {
        let (mut root, list) = list();
        let op = add(&list, ticket(7, "q"), ticket(2, "a"), "x");
        assert_matches!(op.execute(&mut root), Err(Error::Inconsistent(_)));
    }
}
