#[macro_use] extern crate assert_matches;
extern crate futures;
extern crate tandem;

mod common;
use common::{via_json, via_msgpack};
use futures::executor::block_on_stream;
use tandem::{ActorId, DocEvent, Document, ElementSeed, Error, Operation, Primitive, Ticket, Value};
use tandem::op::SetOperation;

fn replica(actor: &str) -> Document {
    Document::with_actor("doc", ActorId::new(actor))
}

fn sync(from: &Document, to: &Document) {
    for change in from.drain_local_changes() {
        to.apply_change(via_json(&change)).unwrap();
    }
}

#[test]
fn test_splice_literal_cases() {
    let doc = replica("a");
    doc.update(|root| {
        let mut list = root.set_array("list")?;
        for i in 0..10 {
            list.push(i)?;
        }
        Ok(())
    }).unwrap();

    doc.update(|root| {
        let removed = root.get_array("list")?.splice(1, Some(1), Vec::<i32>::new())?;
        assert_eq!(removed, [Value::Int32(1)]);
        Ok(())
    }).unwrap();
    assert_eq!(doc.to_json(), r#"{"list":[0,2,3,4,5,6,7,8,9]}"#);

    doc.update(|root| {
        let removed = root.get_array("list")?.splice(-2, Some(-11), vec![5, 6])?;
        assert!(removed.is_empty());
        Ok(())
    }).unwrap();
    assert_eq!(doc.to_json(), r#"{"list":[0,2,3,4,5,6,7,5,6,8,9]}"#);
}

#[test]
fn test_garbage_collection() {
    let doc = replica("a");
    doc.update(|root| root.set("a", 1)).unwrap();
    doc.update(|root| root.set("a", 2)).unwrap();
    doc.update(|root| root.remove("a").map(|_| ())).unwrap();
    assert_eq!(doc.garbage_len(), 2);

    assert_eq!(doc.garbage_collect(&Ticket::initial()), 0);
    assert_eq!(doc.garbage_len(), 2);
    assert_eq!(doc.garbage_collect(&Ticket::max()), 2);
    assert_eq!(doc.garbage_len(), 0);
    assert_eq!(doc.to_json(), "{}");
}

#[test]
fn test_garbage_includes_nested_elements() {
    let doc = replica("a");
    doc.update(|root| root.set("todos", Value::from_json_str(r#"[{"title":"milk"},{"title":"eggs"}]"#)?)).unwrap();
    doc.update(|root| root.remove("todos").map(|_| ())).unwrap();
    assert_eq!(doc.garbage_len(), 5);
    assert_eq!(doc.garbage_collect(&Ticket::max()), 5);
}

#[test]
fn test_string_escaping() {
    let doc = replica("a");
    doc.update(|root| root.set("k", "\"hello\"\n\t\\")).unwrap();
    assert_eq!(doc.to_json(), r#"{"k":"\"hello\"\n\t\\"}"#);
}

#[test]
fn test_sorted_json() {
    let doc = replica("a");
    doc.update(|root| {
        root.set("zebra", true)?;
        root.set("apple", vec![1.5, 2.5])?;
        root.set("mango", ())
    }).unwrap();
    assert_eq!(doc.to_json(), r#"{"zebra":true,"apple":[1.5,2.5],"mango":null}"#);
    assert_eq!(doc.to_sorted_json(), r#"{"apple":[1.5,2.5],"mango":null,"zebra":true}"#);
}

#[test]
fn test_change_paths() {
    let doc = replica("a");
    let events = doc.subscribe();
    doc.update(|root| {
        root.set("", 1)?;
        root.set("$$...hello", "world")?;
        let mut todos = root.set_array("todos")?;
        todos.push("milk")?;
        Ok(())
    }).unwrap();
    doc.update(|root| {
        root.get_array("todos")?.push_object()?.set("title", "eggs")?;
        root.get_array("todos")?.remove(0).map(|_| ())
    }).unwrap();

    drop(doc);
    let paths: Vec<Vec<String>> = block_on_stream(events)
        .map(|event| match event {
            DocEvent::LocalChange{paths, ..} => paths,
            DocEvent::RemoteChange{paths} => paths,
        })
        .collect();
    assert_eq!(paths.len(), 2);
    assert_eq!(paths[0], ["$.", "$.\\$\\$\\.\\.\\.hello", "$.todos"]);
    assert_eq!(paths[1], ["$.todos.1", "$.todos.0"]);
}

#[test]
fn test_object_lww_across_replicas() {
    let doc1 = replica("a");
    let doc2 = replica("b");
    doc1.update(|root| root.set("k", "from a")).unwrap();
    doc2.update(|root| root.set("k", "from b")).unwrap();

    sync(&doc1, &doc2);
    sync(&doc2, &doc1);
    assert_eq!(doc1.to_json(), r#"{"k":"from b"}"#);
    assert_eq!(doc1.to_json(), doc2.to_json());
    assert_eq!(doc1.garbage_len(), 1);
    assert_eq!(doc2.garbage_len(), 1);
}

#[test]
fn test_remote_clock_orders_later_local_edits() {
    let doc1 = replica("b");
    let doc2 = replica("a");
    for i in 0..3 {
        doc1.update(|root| root.set("k", i)).unwrap();
    }
    sync(&doc1, &doc2);

    doc2.update(|root| root.set("k", "latest")).unwrap();
    assert_eq!(doc2.last_change().unwrap().id().lamport(), 4);
    sync(&doc2, &doc1);
    assert_eq!(doc1.to_json(), r#"{"k":"latest"}"#);
}

#[test]
fn test_apply_single_operations() {
    let doc1 = replica("a");
    let doc2 = replica("b");
    doc1.update(|root| {
        let mut list = root.set_array("list")?;
        list.push("x")?;
        list.push("y")?;
        Ok(())
    }).unwrap();

    let change = doc1.last_change().unwrap();
    for op in change.operations() {
        doc2.apply(via_msgpack(op)).unwrap();
    }
    assert_eq!(doc2.to_json(), r#"{"list":["x","y"]}"#);
}

#[test]
fn test_concurrent_array_edits_converge() {
    let doc1 = replica("a");
    let doc2 = replica("b");
    doc1.update(|root| root.set("list", vec!["a", "b", "c"])).unwrap();
    sync(&doc1, &doc2);

    doc1.update(|root| {
        let mut list = root.get_array("list")?;
        let b = list.id_at(1).unwrap();
        list.move_front(&b)?;
        list.push("d")?;
        Ok(())
    }).unwrap();
    doc2.update(|root| {
        let mut list = root.get_array("list")?;
        list.remove(0)?;
        list.push("e")?;
        Ok(())
    }).unwrap();

    sync(&doc1, &doc2);
    sync(&doc2, &doc1);
    assert_eq!(doc1.to_json(), doc2.to_json());
    assert_eq!(doc1.to_json(), r#"{"list":["b","c","e","d"]}"#);
}

#[test]
fn test_insert_after_concurrently_moved_element() {
    let doc1 = replica("a");
    let doc2 = replica("b");
    doc1.update(|root| root.set("list", vec!["x", "y", "z"])).unwrap();
    sync(&doc1, &doc2);

    doc1.update(|root| {
        let mut list = root.get_array("list")?;
        let x = list.id_at(0).unwrap();
        list.move_last(&x)
    }).unwrap();
    doc2.update(|root| {
        let mut list = root.get_array("list")?;
        let x = list.id_at(0).unwrap();
        list.insert_after(&x, "w").map(|_| ())
    }).unwrap();

    sync(&doc1, &doc2);
    sync(&doc2, &doc1);
    assert_eq!(doc1.to_json(), r#"{"list":["w","y","z","x"]}"#);
    assert_eq!(doc2.to_json(), doc1.to_json());
}

#[test]
fn test_insert_after_element_that_was_moved_earlier() {
    let doc1 = replica("a");
    let doc2 = replica("b");
    doc1.update(|root| root.set("list", vec!["x", "y", "z"])).unwrap();
    doc1.update(|root| {
        let mut list = root.get_array("list")?;
        let x = list.id_at(0).unwrap();
        list.move_last(&x)?;
        list.insert_after(&x, "w").map(|_| ())
    }).unwrap();
    assert_eq!(doc1.to_json(), r#"{"list":["y","z","x","w"]}"#);

    sync(&doc1, &doc2);
    assert_eq!(doc2.to_json(), doc1.to_json());
}

#[test]
fn test_operation_on_unknown_parent_is_fatal() {
    let doc1 = replica("a");
    let doc2 = replica("b");
    doc1.update(|root| root.set_object("o").map(|_| ())).unwrap();
    let _ = doc1.drain_local_changes();
    doc1.update(|root| root.get_object("o")?.set("k", 1)).unwrap();

    let err = doc2.apply_change(doc1.last_change().unwrap()).unwrap_err();
    assert_matches!(err, Error::Inconsistent(_));
    assert!(err.is_fatal());
    assert_eq!(doc2.to_json(), "{}");
}

#[test]
fn test_set_on_array_parent_is_fatal() {
    let doc1 = replica("a");
    let doc2 = replica("b");
    doc1.update(|root| root.set("list", Vec::<i32>::new())).unwrap();
    sync(&doc1, &doc2);
    doc1.update(|root| root.get_array("list")?.push(1).map(|_| ())).unwrap();

    let list = doc1.last_change().unwrap().operations()[0].parent_created_at().clone();
    let at = Ticket::new(9, 1, Some(ActorId::new("a")));
    let seed = ElementSeed::Primitive{created_at: at.clone(), value: Primitive::Null};
    let set = Operation::Set(SetOperation::new(list, at, "k".to_owned(), seed));
    assert_matches!(doc2.apply(set), Err(Error::Inconsistent(_)));
    assert_eq!(doc2.to_json(), r#"{"list":[]}"#);
}
