//! A `ChangeContext` is the scratch pad of one transaction. It issues
//! tickets, executes and records operations, and tracks which elements
//! were created, which were tombstoned and which paths changed.

use {Error, Ticket};
use change::{Change, ChangeId};
use op::Operation;
use root::Root;

pub struct ChangeContext<'a> {
    root: &'a mut Root,
    id: ChangeId,
    delimiter: u32,
    message: Option<String>,
    operations: Vec<Operation>,
    created: Vec<Ticket>,
    removed: Vec<Ticket>,
    paths: Vec<String>,
}

impl<'a> ChangeContext<'a> {
    pub fn new(id: ChangeId, root: &'a mut Root, message: Option<String>) -> Self {
        ChangeContext{
            root,
            id,
            delimiter: 0,
            message,
            operations: vec![],
            created: vec![],
            removed: vec![],
            paths: vec![],
        }
    }

    pub fn id(&self) -> &ChangeId {
        &self.id
    }

    pub fn root(&self) -> &Root {
        &*self.root
    }

    /// Issues the next ticket of the transaction.
    pub fn issue_ticket(&mut self) -> Ticket {
        self.delimiter += 1;
        self.id.create_ticket(self.delimiter)
    }

    /// Executes `op` against the tree and records it. If execution
    /// fails nothing is recorded.
    pub fn push<O: Into<Operation>>(&mut self, op: O) -> Result<(), Error> {
        let op = op.into();
        let tombstoned = op.execute(self.root)?;

        if let Some(created_at) = op.created() {
            self.created.push(created_at.clone());
        }
        self.removed.extend(tombstoned);
        if let Ok(path) = self.root.path_of(op.effected_created_at()) {
            self.paths.push(path);
        }
        self.operations.push(op);
        Ok(())
    }

    pub fn has_operations(&self) -> bool {
        !self.operations.is_empty()
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Elements created in this transaction.
    pub fn created(&self) -> &[Ticket] {
        &self.created
    }

    /// Elements tombstoned in this transaction.
    pub fn removed(&self) -> &[Ticket] {
        &self.removed
    }

    /// The changed paths, reduced to those no other changed path
    /// is a prefix of, in the order they were first recorded.
    pub fn paths(&self) -> Vec<String> {
        minimal_paths(&self.paths)
    }

    pub fn into_change(self) -> Change {
        Change::new(self.id, self.operations, self.message)
    }
}

fn split_path(path: &str) -> Vec<String> {
    let mut segments = vec![];
    let mut segment = String::new();
    let mut chars = path.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                segment.push(c);
                if let Some(escaped) = chars.next() {
                    segment.push(escaped);
                }
            }
            '.' => segments.push(::std::mem::replace(&mut segment, String::new())),
            c => segment.push(c),
        }
    }
    segments.push(segment);
    segments
}

/// Drops every path that another path is a segment-wise prefix of,
/// along with duplicates.
pub(crate) fn minimal_paths(paths: &[String]) -> Vec<String> {
    let split: Vec<Vec<String>> = paths.iter().map(|p| split_path(p)).collect();
    let mut result: Vec<String> = vec![];
    for (i, path) in paths.iter().enumerate() {
        let covered = split.iter().any(|other| {
            other.len() < split[i].len() && split[i].starts_with(other)
        });
        if !covered && !result.contains(path) {
            result.push(path.clone());
        }
    }
    result
}
