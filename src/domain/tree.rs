//! In-memory tree of documents and the item-link graph spanning them.
//!
//! The [`Tree`] knows nothing about the filesystem. Documents are keyed by
//! prefix and arranged by their declared parent prefixes; item links form a
//! directed graph with edges pointing from child to parent. Both structures
//! are read-only once loaded: publishing is a pure function of the tree.

use std::collections::{BTreeMap, BTreeSet};

use petgraph::{
    Direction,
    algo::{is_cyclic_directed, tarjan_scc},
    graphmap::DiGraphMap,
};
use thiserror::Error;
use tracing::instrument;

use super::{Document, Item, Prefix, Uid};

/// Interned identity of an item in the link graph.
///
/// `DiGraphMap` needs `Copy` node keys, so identifiers are interned on
/// insertion and mapped back through the tree's tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct NodeId(usize);

/// The set of documents under one root, with their item-link graph.
///
/// Documents are held in prefix order. Links may point at identifiers that no
/// loaded item carries; those edges are kept and surfaced as dangling links
/// rather than rejected, so a partially-written tree can still be inspected
/// and published.
#[derive(Debug, Default)]
pub struct Tree {
    /// Documents, keyed by prefix.
    documents: BTreeMap<Prefix, Document>,

    /// Location of every item: owning prefix and position in load order.
    items: BTreeMap<Uid, (Prefix, usize)>,

    /// Interner table from identifier to graph node.
    ids: BTreeMap<Uid, NodeId>,

    /// Reverse interner table, indexed by [`NodeId`].
    uids: Vec<Uid>,

    /// Link graph. Edges point from child item to parent item.
    graph: DiGraphMap<NodeId, ()>,
}

/// Errors that can occur when inserting a document into the tree.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    /// A document with the same prefix is already present.
    #[error("duplicate document prefix {0}")]
    DuplicateDocument(Prefix),

    /// An item with the same identifier is already present.
    #[error("duplicate item identifier {0}")]
    DuplicateItem(Uid),
}

impl Tree {
    /// Inserts a document and registers its items in the link graph.
    ///
    /// Documents may arrive in any order; a parent prefix that has not been
    /// inserted yet simply leaves the document a root until it shows up.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::DuplicateDocument`] if the prefix is already
    /// taken, or [`TreeError::DuplicateItem`] if any item identifier collides
    /// with one already in the tree. A failed insert leaves the tree
    /// untouched.
    pub fn insert(&mut self, document: Document) -> Result<(), TreeError> {
        if self.documents.contains_key(document.prefix()) {
            return Err(TreeError::DuplicateDocument(document.prefix().clone()));
        }

        let mut incoming = BTreeSet::new();
        for item in document.items() {
            if self.items.contains_key(item.uid()) || !incoming.insert(item.uid()) {
                return Err(TreeError::DuplicateItem(item.uid().clone()));
            }
        }

        let prefix = document.prefix().clone();
        for (position, item) in document.items().iter().enumerate() {
            let child = self.intern(item.uid());
            self.graph.add_node(child);
            for parent in item.links() {
                let parent = self.intern(parent);
                self.graph.add_edge(child, parent, ());
            }
            self.items
                .insert(item.uid().clone(), (prefix.clone(), position));
        }

        self.documents.insert(prefix, document);
        Ok(())
    }

    /// Retrieves a document by prefix.
    #[must_use]
    pub fn document(&self, prefix: &Prefix) -> Option<&Document> {
        self.documents.get(prefix)
    }

    /// All documents, in prefix order.
    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.documents.values()
    }

    /// The number of documents in the tree.
    #[must_use]
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// The number of items across all documents.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// `true` when the tree holds no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Retrieves an item anywhere in the tree by identifier.
    #[must_use]
    pub fn item(&self, uid: &Uid) -> Option<&Item> {
        let (prefix, position) = self.items.get(uid)?;
        self.documents.get(prefix)?.items().get(*position)
    }

    /// Documents with no parent, or whose parent prefix is not loaded, in
    /// prefix order.
    pub fn roots(&self) -> impl Iterator<Item = &Document> {
        self.documents.values().filter(|document| {
            document
                .parent()
                .is_none_or(|parent| !self.documents.contains_key(parent))
        })
    }

    /// The documents that declare `prefix` as their parent, in prefix order.
    pub fn children_of(&self, prefix: &Prefix) -> impl Iterator<Item = &Document> {
        self.documents
            .values()
            .filter(move |document| document.parent() == Some(prefix))
    }

    /// All documents in depth-first order, paired with their nesting depth.
    ///
    /// Roots come first in prefix order, each followed by its subtree. The
    /// depth feeds heading continuity when a tree is published as one set of
    /// artifacts.
    #[must_use]
    pub fn documents_depth_first(&self) -> Vec<(usize, &Document)> {
        let mut ordered = Vec::with_capacity(self.documents.len());
        let mut visited = BTreeSet::new();

        for root in self.roots() {
            self.push_subtree(root, 0, &mut visited, &mut ordered);
        }

        // A parent cycle between documents leaves its members unreachable
        // from any root; surface them as extra roots instead of dropping
        // them from the publication.
        for document in self.documents.values() {
            if !visited.contains(document.prefix()) {
                self.push_subtree(document, 0, &mut visited, &mut ordered);
            }
        }

        ordered
    }

    /// Documents whose declared parent prefix is not loaded,
    /// as `(document, missing parent)` pairs in prefix order.
    #[must_use]
    pub fn unknown_parents(&self) -> Vec<(&Prefix, &Prefix)> {
        self.documents
            .values()
            .filter_map(|document| {
                let parent = document.parent()?;
                (!self.documents.contains_key(parent)).then_some((document.prefix(), parent))
            })
            .collect()
    }

    /// The items that link to `uid`, in identifier order.
    #[must_use]
    pub fn child_items(&self, uid: &Uid) -> Vec<&Item> {
        let Some(&id) = self.ids.get(uid) else {
            return Vec::new();
        };

        let mut children: Vec<&Item> = self
            .graph
            .neighbors_directed(id, Direction::Incoming)
            .filter_map(|child| self.item(self.uid_of(child)))
            .collect();
        children.sort_by(|a, b| a.uid().cmp(b.uid()));
        children
    }

    /// Links whose parent identifier has no loaded item, as
    /// `(child, missing parent)` pairs in sorted order.
    #[must_use]
    pub fn dangling_links(&self) -> Vec<(&Uid, &Uid)> {
        let mut dangling: Vec<(&Uid, &Uid)> = self
            .graph
            .all_edges()
            .filter_map(|(child, parent, ())| {
                let parent_uid = self.uid_of(parent);
                (!self.items.contains_key(parent_uid)).then(|| (self.uid_of(child), parent_uid))
            })
            .collect();
        dangling.sort();
        dangling
    }

    /// Determine whether the link graph contains any cycles.
    #[must_use]
    pub fn has_cycles(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// Return all cycles in the link graph as sorted sets of identifiers.
    #[must_use]
    pub fn cycles(&self) -> Vec<Vec<Uid>> {
        let mut cycles = Vec::new();

        for component in tarjan_scc(&self.graph) {
            if component.len() > 1 {
                let mut uids: Vec<_> = component
                    .iter()
                    .map(|&id| self.uid_of(id).clone())
                    .collect();
                uids.sort();
                cycles.push(uids);
                continue;
            }

            let Some(&node) = component.first() else {
                continue;
            };

            if self.graph.contains_edge(node, node) {
                cycles.push(vec![self.uid_of(node).clone()]);
            }
        }

        cycles.sort();
        cycles
    }

    /// Traceability rows: link chains from every root-document item down
    /// through the items that link to it, one column per document in
    /// depth-first order.
    ///
    /// Chains only move forward through the column order, so a link back into
    /// an earlier document (or within the same one) ends the row instead of
    /// revisiting a column. Rows are de-duplicated and sorted.
    #[must_use]
    #[instrument(skip(self))]
    pub fn traceability(&self) -> Vec<Vec<Option<&Uid>>> {
        let columns: BTreeMap<&Prefix, usize> = self
            .documents_depth_first()
            .iter()
            .enumerate()
            .map(|(index, (_, document))| (document.prefix(), index))
            .collect();

        let mut rows = BTreeSet::new();
        for root in self.roots() {
            let Some(&column) = columns.get(root.prefix()) else {
                continue;
            };
            for item in root.items() {
                let mut row = vec![None; columns.len()];
                row[column] = Some(item.uid());
                self.expand_row(row, column, item.uid(), &columns, &mut rows);
            }
        }

        rows.into_iter().collect()
    }

    fn expand_row<'a>(
        &'a self,
        row: Vec<Option<&'a Uid>>,
        column: usize,
        uid: &Uid,
        columns: &BTreeMap<&Prefix, usize>,
        rows: &mut BTreeSet<Vec<Option<&'a Uid>>>,
    ) {
        let mut extended = false;
        for child in self.child_items(uid) {
            let Some((prefix, _)) = self.items.get(child.uid()) else {
                continue;
            };
            let Some(&child_column) = columns.get(prefix) else {
                continue;
            };
            if child_column <= column {
                continue;
            }

            let mut next = row.clone();
            next[child_column] = Some(child.uid());
            extended = true;
            self.expand_row(next, child_column, child.uid(), columns, rows);
        }

        if !extended {
            rows.insert(row);
        }
    }

    fn push_subtree<'a>(
        &'a self,
        document: &'a Document,
        depth: usize,
        visited: &mut BTreeSet<&'a Prefix>,
        ordered: &mut Vec<(usize, &'a Document)>,
    ) {
        if !visited.insert(document.prefix()) {
            return;
        }
        ordered.push((depth, document));
        for child in self.children_of(document.prefix()) {
            self.push_subtree(child, depth + 1, visited, ordered);
        }
    }

    fn intern(&mut self, uid: &Uid) -> NodeId {
        if let Some(&id) = self.ids.get(uid) {
            return id;
        }
        let id = NodeId(self.uids.len());
        self.uids.push(uid.clone());
        self.ids.insert(uid.clone(), id);
        id
    }

    fn uid_of(&self, id: NodeId) -> &Uid {
        &self.uids[id.0]
    }
}
