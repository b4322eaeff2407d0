//! # Node Tree
//!
//! This module implements the tree every stored object lives in. Nodes are
//! kept in an arena owned by [`Tree`] and addressed by generational
//! [`NodeId`] handles, so parent, child and sibling links are plain indices
//! with no ownership ambiguity.
//!
//! ## Link Layout
//!
//! Children of a node form a circular doubly-linked ring. The parent points at
//! the head of the ring; every member points back at the parent.
//!
//! ```text
//!            parent
//!              │ child (head)
//!              ▼
//!   ┌──────► [ A ] ──next──► [ B ] ──next──► [ C ] ───┐
//!   │          ▲                                      │
//!   └──────────┼─────────────── next ◄────────────────┘
//!              └─ last of A is C
//! ```
//!
//! A node with no siblings is a ring of one (`next == last == self`). A node
//! with no parent is a root and owns its whole subtree.
//!
//! ## Invariants
//!
//! 1. Every sibling ring is circular: following `next` from any member returns
//!    to it after exactly `child_count(parent)` steps.
//! 2. `is_first(n)` is true iff `n` is the head its parent points at (or `n`
//!    has no parent).
//! 3. A node never becomes its own ancestor: attach operations that would
//!    create a cycle are refused.
//!
//! ## Handles
//!
//! Removing a node bumps the generation of its slot, so stale `NodeId`s are
//! detected by [`Tree::contains`] instead of aliasing a reused slot. All link
//! operations return `false` when handed a stale id.
//!
//! ## Thread Safety
//!
//! `Tree` has no internal locking. Mutation takes `&mut self`, so the borrow
//! checker already guarantees exclusive access to the whole arena during
//! attach, detach and commit.

mod body;
mod io;


pub use body::{Body, Level};

use std::sync::Arc;

use crate::record::{Record, RecordView, RecordViewMut};
use crate::symbols::SymbolTable;
use crate::table::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub fn index(self) -> u32 {
        self.index
    }
}

#[derive(Debug, Clone, Copy)]
struct Links {
    parent: Option<NodeId>,
    child: Option<NodeId>,
    next: NodeId,
    last: NodeId,
}

impl Links {
    fn singleton(id: NodeId) -> Self {
        Self {
            parent: None,
            child: None,
            next: id,
            last: id,
        }
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    occupied: bool,
    links: Links,
    body: Body,
}

#[derive(Debug)]
pub struct Tree {
    symbols: Arc<SymbolTable>,
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl Tree {
    pub fn new(symbols: Arc<SymbolTable>) -> Self {
        Self {
            symbols,
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    pub fn symbols(&self) -> &Arc<SymbolTable> {
        &self.symbols
    }

    /// Number of live nodes in the arena, across all roots.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.slots
            .get(id.index as usize)
            .is_some_and(|slot| slot.occupied && slot.generation == id.generation)
    }

    pub fn create(&mut self, body: Body) -> NodeId {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            let id = NodeId {
                index,
                generation: slot.generation,
            };
            slot.occupied = true;
            slot.links = Links::singleton(id);
            slot.body = body;
            return id;
        }

        let id = NodeId {
            index: self.slots.len() as u32,
            generation: 0,
        };
        self.slots.push(Slot {
            generation: 0,
            occupied: true,
            links: Links::singleton(id),
            body,
        });
        id
    }

    pub fn new_node(&mut self) -> NodeId {
        self.create(Body::Node)
    }

    pub fn new_record(&mut self) -> NodeId {
        let record = Record::new(Arc::clone(&self.symbols));
        self.create(Body::Record(record))
    }

    pub fn new_table(&mut self) -> NodeId {
        let record = Record::new(Arc::clone(&self.symbols));
        let table = Table::new(Arc::clone(&self.symbols));
        self.create(Body::Table { record, table })
    }

    pub fn body(&self, id: NodeId) -> Option<&Body> {
        self.contains(id).then(|| &self.slots[id.index as usize].body)
    }

    pub fn body_mut(&mut self, id: NodeId) -> Option<&mut Body> {
        if !self.contains(id) {
            return None;
        }
        Some(&mut self.slots[id.index as usize].body)
    }

    pub fn level(&self, id: NodeId) -> Option<Level> {
        self.body(id).map(Body::level)
    }

    pub fn type_name(&self, id: NodeId) -> Option<&'static str> {
        self.level(id).map(Level::type_name)
    }

    pub fn record(&self, id: NodeId) -> Option<RecordView<'_>> {
        self.body(id)?.record_view()
    }

    pub fn record_mut(&mut self, id: NodeId) -> Option<RecordViewMut<'_>> {
        self.body_mut(id)?.record_view_mut()
    }

    pub fn table(&self, id: NodeId) -> Option<&Table> {
        self.body(id)?.table()
    }

    pub fn table_mut(&mut self, id: NodeId) -> Option<&mut Table> {
        self.body_mut(id)?.table_mut()
    }

    /// Extends a node in place to a more derived level, keeping its links,
    /// children and existing record items.
    pub fn upgrade(&mut self, id: NodeId, level: Level) -> bool {
        let symbols = Arc::clone(&self.symbols);
        match self.body_mut(id) {
            Some(body) => body.upgrade(level, &symbols),
            None => false,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.contains(id).then(|| self.links(id).parent).flatten()
    }

    pub fn child(&self, id: NodeId) -> Option<NodeId> {
        self.contains(id).then(|| self.links(id).child).flatten()
    }

    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        self.contains(id).then(|| self.links(id).next)
    }

    pub fn last(&self, id: NodeId) -> Option<NodeId> {
        self.contains(id).then(|| self.links(id).last)
    }

    /// True if `id` is the head of its parent's child ring, or has no parent.
    pub fn is_first(&self, id: NodeId) -> bool {
        match self.parent(id) {
            Some(parent) => self.links(parent).child == Some(id),
            None => true,
        }
    }

    pub fn children(&self, id: NodeId) -> Children<'_> {
        let head = self.child(id);
        Children {
            tree: self,
            head,
            cursor: head,
        }
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).count()
    }

    /// True if `ancestor` is `node` itself or lies on its parent chain.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Removes `id` and its subtree from any parent and sibling ring. The node
    /// stays alive as a root.
    pub fn detach(&mut self, id: NodeId) -> bool {
        if !self.contains(id) {
            return false;
        }

        let Links {
            parent, next, last, ..
        } = *self.links(id);

        if let Some(parent) = parent {
            if self.links(parent).child == Some(id) {
                self.links_mut(parent).child = (next != id).then_some(next);
            }
            self.links_mut(id).parent = None;
        }

        self.links_mut(next).last = last;
        self.links_mut(last).next = next;

        let links = self.links_mut(id);
        links.next = id;
        links.last = id;
        true
    }

    /// Detaches `id` and appends it as the last child of `parent`.
    pub fn attach_parent(&mut self, id: NodeId, parent: NodeId) -> bool {
        if !self.contains(id) || !self.contains(parent) || self.is_ancestor(id, parent) {
            return false;
        }
        self.detach(id);

        self.links_mut(id).parent = Some(parent);
        match self.links(parent).child {
            Some(head) => self.splice_before(id, head),
            None => self.links_mut(parent).child = Some(id),
        }
        true
    }

    /// Detaches `child` and makes it the first child of `id`.
    pub fn attach_child(&mut self, id: NodeId, child: NodeId) -> bool {
        if !self.attach_parent(child, id) {
            return false;
        }
        self.links_mut(id).child = Some(child);
        true
    }

    /// Detaches `id` and inserts it immediately before `next`, adopting the
    /// parent of `next`. Inserting before a head makes `id` the new head.
    pub fn attach_before(&mut self, id: NodeId, next: NodeId) -> bool {
        if id == next
            || !self.contains(id)
            || !self.contains(next)
            || self.is_ancestor(id, next)
        {
            return false;
        }
        self.detach(id);

        let parent = self.links(next).parent;
        self.links_mut(id).parent = parent;
        self.splice_before(id, next);

        if let Some(parent) = parent {
            if self.links(parent).child == Some(next) {
                self.links_mut(parent).child = Some(id);
            }
        }
        true
    }

    /// Detaches `id` and inserts it immediately after `last`, adopting the
    /// parent of `last`.
    pub fn attach_after(&mut self, id: NodeId, last: NodeId) -> bool {
        if id == last
            || !self.contains(id)
            || !self.contains(last)
            || self.is_ancestor(id, last)
        {
            return false;
        }
        self.detach(id);

        let parent = self.links(last).parent;
        self.links_mut(id).parent = parent;
        let next = self.links(last).next;
        self.splice_before(id, next);
        true
    }

    /// Detaches and destroys `id` together with its whole subtree, returning
    /// the body of `id`.
    pub fn remove(&mut self, id: NodeId) -> Option<Body> {
        if !self.detach(id) {
            return None;
        }

        let mut stack: Vec<NodeId> = self.children(id).collect();
        while let Some(node) = stack.pop() {
            stack.extend(self.children(node));
            self.release(node);
        }
        self.release(id)
    }

    /// Destroys every child of `id`, keeping `id` itself.
    pub fn kill_children(&mut self, id: NodeId) {
        while let Some(child) = self.child(id) {
            self.remove(child);
        }
    }

    /// Estimated heap and inline bytes held by `id` alone.
    pub fn memory(&self, id: NodeId) -> usize {
        self.body(id)
            .map(|body| std::mem::size_of::<Slot>() + body.memory())
            .unwrap_or(0)
    }

    /// [`memory`](Self::memory) summed over `id` and all its descendants.
    pub fn total_memory(&self, id: NodeId) -> usize {
        self.memory(id)
            + self
                .children(id)
                .map(|child| self.total_memory(child))
                .sum::<usize>()
    }

    fn release(&mut self, id: NodeId) -> Option<Body> {
        let slot = &mut self.slots[id.index as usize];
        if !slot.occupied {
            return None;
        }
        slot.occupied = false;
        slot.generation = slot.generation.wrapping_add(1);
        slot.links = Links::singleton(id);
        self.free.push(id.index);
        self.live -= 1;
        Some(std::mem::replace(&mut slot.body, Body::Node))
    }

    /// Links the singleton `id` into the ring of `next`, just before it.
    fn splice_before(&mut self, id: NodeId, next: NodeId) {
        let last = self.links(next).last;
        {
            let links = self.links_mut(id);
            links.next = next;
            links.last = last;
        }
        self.links_mut(next).last = id;
        self.links_mut(last).next = id;
    }

    fn links(&self, id: NodeId) -> &Links {
        &self.slots[id.index as usize].links
    }

    fn links_mut(&mut self, id: NodeId) -> &mut Links {
        &mut self.slots[id.index as usize].links
    }
}

/// Iterates the child ring of a node once, starting at its head.
pub struct Children<'a> {
    tree: &'a Tree,
    head: Option<NodeId>,
    cursor: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.cursor?;
        let next = self.tree.links(current).next;
        self.cursor = (Some(next) != self.head).then_some(next);
        Some(current)
    }
}
