//! Host-owned collection of trees ticked together.
//!
//! A game usually keeps one [`Forest`] per world and drives it once per frame
//! with [`Forest::root_tick`]. Trees are ticked in insertion order.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::BehaviorTree;

/// Handle to a tree inside a [`Forest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TreeId(u64);

struct Entry {
    id: TreeId,
    tree: BehaviorTree,
    source: Option<PathBuf>,
}

#[derive(Default)]
pub struct Forest {
    entries: Vec<Entry>,
    next_id: u64,
}

impl Forest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes ownership of `tree`.
    ///
    /// A tree whose name is already used is renamed `<name>_1`, `<name>_2`,
    /// ... with the first free suffix.
    pub fn add(&mut self, mut tree: BehaviorTree) -> TreeId {
        let name = self.unique_name(tree.name());
        if name != tree.name() {
            debug!("tree `{}` renamed to `{}`", tree.name(), name);
            tree.set_name(name);
        }
        let id = TreeId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            tree,
            source: None,
        });
        id
    }

    /// Like [`add`](Self::add), remembering the document the tree came from.
    pub fn add_with_source(&mut self, tree: BehaviorTree, path: impl Into<PathBuf>) -> TreeId {
        let id = self.add(tree);
        if let Some(entry) = self.entry_mut(id) {
            entry.source = Some(path.into());
        }
        id
    }

    pub fn source_path(&self, id: TreeId) -> Option<&Path> {
        self.entry(id)?.source.as_deref()
    }

    pub fn get(&self, id: TreeId) -> Option<&BehaviorTree> {
        self.entry(id).map(|entry| &entry.tree)
    }

    pub fn get_mut(&mut self, id: TreeId) -> Option<&mut BehaviorTree> {
        self.entry_mut(id).map(|entry| &mut entry.tree)
    }

    /// Stops the tree and hands it back.
    pub fn remove(&mut self, id: TreeId) -> Option<BehaviorTree> {
        let index = self.entries.iter().position(|entry| entry.id == id)?;
        let mut entry = self.entries.remove(index);
        entry.tree.stop_tree();
        Some(entry.tree)
    }

    pub fn root_start(&mut self) {
        for entry in &mut self.entries {
            entry.tree.start_tree();
        }
    }

    pub fn root_tick(&mut self) {
        debug!("ticking {} behavior trees", self.entries.len());
        for entry in &mut self.entries {
            entry.tree.tick_tree();
        }
    }

    pub fn root_stop(&mut self) {
        for entry in &mut self.entries {
            entry.tree.stop_tree();
        }
    }

    /// Stops and drops every tree.
    pub fn root_clear(&mut self) {
        self.root_stop();
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TreeId, &BehaviorTree)> {
        self.entries.iter().map(|entry| (entry.id, &entry.tree))
    }

    fn entry(&self, id: TreeId) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    fn entry_mut(&mut self, id: TreeId) -> Option<&mut Entry> {
        self.entries.iter_mut().find(|entry| entry.id == id)
    }

    fn is_taken(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry.tree.name() == name)
    }

    fn unique_name(&self, base: &str) -> String {
        if !self.is_taken(base) {
            return base.to_owned();
        }
        (1..)
            .map(|counter| format!("{base}_{counter}"))
            .find(|candidate| !self.is_taken(candidate))
            .unwrap_or_else(|| base.to_owned())
    }
}
