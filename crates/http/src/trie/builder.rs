//! Offline construction of packed trie tables.
//!
//! Tokens are first inserted into a plain character trie, then chains of
//! single-child nodes without a terminal are collapsed into one entry whose
//! prefix holds the whole run. Branch nodes are numbered breadth first and
//! their children are placed with first-fit: the lowest base offset at which
//! every child slot `offset + class(c)` is still free.
//!
//! The table length depends on the order in which branches are placed. Two
//! fixed orders seed the result, then a depth-first search over orders,
//! bounded by [`SEARCH_BUDGET`] placements, keeps any shorter table it finds.
//! The search is deterministic, so a token list always packs to the same table.

use super::{CharClass, LEAF, TrieEntry, TrieRoot, lookup};
use std::cmp::Reverse;
use std::collections::{BTreeMap, VecDeque};
use thiserror::Error;

/// Placements the order search may try before it settles for the best table so far.
pub const SEARCH_BUDGET: usize = 1 << 14;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("empty token")]
    EmptyToken,

    #[error("token {token:?} uses the reserved code 0")]
    ZeroCode { token: String },

    #[error("token {token:?} appears twice")]
    Duplicate { token: String },

    #[error("characters {first:?} and {second:?} fall into the same class under one branch")]
    ClassCollision { first: char, second: char },

    #[error("table does not fit 8-bit slots: {reason}")]
    TooLarge { reason: &'static str },
}

#[derive(Debug)]
struct Node {
    label: Vec<u8>,
    children: BTreeMap<u8, usize>,
    terminal: u8,
}

impl Node {
    fn new(label: Vec<u8>) -> Self {
        Self { label, children: BTreeMap::new(), terminal: 0 }
    }
}

/// Collects tokens for one or more roots and packs them into a table.
#[derive(Debug, Clone)]
pub struct TrieBuilder {
    class: CharClass,
    roots: Vec<Vec<(Vec<u8>, u8)>>,
}

impl TrieBuilder {
    pub fn new(class: CharClass) -> Self {
        Self { class, roots: vec![Vec::new()] }
    }

    /// Adds a token to the current root.
    #[must_use]
    pub fn token(mut self, token: impl AsRef<[u8]>, code: u8) -> Self {
        self.push_token(token, code);
        self
    }

    pub fn push_token(&mut self, token: impl AsRef<[u8]>, code: u8) {
        if let Some(root) = self.roots.last_mut() {
            root.push((token.as_ref().to_vec(), code));
        }
    }

    /// Starts a new root; following tokens are reachable only from it.
    #[must_use]
    pub fn root(mut self) -> Self {
        self.push_root();
        self
    }

    pub fn push_root(&mut self) {
        self.roots.push(Vec::new());
    }

    pub fn build(&self) -> Result<PackedTrie, BuildError> {
        let Prepared { nodes, roots, branches, classes } = self.prepare()?;
        let offsets = pack(&classes, SEARCH_BUDGET).offsets;

        let branch_id = |node: usize| branches.iter().position(|&b| b == node);
        let mut slots = Vec::new();
        for (check, (&parent, &base)) in branches.iter().zip(&offsets).enumerate() {
            for (&c, &child) in &nodes[parent].children {
                let slot = base + self.class.of(c);
                if slots.len() <= slot {
                    slots.resize(slot + 1, None);
                }
                let (next, offset) = match branch_id(child) {
                    Some(id) => (id, offsets[id]),
                    None => (usize::from(LEAF), 0),
                };
                slots[slot] = Some(PackedSlot {
                    prefix: nodes[child].label.clone(),
                    check: narrow(check)?,
                    next: narrow(next)?,
                    offset: narrow(offset)?,
                    terminal: nodes[child].terminal,
                });
            }
        }

        let roots = roots
            .iter()
            .map(|&root| match branch_id(root) {
                Some(id) => Ok(TrieRoot::new(narrow(id)?, narrow(offsets[id])?)),
                None => Ok(TrieRoot::new(0, 0)),
            })
            .collect::<Result<_, BuildError>>()?;

        Ok(PackedTrie { class: self.class, slots, roots })
    }

    /// Builds the collapsed trie, numbers its branches breadth first and
    /// collects the child classes of every branch.
    fn prepare(&self) -> Result<Prepared, BuildError> {
        let mut nodes = Vec::new();
        let mut roots = Vec::with_capacity(self.roots.len());

        for tokens in &self.roots {
            let root = nodes.len();
            nodes.push(Node::new(Vec::new()));
            for (token, code) in tokens {
                insert(&mut nodes, root, token, *code)?;
            }
            let children: Vec<usize> = nodes[root].children.values().copied().collect();
            for child in children {
                compress(&mut nodes, child);
            }
            roots.push(root);
        }

        let mut branches = Vec::new();
        let mut queue: VecDeque<usize> = roots.iter().copied().collect();
        while let Some(node) = queue.pop_front() {
            if !nodes[node].children.is_empty() {
                branches.push(node);
                queue.extend(nodes[node].children.values().copied());
            }
        }
        if branches.len() >= usize::from(LEAF) {
            return Err(BuildError::TooLarge { reason: "too many branches" });
        }

        let mut classes = Vec::with_capacity(branches.len());
        for &branch in &branches {
            let mut seen = BTreeMap::new();
            for &c in nodes[branch].children.keys() {
                if let Some(first) = seen.insert(self.class.of(c), c) {
                    return Err(BuildError::ClassCollision { first: char::from(first), second: char::from(c) });
                }
            }
            classes.push(seen.into_keys().collect());
        }

        Ok(Prepared { nodes, roots, branches, classes })
    }
}

/// The collapsed trie ready for placement. `classes[id]` holds the sorted child
/// classes of branch `id`, whose node is `branches[id]`.
#[derive(Debug)]
struct Prepared {
    nodes: Vec<Node>,
    roots: Vec<usize>,
    branches: Vec<usize>,
    classes: Vec<Vec<usize>>,
}

/// Base offset of every branch, indexed by branch id, and the table length.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Layout {
    offsets: Vec<usize>,
    len: usize,
}

/// Places the branches with first-fit in two fixed orders (breadth first and
/// widest first), then searches other orders for a shorter table. The search
/// gives up after `budget` placements.
fn pack(classes: &[Vec<usize>], budget: usize) -> Layout {
    let by_level: Vec<usize> = (0..classes.len()).collect();
    let mut widest_first = by_level.clone();
    widest_first.sort_by_key(|&id| Reverse(classes[id].len()));

    let level = place(classes, &by_level);
    let widest = place(classes, &widest_first);
    let mut best = if widest.len < level.len { widest } else { level };

    let mut search = Search {
        classes,
        used: Vec::new(),
        offsets: vec![0; classes.len()],
        placed: vec![false; classes.len()],
        budget,
    };
    search.run(0, &mut best);
    best
}

/// First-fit placement of the branches in `order`.
fn place(classes: &[Vec<usize>], order: &[usize]) -> Layout {
    let mut used = Vec::new();
    let mut offsets = vec![0; classes.len()];
    for &id in order {
        let base = first_fit(&used, &classes[id]);
        mark(&mut used, base, &classes[id]);
        offsets[id] = base;
    }
    Layout { offsets, len: used.len() }
}

/// The lowest base at which every slot `base + class` is free.
fn first_fit(used: &[bool], classes: &[usize]) -> usize {
    (0..).find(|&base| classes.iter().all(|class| !used.get(base + class).copied().unwrap_or(false))).unwrap_or_default()
}

fn mark(used: &mut Vec<bool>, base: usize, classes: &[usize]) {
    for class in classes {
        if used.len() <= base + class {
            used.resize(base + class + 1, false);
        }
        used[base + class] = true;
    }
}

/// Depth-first search over placement orders. Every step places one more
/// branch first-fit; a partial table already as long as the best one is
/// abandoned.
struct Search<'a> {
    classes: &'a [Vec<usize>],
    used: Vec<bool>,
    offsets: Vec<usize>,
    placed: Vec<bool>,
    budget: usize,
}

impl Search<'_> {
    fn run(&mut self, depth: usize, best: &mut Layout) {
        let all = self.classes;
        if depth == all.len() {
            if self.used.len() < best.len {
                *best = Layout { offsets: self.offsets.clone(), len: self.used.len() };
            }
            return;
        }

        for (id, classes) in all.iter().enumerate() {
            if self.placed[id] {
                continue;
            }
            if self.budget == 0 {
                return;
            }
            self.budget -= 1;

            let base = first_fit(&self.used, classes);
            let end = self.used.len().max(base + classes.last().copied().unwrap_or_default() + 1);
            if end >= best.len {
                continue;
            }

            let saved = self.used.len();
            mark(&mut self.used, base, classes);
            self.offsets[id] = base;
            self.placed[id] = true;

            self.run(depth + 1, best);

            self.placed[id] = false;
            for class in classes {
                self.used[base + class] = false;
            }
            self.used.truncate(saved);
        }
    }
}

fn insert(nodes: &mut Vec<Node>, root: usize, token: &[u8], code: u8) -> Result<(), BuildError> {
    let text = || String::from_utf8_lossy(token).into_owned();
    if token.is_empty() {
        return Err(BuildError::EmptyToken);
    }
    if code == 0 {
        return Err(BuildError::ZeroCode { token: text() });
    }

    let mut node = root;
    for &c in token {
        node = match nodes[node].children.get(&c) {
            Some(&child) => child,
            None => {
                let child = nodes.len();
                nodes.push(Node::new(vec![c]));
                nodes[node].children.insert(c, child);
                child
            }
        };
    }

    if nodes[node].terminal != 0 {
        return Err(BuildError::Duplicate { token: text() });
    }
    nodes[node].terminal = code;
    Ok(())
}

fn compress(nodes: &mut [Node], node: usize) {
    while nodes[node].children.len() == 1 && nodes[node].terminal == 0 {
        let Some((_, &child)) = nodes[node].children.first_key_value() else {
            break;
        };
        let label = std::mem::take(&mut nodes[child].label);
        let children = std::mem::take(&mut nodes[child].children);
        nodes[node].label.extend_from_slice(&label);
        nodes[node].children = children;
        nodes[node].terminal = nodes[child].terminal;
    }

    let children: Vec<usize> = nodes[node].children.values().copied().collect();
    for child in children {
        compress(nodes, child);
    }
}

fn narrow(value: usize) -> Result<u8, BuildError> {
    u8::try_from(value).map_err(|_| BuildError::TooLarge { reason: "slot index exceeds 255" })
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PackedSlot {
    prefix: Vec<u8>,
    check: u8,
    next: u8,
    offset: u8,
    terminal: u8,
}

/// A table produced by [`TrieBuilder::build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedTrie {
    class: CharClass,
    slots: Vec<Option<PackedSlot>>,
    roots: Vec<TrieRoot>,
}

impl PackedTrie {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn roots(&self) -> &[TrieRoot] {
        &self.roots
    }

    /// Borrowed entries, with empty slots as [`TrieEntry::EMPTY`].
    pub fn entries(&self) -> Vec<TrieEntry<'_>> {
        self.slots
            .iter()
            .map(|slot| match slot {
                Some(s) => TrieEntry::new(&s.prefix, s.check, s.next, s.offset, s.terminal),
                None => TrieEntry::EMPTY,
            })
            .collect()
    }

    pub fn lookup(&self, root: usize, token: &[u8]) -> Option<u8> {
        let root = *self.roots.get(root)?;
        lookup(&self.entries(), self.class, root, token)
    }

    /// Renders the table as a Rust constant named `name`.
    pub fn render(&self, name: &str) -> String {
        let roots: Vec<String> =
            self.roots.iter().map(|r| format!("TrieRoot::new({}, {})", r.next, r.offset)).collect();
        let mut out = format!("// roots: [{}]\n", roots.join(", "));
        out.push_str(&format!("const {name}: [TrieEntry<'static>; {}] = {{\n", self.len()));
        out.push_str(&format!("    let mut t = [TrieEntry::EMPTY; {}];\n", self.len()));
        for (index, slot) in self.slots.iter().enumerate() {
            let Some(slot) = slot else { continue };
            let next = if slot.next == LEAF { "LEAF".to_string() } else { slot.next.to_string() };
            out.push_str(&format!(
                "    t[{index}] = TrieEntry::new(b\"{}\", {}, {next}, {}, {});\n",
                slot.prefix.escape_ascii(),
                slot.check,
                slot.offset,
                slot.terminal
            ));
        }
        out.push_str("    t\n};\n");
        out
    }
}
