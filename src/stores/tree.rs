//! Red-black tree ordered by value
//!
//! Insertion descends left only when the visited node is strictly greater
//! than the new value, so equal values always go right of existing ones and
//! an in-order walk lists duplicates in insertion order.
//!
//! Nodes carry parent links, which gives `next`/`prev` stepping without an
//! explicit stack.

use super::arena::{Arena, NodeId};
use super::{IndexStore, Released};
use crate::config::TreeTeardown;
use crate::models::{StoreKind, Value};
use crate::Result;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Dir {
    Left,
    Right,
}

impl Dir {
    fn opposite(self) -> Dir {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

#[derive(Debug)]
struct TreeNode {
    value: Value,
    color: Color,
    parent: Option<NodeId>,
    left: Option<NodeId>,
    right: Option<NodeId>,
}

impl TreeNode {
    fn child(&self, dir: Dir) -> Option<NodeId> {
        match dir {
            Dir::Left => self.left,
            Dir::Right => self.right,
        }
    }

    fn set_child(&mut self, dir: Dir, child: Option<NodeId>) {
        match dir {
            Dir::Left => self.left = child,
            Dir::Right => self.right = child,
        }
    }
}

#[derive(Debug)]
pub struct TreeStore {
    nodes: Arena<TreeNode>,
    root: Option<NodeId>,
    teardown: TreeTeardown,
}

impl TreeStore {
    pub fn new() -> Self {
        Self::with_limit(None)
    }

    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            nodes: Arena::new(StoreKind::Tree, limit),
            root: None,
            teardown: TreeTeardown::Structural,
        }
    }

    pub fn with_teardown(mut self, teardown: TreeTeardown) -> Self {
        self.teardown = teardown;
        self
    }

    fn is_red(&self, id: Option<NodeId>) -> bool {
        id.is_some_and(|id| self.nodes[id].color == Color::Red)
    }

    fn dir_of(&self, id: NodeId, parent: NodeId) -> Dir {
        if self.nodes[parent].left == Some(id) {
            Dir::Left
        } else {
            Dir::Right
        }
    }

    fn replace_child(&mut self, parent: Option<NodeId>, old: NodeId, new: Option<NodeId>) {
        match parent {
            None => self.root = new,
            Some(p) => {
                let dir = self.dir_of(old, p);
                self.nodes[p].set_child(dir, new);
            }
        }
    }

    /// Rotate `id` down towards `dir`; its opposite child takes its place.
    fn rotate(&mut self, id: NodeId, dir: Dir) {
        let Some(pivot) = self.nodes[id].child(dir.opposite()) else {
            return;
        };
        let inner = self.nodes[pivot].child(dir);

        self.nodes[id].set_child(dir.opposite(), inner);
        if let Some(inner) = inner {
            self.nodes[inner].parent = Some(id);
        }

        let parent = self.nodes[id].parent;
        self.nodes[pivot].parent = parent;
        self.replace_child(parent, id, Some(pivot));

        self.nodes[pivot].set_child(dir, Some(id));
        self.nodes[id].parent = Some(pivot);
    }

    fn insert_fixup(&mut self, mut node: NodeId) {
        while let Some(parent) = self.nodes[node].parent {
            if self.nodes[parent].color == Color::Black {
                break;
            }
            // A red parent is never the root
            let Some(grand) = self.nodes[parent].parent else {
                break;
            };
            let side = self.dir_of(parent, grand);
            let uncle = self.nodes[grand].child(side.opposite());

            if let Some(uncle) = uncle.filter(|&u| self.nodes[u].color == Color::Red) {
                self.nodes[parent].color = Color::Black;
                self.nodes[uncle].color = Color::Black;
                self.nodes[grand].color = Color::Red;
                node = grand;
                continue;
            }

            let (node_now, parent_now) = if self.dir_of(node, parent) != side {
                self.rotate(parent, side);
                (parent, node)
            } else {
                (node, parent)
            };
            self.nodes[parent_now].color = Color::Black;
            self.nodes[grand].color = Color::Red;
            self.rotate(grand, side.opposite());
            node = node_now;
        }

        if let Some(root) = self.root {
            self.nodes[root].color = Color::Black;
        }
    }

    fn extreme(&self, mut id: NodeId, dir: Dir) -> NodeId {
        while let Some(child) = self.nodes[id].child(dir) {
            id = child;
        }
        id
    }

    /// In-order neighbour of `id` in direction `dir`
    fn step(&self, id: NodeId, dir: Dir) -> Option<NodeId> {
        if let Some(child) = self.nodes[id].child(dir) {
            return Some(self.extreme(child, dir.opposite()));
        }
        let mut current = id;
        while let Some(parent) = self.nodes[current].parent {
            if self.nodes[parent].child(dir) != Some(current) {
                return Some(parent);
            }
            current = parent;
        }
        None
    }

    fn transplant(&mut self, old: NodeId, new: Option<NodeId>) {
        let parent = self.nodes[old].parent;
        self.replace_child(parent, old, new);
        if let Some(new) = new {
            self.nodes[new].parent = parent;
        }
    }

    fn erase(&mut self, node: NodeId) -> Value {
        let left = self.nodes[node].left;
        let right = self.nodes[node].right;

        let removed_color;
        let fix_node;
        let fix_parent;

        match (left, right) {
            (None, _) | (_, None) => {
                let child = left.or(right);
                removed_color = self.nodes[node].color;
                fix_node = child;
                fix_parent = self.nodes[node].parent;
                self.transplant(node, child);
            }
            (Some(left), Some(right)) => {
                let successor = self.extreme(right, Dir::Left);
                removed_color = self.nodes[successor].color;
                fix_node = self.nodes[successor].right;

                if self.nodes[successor].parent == Some(node) {
                    fix_parent = Some(successor);
                } else {
                    fix_parent = self.nodes[successor].parent;
                    let successor_right = self.nodes[successor].right;
                    self.transplant(successor, successor_right);
                    self.nodes[successor].right = Some(right);
                    self.nodes[right].parent = Some(successor);
                }

                self.transplant(node, Some(successor));
                self.nodes[successor].left = Some(left);
                self.nodes[left].parent = Some(successor);
                self.nodes[successor].color = self.nodes[node].color;
            }
        }

        if removed_color == Color::Black {
            self.erase_fixup(fix_node, fix_parent);
        }

        match self.nodes.free(node) {
            Some(freed) => freed.value,
            None => unreachable!("erased a node that was not live"),
        }
    }

    fn erase_fixup(&mut self, mut node: Option<NodeId>, mut parent: Option<NodeId>) {
        while node != self.root && !self.is_red(node) {
            let Some(p) = parent else {
                break;
            };
            let side = if self.nodes[p].left == node {
                Dir::Left
            } else {
                Dir::Right
            };
            let far = side.opposite();

            let mut sibling = self.nodes[p].child(far);
            if self.is_red(sibling) {
                if let Some(s) = sibling {
                    self.nodes[s].color = Color::Black;
                }
                self.nodes[p].color = Color::Red;
                self.rotate(p, side);
                sibling = self.nodes[p].child(far);
            }

            let Some(s) = sibling else {
                node = Some(p);
                parent = self.nodes[p].parent;
                continue;
            };

            if !self.is_red(self.nodes[s].left) && !self.is_red(self.nodes[s].right) {
                self.nodes[s].color = Color::Red;
                node = Some(p);
                parent = self.nodes[p].parent;
                continue;
            }

            let mut s = s;
            if !self.is_red(self.nodes[s].child(far)) {
                if let Some(near) = self.nodes[s].child(side) {
                    self.nodes[near].color = Color::Black;
                }
                self.nodes[s].color = Color::Red;
                self.rotate(s, far);
                match self.nodes[p].child(far) {
                    Some(next) => s = next,
                    None => break,
                }
            }

            self.nodes[s].color = self.nodes[p].color;
            self.nodes[p].color = Color::Black;
            if let Some(far_child) = self.nodes[s].child(far) {
                self.nodes[far_child].color = Color::Black;
            }
            self.rotate(p, side);
            node = self.root;
            parent = None;
        }

        if let Some(node) = node {
            self.nodes[node].color = Color::Black;
        }
    }

    fn find(&self, value: Value) -> Option<NodeId> {
        let mut cursor = self.root;
        while let Some(id) = cursor {
            let current = self.nodes[id].value;
            cursor = match current.cmp(&value) {
                std::cmp::Ordering::Greater => self.nodes[id].left,
                std::cmp::Ordering::Less => self.nodes[id].right,
                std::cmp::Ordering::Equal => return Some(id),
            };
        }
        None
    }

    pub fn contains(&self, value: Value) -> bool {
        self.find(value).is_some()
    }

    /// Erase one node equal to `value`
    pub fn remove(&mut self, value: Value) -> bool {
        match self.find(value) {
            Some(id) => {
                self.erase(id);
                true
            }
            None => false,
        }
    }

    /// Erase the maximum node
    pub fn pop_last(&mut self) -> Option<Value> {
        let root = self.root?;
        let last = self.extreme(root, Dir::Right);
        Some(self.erase(last))
    }

    pub fn first(&self) -> Option<Value> {
        self.root
            .map(|root| self.nodes[self.extreme(root, Dir::Left)].value)
    }

    pub fn last(&self) -> Option<Value> {
        self.root
            .map(|root| self.nodes[self.extreme(root, Dir::Right)].value)
    }

    /// Number of nodes on the longest root-to-leaf path
    pub fn height(&self) -> usize {
        let mut deepest = 0;
        let mut stack: Vec<(NodeId, usize)> = self.root.map(|r| (r, 1)).into_iter().collect();
        while let Some((id, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            let node = &self.nodes[id];
            for child in [node.left, node.right].into_iter().flatten() {
                stack.push((child, depth + 1));
            }
        }
        deepest
    }

    /// Ascending in-order walk
    pub fn iter(&self) -> TreeIter<'_> {
        TreeIter {
            tree: self,
            next: self.root.map(|root| self.extreme(root, Dir::Left)),
        }
    }

    /// Verify ordering, coloring, black height and parent links
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        let Some(root) = self.root else {
            return Ok(());
        };
        if self.nodes[root].color != Color::Black {
            return Err("root is red".to_string());
        }
        if self.nodes[root].parent.is_some() {
            return Err("root has a parent".to_string());
        }
        self.black_height(root)?;

        let values: Vec<Value> = self.iter().collect();
        if values.windows(2).any(|w| w[0] > w[1]) {
            return Err(format!("in-order walk not sorted: {:?}", values));
        }
        if values.len() != self.nodes.len() {
            return Err(format!(
                "walk visited {} nodes, arena holds {}",
                values.len(),
                self.nodes.len()
            ));
        }
        Ok(())
    }

    fn black_height(&self, id: NodeId) -> std::result::Result<usize, String> {
        let node = &self.nodes[id];
        let mut heights = [0usize; 2];
        for (slot, child) in [node.left, node.right].into_iter().enumerate() {
            heights[slot] = match child {
                None => 1,
                Some(child) => {
                    if self.nodes[child].parent != Some(id) {
                        return Err(format!("broken parent link below {}", node.value));
                    }
                    if node.color == Color::Red && self.nodes[child].color == Color::Red {
                        return Err(format!("red node {} has a red child", node.value));
                    }
                    self.black_height(child)?
                }
            };
        }
        if heights[0] != heights[1] {
            return Err(format!("black height mismatch under {}", node.value));
        }
        Ok(heights[0] + usize::from(node.color == Color::Black))
    }

    fn free_structurally(&mut self) -> usize {
        let mut released = 0;
        let mut stack: Vec<NodeId> = self.root.take().into_iter().collect();
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.free(id) {
                stack.extend(node.left);
                stack.extend(node.right);
                released += 1;
            }
        }
        released
    }
}

impl Default for TreeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexStore for TreeStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Tree
    }

    fn insert(&mut self, value: Value) -> Result<()> {
        let mut parent = None;
        let mut side = Dir::Left;
        let mut cursor = self.root;
        while let Some(id) = cursor {
            parent = Some(id);
            side = if self.nodes[id].value > value {
                Dir::Left
            } else {
                Dir::Right
            };
            cursor = self.nodes[id].child(side);
        }

        let id = self.nodes.alloc(TreeNode {
            value,
            color: Color::Red,
            parent,
            left: None,
            right: None,
        })?;

        match parent {
            None => self.root = Some(id),
            Some(p) => self.nodes[p].set_child(side, Some(id)),
        }
        self.insert_fixup(id);
        Ok(())
    }

    fn enumerate(&self) -> Vec<Value> {
        self.iter().collect()
    }

    fn destroy_all(&mut self) -> Released {
        let released = match self.teardown {
            TreeTeardown::Structural => self.free_structurally(),
            TreeTeardown::ByPredecessor => {
                let mut released = 0;
                while self.pop_last().is_some() {
                    released += 1;
                }
                released
            }
        };
        self.root = None;
        self.nodes.clear();
        Released::new(released)
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }
}

pub struct TreeIter<'a> {
    tree: &'a TreeStore,
    next: Option<NodeId>,
}

impl Iterator for TreeIter<'_> {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        let id = self.next?;
        self.next = self.tree.step(id, Dir::Right);
        Some(self.tree.nodes[id].value)
    }
}
