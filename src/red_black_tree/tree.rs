use crate::arena::{Arena, Handle};
use crate::red_black_tree::node::{Color, Node, Side};
use crate::red_black_tree::RootDeletionError;
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::mem;

/// A stable reference to a node owned by a `RedBlackTree<T>`.
///
/// A `NodeRef` stays valid until the node it refers to is removed from the tree. It is only
/// meaningful for the tree that produced it.
pub type NodeRef = Handle;

const DEFAULT_CHUNK_SIZE: usize = 1024;

/// An ordered-key container implemented as a red-black tree over an arena of nodes.
///
/// The tree holds at least one key at all times; it is constructed from its first key and refuses
/// to remove the last one. Every missing child is the tree's single sentinel leaf, a keyless black
/// node allocated once at construction whose color is never changed, so the rebalancing code walks
/// and recolors nodes without special-casing absent children. Duplicate keys are rejected rather
/// than replaced.
///
/// All operations run to completion on the calling thread; mutation requires `&mut self`, and
/// sharing a tree across threads for concurrent mutation requires an external lock. Each tree owns
/// its arena and its sentinel, so nodes and handles must never be mixed between trees.
///
/// # Examples
///
/// ```
/// use arena_rbtree::red_black_tree::RedBlackTree;
///
/// let mut tree = RedBlackTree::new(3);
/// tree.insert(1);
/// tree.insert(5);
///
/// assert_eq!(tree.len(), 3);
/// assert_eq!(tree.get(tree.min()), Some(&1));
/// assert_eq!(tree.get(tree.max()), Some(&5));
///
/// assert_eq!(tree.remove(&1), Ok(Some(1)));
/// assert!(!tree.contains(&1));
/// ```
#[derive(Serialize, Deserialize)]
pub struct RedBlackTree<T> {
    arena: Arena<Node<T>>,
    nil: Handle,
    root: Handle,
    len: usize,
}

impl<T> RedBlackTree<T> {
    /// Constructs a new `RedBlackTree<T>` holding exactly one key, which becomes the black root.
    ///
    /// # Examples
    ///
    /// ```
    /// use arena_rbtree::red_black_tree::RedBlackTree;
    ///
    /// let tree = RedBlackTree::new(1);
    /// assert_eq!(tree.len(), 1);
    /// assert!(tree.contains(&1));
    /// ```
    pub fn new(key: T) -> Self {
        let mut arena = Arena::new(DEFAULT_CHUNK_SIZE);
        let nil = arena.allocate(Node::sentinel());
        arena[nil].parent = nil;
        arena[nil].left = nil;
        arena[nil].right = nil;
        let root = arena.allocate(Node::new(key, nil));
        arena[root].color = Color::Black;
        RedBlackTree {
            arena,
            nil,
            root,
            len: 1,
        }
    }

    /// Returns a handle to the current root node. The root may change across insertions and
    /// removals.
    ///
    /// # Examples
    ///
    /// ```
    /// use arena_rbtree::red_black_tree::RedBlackTree;
    ///
    /// let tree = RedBlackTree::new(1);
    /// assert_eq!(tree.get(tree.root()), Some(&1));
    /// ```
    pub fn root(&self) -> NodeRef {
        self.root
    }

    /// Returns the number of keys in the tree. Always at least one.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns a reference to the key of a node, or `None` if the handle refers to the sentinel
    /// or to a slot no longer occupied by a node of this tree.
    ///
    /// # Examples
    ///
    /// ```
    /// use arena_rbtree::red_black_tree::RedBlackTree;
    ///
    /// let tree = RedBlackTree::new(1);
    /// let node = tree.lookup(&1).unwrap();
    /// assert_eq!(tree.get(node), Some(&1));
    /// ```
    pub fn get(&self, node: NodeRef) -> Option<&T> {
        self.arena.get(&node).and_then(|node| node.key.as_ref())
    }

    fn key(&self, node: Handle) -> &T {
        self.arena[node]
            .key
            .as_ref()
            .expect("Expected a non-sentinel node.")
    }

    fn color(&self, node: Handle) -> Color {
        self.arena[node].color
    }

    fn child(&self, node: Handle, side: Side) -> Handle {
        self.arena[node].child(side)
    }

    fn set_child(&mut self, node: Handle, side: Side, child: Handle) {
        self.arena[node].set_child(side, child);
    }

    fn side_of(&self, node: Handle) -> Side {
        let parent = self.arena[node].parent;
        if self.arena[parent].left == node {
            Side::Left
        } else {
            Side::Right
        }
    }

    /// Descends from the root and returns either the node holding `key` or the node to which a
    /// new node holding `key` would be attached.
    fn find<V>(&self, key: &V) -> Handle
    where
        T: Borrow<V>,
        V: Ord + ?Sized,
    {
        let mut curr = self.root;
        loop {
            let next = match key.cmp(self.key(curr).borrow()) {
                Ordering::Less => self.arena[curr].left,
                Ordering::Greater => self.arena[curr].right,
                Ordering::Equal => return curr,
            };
            if next == self.nil {
                return curr;
            }
            curr = next;
        }
    }

    /// Returns a handle to the node holding `key`, or `None` if the key is absent.
    ///
    /// # Examples
    ///
    /// ```
    /// use arena_rbtree::red_black_tree::RedBlackTree;
    ///
    /// let mut tree = RedBlackTree::new(1);
    /// tree.insert(3);
    /// assert!(tree.lookup(&3).is_some());
    /// assert!(tree.lookup(&2).is_none());
    /// ```
    pub fn lookup<V>(&self, key: &V) -> Option<NodeRef>
    where
        T: Borrow<V>,
        V: Ord + ?Sized,
    {
        let node = self.find(key);
        if self.key(node).borrow() == key {
            Some(node)
        } else {
            None
        }
    }

    /// Checks if a key exists in the tree.
    ///
    /// # Examples
    ///
    /// ```
    /// use arena_rbtree::red_black_tree::RedBlackTree;
    ///
    /// let mut tree = RedBlackTree::new(1);
    /// assert!(tree.contains(&1));
    /// assert!(!tree.contains(&0));
    /// ```
    pub fn contains<V>(&self, key: &V) -> bool
    where
        T: Borrow<V>,
        V: Ord + ?Sized,
    {
        self.lookup(key).is_some()
    }

    /// Inserts a key into the tree and returns a handle to the possibly changed root. If the key
    /// already exists in the tree, the insertion is a no-op.
    ///
    /// # Examples
    ///
    /// ```
    /// use arena_rbtree::red_black_tree::RedBlackTree;
    ///
    /// let mut tree = RedBlackTree::new(1);
    /// let root = tree.insert(3);
    /// assert_eq!(root, tree.root());
    /// assert!(tree.contains(&3));
    ///
    /// tree.insert(3);
    /// assert_eq!(tree.len(), 2);
    /// ```
    pub fn insert(&mut self, key: T) -> NodeRef
    where
        T: Ord,
    {
        let target = self.find(&key);
        let ordering = key.cmp(self.key(target));
        if ordering == Ordering::Equal {
            return self.root;
        }
        let nil = self.nil;
        let node = self.arena.allocate(Node::new(key, nil));
        self.arena[node].parent = target;
        if ordering == Ordering::Less {
            self.arena[target].left = node;
        } else {
            self.arena[target].right = node;
        }
        self.len += 1;
        self.insert_fixup(node);
        self.root
    }

    /// Restores the red-black invariants after linking a red node. Runs bottom-up as an iterative
    /// loop; the sentinel parent of the root is black, which bounds the loop.
    fn insert_fixup(&mut self, mut node: Handle) {
        while self.color(self.arena[node].parent) == Color::Red {
            let mut parent = self.arena[node].parent;
            let grandparent = self.arena[parent].parent;
            let side = self.side_of(parent);
            let uncle = self.child(grandparent, side.opposite());
            if self.color(uncle) == Color::Red {
                self.arena[parent].color = Color::Black;
                self.arena[uncle].color = Color::Black;
                self.arena[grandparent].color = Color::Red;
                node = grandparent;
            } else {
                if self.side_of(node) != side {
                    // inner grandchild: straighten the zig-zag first
                    node = parent;
                    self.rotate(node, side);
                    parent = self.arena[node].parent;
                }
                self.arena[parent].color = Color::Black;
                self.arena[grandparent].color = Color::Red;
                self.rotate(grandparent, side.opposite());
            }
        }
        // a recoloring may have bubbled up to the root
        let root = self.root;
        self.arena[root].color = Color::Black;
    }

    /// Removes a key from the tree. Returns `Ok(Some(key))` on success, `Ok(None)` if the key was
    /// absent, and `Err(RootDeletionError)` if the removal would empty the tree.
    ///
    /// # Examples
    ///
    /// ```
    /// use arena_rbtree::red_black_tree::{RedBlackTree, RootDeletionError};
    ///
    /// let mut tree = RedBlackTree::new(1);
    /// tree.insert(3);
    ///
    /// assert_eq!(tree.remove(&3), Ok(Some(3)));
    /// assert_eq!(tree.remove(&3), Ok(None));
    /// assert_eq!(tree.remove(&1), Err(RootDeletionError));
    /// ```
    pub fn remove<V>(&mut self, key: &V) -> Result<Option<T>, RootDeletionError>
    where
        T: Borrow<V>,
        V: Ord + ?Sized,
    {
        let node = match self.lookup(key) {
            Some(node) => node,
            None => return Ok(None),
        };
        if self.len == 1 {
            return Err(RootDeletionError);
        }
        Ok(Some(self.remove_node(node)))
    }

    fn remove_node(&mut self, node: Handle) -> T {
        let target = if self.arena[node].left != self.nil && self.arena[node].right != self.nil {
            // two children: swap keys with the in-order successor and unlink the successor
            // instead, which has at most one child
            let successor = self.subtree_min(self.arena[node].right);
            let key = self.arena[successor].key.take();
            let key = mem::replace(&mut self.arena[node].key, key);
            self.arena[successor].key = key;
            successor
        } else {
            node
        };

        let replacer = if self.arena[target].left == self.nil {
            self.arena[target].right
        } else {
            self.arena[target].left
        };
        self.transplant(target, replacer);
        if self.color(target) == Color::Black {
            // unlinking a black node shrinks the black-height on this path
            self.remove_fixup(replacer);
        }
        self.len -= 1;
        let removed = self.arena.free(&target);
        removed.key.expect("Expected a non-sentinel node.")
    }

    /// Rewrites `old`'s parent's child link to point at `new`, or marks `new` as the root if
    /// `old` was the root. `new.parent` is set even when `new` is the sentinel so that removal
    /// fixup can walk upward through it.
    fn transplant(&mut self, old: Handle, new: Handle) {
        let parent = self.arena[old].parent;
        if parent == self.nil {
            self.root = new;
        } else if self.arena[parent].left == old {
            self.arena[parent].left = new;
        } else {
            self.arena[parent].right = new;
        }
        self.arena[new].parent = parent;
    }

    /// Restores the red-black invariants after unlinking a black node, starting from the node
    /// that took its place and carrying the missing black upward until it can be absorbed.
    fn remove_fixup(&mut self, mut node: Handle) {
        while node != self.root && self.color(node) == Color::Black {
            let parent = self.arena[node].parent;
            let side = self.side_of(node);
            let mut sibling = self.child(parent, side.opposite());
            if self.color(sibling) == Color::Red {
                self.arena[sibling].color = Color::Black;
                self.arena[parent].color = Color::Red;
                self.rotate(parent, side);
                sibling = self.child(parent, side.opposite());
            }
            let near = self.child(sibling, side);
            let far = self.child(sibling, side.opposite());
            if self.color(near) == Color::Black && self.color(far) == Color::Black {
                // the defect propagates upward
                self.arena[sibling].color = Color::Red;
                node = parent;
            } else {
                if self.color(far) == Color::Black {
                    self.arena[near].color = Color::Black;
                    self.arena[sibling].color = Color::Red;
                    self.rotate(sibling, side.opposite());
                    sibling = self.child(parent, side.opposite());
                }
                self.arena[sibling].color = self.color(parent);
                self.arena[parent].color = Color::Black;
                let far = self.child(sibling, side.opposite());
                self.arena[far].color = Color::Black;
                self.rotate(parent, side);
                node = self.root;
            }
        }
        self.arena[node].color = Color::Black;
    }

    /// Rotates the subtree rooted at `pivot` toward `side`, pulling up the child on the opposite
    /// side. Both directions of every reassigned link are updated, sentinel included, and the
    /// cached root is updated when the pivot was the root. Returns the new local subtree root.
    fn rotate(&mut self, pivot: Handle, toward: Side) -> Handle {
        let away = toward.opposite();
        let child = self.child(pivot, away);
        let grandchild = self.child(child, toward);
        self.set_child(pivot, away, grandchild);
        self.arena[grandchild].parent = pivot;
        let parent = self.arena[pivot].parent;
        self.arena[child].parent = parent;
        if parent == self.nil {
            self.root = child;
        } else {
            let side = if self.arena[parent].left == pivot {
                Side::Left
            } else {
                Side::Right
            };
            self.set_child(parent, side, child);
        }
        self.set_child(child, toward, pivot);
        self.arena[pivot].parent = child;
        child
    }

    fn subtree_min(&self, mut node: Handle) -> Handle {
        while self.arena[node].left != self.nil {
            node = self.arena[node].left;
        }
        node
    }

    fn subtree_max(&self, mut node: Handle) -> Handle {
        while self.arena[node].right != self.nil {
            node = self.arena[node].right;
        }
        node
    }

    /// Returns a handle to the node holding the minimum key.
    ///
    /// # Examples
    ///
    /// ```
    /// use arena_rbtree::red_black_tree::RedBlackTree;
    ///
    /// let mut tree = RedBlackTree::new(3);
    /// tree.insert(1);
    /// assert_eq!(tree.get(tree.min()), Some(&1));
    /// ```
    pub fn min(&self) -> NodeRef {
        self.subtree_min(self.root)
    }

    /// Returns a handle to the node holding the maximum key.
    ///
    /// # Examples
    ///
    /// ```
    /// use arena_rbtree::red_black_tree::RedBlackTree;
    ///
    /// let mut tree = RedBlackTree::new(3);
    /// tree.insert(5);
    /// assert_eq!(tree.get(tree.max()), Some(&5));
    /// ```
    pub fn max(&self) -> NodeRef {
        self.subtree_max(self.root)
    }

    /// Returns the minimum of a node's right subtree, or `None` if that subtree is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use arena_rbtree::red_black_tree::RedBlackTree;
    ///
    /// let mut tree = RedBlackTree::new(3);
    /// tree.insert(1);
    /// tree.insert(5);
    ///
    /// let root = tree.root();
    /// assert_eq!(tree.successor(root).and_then(|node| tree.get(node)), Some(&5));
    /// ```
    pub fn successor(&self, node: NodeRef) -> Option<NodeRef> {
        let right = self.arena[node].right;
        if right == self.nil {
            None
        } else {
            Some(self.subtree_min(right))
        }
    }

    /// Returns the maximum of a node's left subtree, or `None` if that subtree is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use arena_rbtree::red_black_tree::RedBlackTree;
    ///
    /// let mut tree = RedBlackTree::new(3);
    /// tree.insert(1);
    /// tree.insert(5);
    ///
    /// let root = tree.root();
    /// assert_eq!(tree.predecessor(root).and_then(|node| tree.get(node)), Some(&1));
    /// ```
    pub fn predecessor(&self, node: NodeRef) -> Option<NodeRef> {
        let left = self.arena[node].left;
        if left == self.nil {
            None
        } else {
            Some(self.subtree_max(left))
        }
    }

    fn subtree_height(&self, node: Handle) -> usize {
        if node == self.nil {
            0
        } else {
            let left = self.subtree_height(self.arena[node].left);
            let right = self.subtree_height(self.arena[node].right);
            1 + std::cmp::max(left, right)
        }
    }

    /// Returns the height of the tree: the number of nodes on the longest path from the root down
    /// to a leaf. Bounded by `2 * log2(len + 1)`.
    ///
    /// # Examples
    ///
    /// ```
    /// use arena_rbtree::red_black_tree::RedBlackTree;
    ///
    /// let mut tree = RedBlackTree::new(2);
    /// assert_eq!(tree.height(), 1);
    ///
    /// tree.insert(1);
    /// tree.insert(3);
    /// assert_eq!(tree.height(), 2);
    /// ```
    pub fn height(&self) -> usize {
        self.subtree_height(self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::super::node::Color;
    use super::super::RootDeletionError;
    use super::{Handle, RedBlackTree};
    use rand::Rng;

    // Checks BST order, parent-link coherence, the red-red prohibition, and a uniform
    // black-height, returning the black-height of the subtree.
    fn check_subtree<T>(tree: &RedBlackTree<T>, node: Handle) -> usize
    where
        T: Ord,
    {
        if node == tree.nil {
            return 1;
        }
        let left = tree.arena[node].left;
        let right = tree.arena[node].right;
        if tree.arena[node].color == Color::Red {
            assert_eq!(tree.arena[left].color, Color::Black);
            assert_eq!(tree.arena[right].color, Color::Black);
        }
        if left != tree.nil {
            assert!(tree.key(left) < tree.key(node));
            assert_eq!(tree.arena[left].parent, node);
        }
        if right != tree.nil {
            assert!(tree.key(right) > tree.key(node));
            assert_eq!(tree.arena[right].parent, node);
        }
        let left_height = check_subtree(tree, left);
        let right_height = check_subtree(tree, right);
        assert_eq!(left_height, right_height);
        match tree.arena[node].color {
            Color::Black => left_height + 1,
            Color::Red => left_height,
        }
    }

    fn check_invariants<T>(tree: &RedBlackTree<T>)
    where
        T: Ord,
    {
        assert_eq!(tree.arena[tree.root].color, Color::Black);
        assert_eq!(tree.arena[tree.nil].color, Color::Black);
        assert!(tree.arena[tree.nil].key.is_none());
        assert_eq!(tree.arena[tree.root].parent, tree.nil);
        check_subtree(tree, tree.root);
    }

    #[test]
    fn test_new() {
        let tree = RedBlackTree::new(1);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.get(tree.root()), Some(&1));
        assert_eq!(tree.min(), tree.root());
        assert_eq!(tree.max(), tree.root());
        assert_eq!(tree.height(), 1);
        check_invariants(&tree);
    }

    #[test]
    fn test_insert_lookup() {
        let mut tree = RedBlackTree::new(1);
        tree.insert(3);
        tree.insert(2);
        let node = tree.lookup(&2).unwrap();
        assert_eq!(tree.get(node), Some(&2));
        assert!(tree.lookup(&4).is_none());
        check_invariants(&tree);
    }

    #[test]
    fn test_insert_duplicate() {
        let mut tree = RedBlackTree::new(1);
        tree.insert(3);
        tree.insert(3);
        assert_eq!(tree.len(), 2);
        assert!(tree.contains(&3));
        check_invariants(&tree);
    }

    #[test]
    fn test_insert_returns_root() {
        let mut tree = RedBlackTree::new(1);
        for key in 2..10 {
            let root = tree.insert(key);
            assert_eq!(root, tree.root());
        }
        check_invariants(&tree);
    }

    #[test]
    fn test_remove() {
        let mut tree = RedBlackTree::new(1);
        tree.insert(3);
        assert_eq!(tree.remove(&3), Ok(Some(3)));
        assert!(!tree.contains(&3));
        assert_eq!(tree.len(), 1);
        check_invariants(&tree);
    }

    #[test]
    fn test_remove_absent() {
        let mut tree = RedBlackTree::new(1);
        assert_eq!(tree.remove(&3), Ok(None));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_remove_last() {
        let mut tree = RedBlackTree::new(1);
        assert_eq!(tree.remove(&1), Err(RootDeletionError));
        assert!(tree.contains(&1));
        assert_eq!(tree.len(), 1);
        check_invariants(&tree);
    }

    #[test]
    fn test_remove_node_with_two_children() {
        let mut tree = RedBlackTree::new(4);
        for key in [2, 6, 1, 3, 5, 7].iter() {
            tree.insert(*key);
        }
        assert_eq!(tree.remove(&4), Ok(Some(4)));
        for key in [1, 2, 3, 5, 6, 7].iter() {
            assert!(tree.contains(key));
        }
        check_invariants(&tree);
    }

    #[test]
    fn test_min_max() {
        let mut tree = RedBlackTree::new(3);
        tree.insert(1);
        tree.insert(5);
        assert_eq!(tree.get(tree.min()), Some(&1));
        assert_eq!(tree.get(tree.max()), Some(&5));
    }

    #[test]
    fn test_successor_predecessor() {
        let mut tree = RedBlackTree::new(3);
        tree.insert(1);
        tree.insert(5);
        tree.insert(4);

        let root = tree.root();
        let successor = tree.successor(root).unwrap();
        assert_eq!(tree.get(successor), Some(&4));
        let predecessor = tree.predecessor(root).unwrap();
        assert_eq!(tree.get(predecessor), Some(&1));

        let min = tree.min();
        assert_eq!(tree.predecessor(min), None);
        let max = tree.max();
        assert_eq!(tree.successor(max), None);
    }

    #[test]
    fn test_borrowed_key_lookup() {
        let mut tree = RedBlackTree::new(String::from("b"));
        tree.insert(String::from("a"));
        assert!(tree.contains("a"));
        assert_eq!(tree.remove("a"), Ok(Some(String::from("a"))));
        assert!(!tree.contains("a"));
    }

    #[test]
    fn test_invariants_random_mutations() {
        let mut rng = rand::thread_rng();
        let mut tree = RedBlackTree::new(u32::max_value());
        let mut keys = Vec::new();
        for _ in 0..1000 {
            let key = rng.gen::<u32>() % 500;
            if !tree.contains(&key) {
                keys.push(key);
            }
            tree.insert(key);
            check_invariants(&tree);
        }
        for key in keys {
            assert_eq!(tree.remove(&key), Ok(Some(key)));
            check_invariants(&tree);
        }
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_slot_reuse_after_remove() {
        let mut tree = RedBlackTree::new(0);
        for key in 1..100 {
            tree.insert(key);
        }
        for key in 1..100 {
            assert_eq!(tree.remove(&key), Ok(Some(key)));
        }
        for key in 1..100 {
            tree.insert(key);
        }
        assert_eq!(tree.arena.len(), 101);
        check_invariants(&tree);
    }
}
