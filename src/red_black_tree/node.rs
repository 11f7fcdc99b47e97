use crate::arena::Handle;

/// An enum representing the color of a node in a red-black tree.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Color {
    Red,
    Black,
}

/// An enum representing which child slot a node occupies under its parent.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// A struct representing an internal node of a red-black tree.
///
/// Links are arena handles rather than owning pointers. The key is `None` only for the sentinel
/// leaf, which stands in for every missing child and for the parent of the root.
#[derive(Serialize, Deserialize)]
pub struct Node<T> {
    pub key: Option<T>,
    pub color: Color,
    pub parent: Handle,
    pub left: Handle,
    pub right: Handle,
}

impl<T> Node<T> {
    /// Constructs a new red interior node with every link aimed at the sentinel.
    pub fn new(key: T, nil: Handle) -> Self {
        Node {
            key: Some(key),
            color: Color::Red,
            parent: nil,
            left: nil,
            right: nil,
        }
    }

    /// Constructs the keyless black sentinel. Its links are patched to refer to its own slot once
    /// that slot has been allocated.
    pub fn sentinel() -> Self {
        Node {
            key: None,
            color: Color::Black,
            parent: Handle::default(),
            left: Handle::default(),
            right: Handle::default(),
        }
    }

    pub fn child(&self, side: Side) -> Handle {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub fn set_child(&mut self, side: Side, child: Handle) {
        match side {
            Side::Left => self.left = child,
            Side::Right => self.right = child,
        }
    }
}
