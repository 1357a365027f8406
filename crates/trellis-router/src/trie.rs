//! Per-method segment trie.

/// One level of the routing trie.
///
/// Every node stands for exactly one path segment. A node carries a
/// pattern only when a registered route ends on it; intermediate nodes
/// (including capture nodes that merely lead somewhere) carry none.
#[derive(Debug, Clone, Default)]
pub struct Node {
    part: String,
    children: Vec<Node>,
    is_wild: bool,
    pattern: Option<String>,
}

impl Node {
    /// Create a root node. The root matches zero segments.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    fn new(part: &str) -> Self {
        Self {
            part: part.to_owned(),
            children: Vec::new(),
            is_wild: part.starts_with(':') || part.starts_with('*'),
            pattern: None,
        }
    }

    /// The segment text this node matches (literal, `:name` or `*name`).
    #[must_use]
    pub fn part(&self) -> &str {
        &self.part
    }

    /// Whether this node is a `:name` or `*name` capture.
    #[must_use]
    pub fn is_wild(&self) -> bool {
        self.is_wild
    }

    /// The full registered pattern, if a route terminates here.
    #[must_use]
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    /// Children in insertion order.
    #[must_use]
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Insert `parts[depth..]` below this node and record `pattern` on the
    /// node reached after the last part.
    ///
    /// A child is reused only when its segment text is identical to the
    /// part being inserted; `:id` and `:name` at the same level become
    /// separate siblings and are told apart by backtracking in [`search`].
    ///
    /// [`search`]: Node::search
    pub fn insert(&mut self, pattern: &str, parts: &[&str], depth: usize) {
        if depth == parts.len() {
            self.pattern = Some(pattern.to_owned());
            return;
        }

        let part = parts[depth];
        let idx = if let Some(idx) = self.children.iter().position(|c| c.part == part) {
            idx
        } else {
            self.children.push(Self::new(part));
            self.children.len() - 1
        };
        self.children[idx].insert(pattern, parts, depth + 1);
    }

    /// First child that accepts `part`: equal literal text or any capture,
    /// whichever comes first in insertion order.
    #[must_use]
    pub fn match_child(&self, part: &str) -> Option<&Node> {
        self.children
            .iter()
            .find(|child| child.part == part || child.is_wild)
    }

    /// Every child that accepts `part`, in insertion order.
    pub fn match_children<'s, 'p>(&'s self, part: &'p str) -> impl Iterator<Item = &'s Node> {
        self.children
            .iter()
            .filter(move |child| child.is_wild || child.part == part)
    }

    /// Depth-first search for the route terminus matching `parts[depth..]`.
    ///
    /// A `*name` node absorbs everything that remains. The first child
    /// subtree that yields a terminus wins; later siblings are only tried
    /// after an earlier one fails.
    #[must_use]
    pub fn search(&self, parts: &[&str], depth: usize) -> Option<&Node> {
        if depth == parts.len() || self.part.starts_with('*') {
            return self.pattern.is_some().then_some(self);
        }

        self.match_children(parts[depth])
            .find_map(|child| child.search(parts, depth + 1))
    }
}
