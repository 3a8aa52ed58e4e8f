//! Tree builder from parse events.

use kdl_parse::{Event, ParseCallback};
use tracing::trace;

use crate::node::{Document, Entry, Identifier, Node};

/// Builder that constructs a [`Document`] from parse events.
pub struct TreeBuilder<'src> {
    /// Finished nodes for each open document level; the first is the root.
    levels: Vec<Vec<Node<'src>>>,
    /// Nodes whose entries and children are still arriving.
    open: Vec<Node<'src>>,
}

impl<'src> TreeBuilder<'src> {
    pub fn new() -> Self {
        Self {
            levels: vec![Vec::new()],
            open: Vec::new(),
        }
    }

    /// Take the root document.
    pub fn finish(self) -> Document<'src> {
        let nodes = self.levels.into_iter().next().unwrap_or_default();
        Document { nodes }
    }
}

impl Default for TreeBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'src> ParseCallback<'src> for TreeBuilder<'src> {
    fn event(&mut self, event: Event<'src>) {
        match event {
            Event::NodeStart { span, ty, name } => {
                trace!("Building node {:?}", name.value);
                self.open.push(Node {
                    ty: ty.map(Identifier::from),
                    name: name.into(),
                    entries: Vec::new(),
                    children: None,
                    span,
                });
            }
            Event::Entry {
                span,
                ty,
                name,
                value,
            } => {
                if let Some(node) = self.open.last_mut() {
                    node.entries.push(Entry {
                        ty: ty.map(Identifier::from),
                        name: name.map(Identifier::from),
                        value,
                        span,
                    });
                }
            }
            Event::ChildrenStart { .. } => {
                self.levels.push(Vec::new());
            }
            Event::ChildrenEnd { .. } => {
                // The root level is never popped
                if self.levels.len() > 1
                    && let Some(nodes) = self.levels.pop()
                    && let Some(node) = self.open.last_mut()
                {
                    node.children = Some(Document { nodes });
                }
            }
            Event::NodeEnd { span } => {
                if let Some(mut node) = self.open.pop() {
                    node.span = span;
                    if let Some(level) = self.levels.last_mut() {
                        level.push(node);
                    }
                }
            }
        }
    }
}
