//! Document, node and entry types.

use std::borrow::Cow;
use std::fmt;

use kdl_parse::{Name, Span, Value};

/// A node name, property name or type annotation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier<'src> {
    value: Cow<'src, str>,
    span: Span,
}

impl<'src> Identifier<'src> {
    pub fn new(value: impl Into<Cow<'src, str>>, span: Span) -> Self {
        Self {
            value: value.into(),
            span,
        }
    }

    /// The decoded identifier.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Where the identifier was written, quotes included.
    pub fn span(&self) -> Span {
        self.span
    }

    pub fn into_owned(self) -> Identifier<'static> {
        Identifier {
            value: Cow::Owned(self.value.into_owned()),
            span: self.span,
        }
    }
}

impl<'src> From<Name<'src>> for Identifier<'src> {
    fn from(name: Name<'src>) -> Self {
        Self {
            value: name.value,
            span: name.span,
        }
    }
}

impl AsRef<str> for Identifier<'_> {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Identifier<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl PartialEq<str> for Identifier<'_> {
    fn eq(&self, other: &str) -> bool {
        self.value == other
    }
}

impl PartialEq<&str> for Identifier<'_> {
    fn eq(&self, other: &&str) -> bool {
        self.value == *other
    }
}

/// An argument or a property of a node.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry<'src> {
    pub(crate) ty: Option<Identifier<'src>>,
    pub(crate) name: Option<Identifier<'src>>,
    pub(crate) value: Value<'src>,
    pub(crate) span: Span,
}

impl<'src> Entry<'src> {
    /// Property name, `None` for arguments.
    pub fn name(&self) -> Option<&Identifier<'src>> {
        self.name.as_ref()
    }

    pub fn value(&self) -> &Value<'src> {
        &self.value
    }

    /// Type annotation of the value.
    pub fn ty(&self) -> Option<&Identifier<'src>> {
        self.ty.as_ref()
    }

    pub fn is_property(&self) -> bool {
        self.name.is_some()
    }

    /// Span of the whole entry, type annotation and key included.
    pub fn span(&self) -> Span {
        self.span
    }

    pub fn into_owned(self) -> Entry<'static> {
        Entry {
            ty: self.ty.map(Identifier::into_owned),
            name: self.name.map(Identifier::into_owned),
            value: self.value.into_owned(),
            span: self.span,
        }
    }
}

/// Key for [`Node::get`]: a property name or an argument index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKey<'k> {
    /// First property with this name.
    Prop(&'k str),
    /// Zero-based index among the arguments only.
    Arg(usize),
}

impl<'k> From<&'k str> for NodeKey<'k> {
    fn from(name: &'k str) -> Self {
        NodeKey::Prop(name)
    }
}

impl From<usize> for NodeKey<'_> {
    fn from(index: usize) -> Self {
        NodeKey::Arg(index)
    }
}

/// A node: a name, optional type, entries and optional children.
#[derive(Debug, Clone, PartialEq)]
pub struct Node<'src> {
    pub(crate) ty: Option<Identifier<'src>>,
    pub(crate) name: Identifier<'src>,
    pub(crate) entries: Vec<Entry<'src>>,
    pub(crate) children: Option<Document<'src>>,
    pub(crate) span: Span,
}

impl<'src> Node<'src> {
    pub fn name(&self) -> &Identifier<'src> {
        &self.name
    }

    /// Type annotation of the node.
    pub fn ty(&self) -> Option<&Identifier<'src>> {
        self.ty.as_ref()
    }

    /// Arguments and properties in source order.
    pub fn entries(&self) -> &[Entry<'src>] {
        &self.entries
    }

    /// Look up a property by name or an argument by index.
    pub fn get<'k>(&self, key: impl Into<NodeKey<'k>>) -> Option<&Entry<'src>> {
        match key.into() {
            NodeKey::Prop(name) => self
                .props()
                .find(|entry| entry.name().is_some_and(|n| n.value() == name)),
            NodeKey::Arg(index) => self.args().nth(index),
        }
    }

    /// The first property called `name`.
    pub fn get_prop(&self, name: &str) -> Option<&Entry<'src>> {
        self.get(name)
    }

    /// The argument at `index`, counting arguments only.
    pub fn get_arg(&self, index: usize) -> Option<&Entry<'src>> {
        self.get(index)
    }

    pub fn args(&self) -> impl Iterator<Item = &Entry<'src>> {
        self.entries.iter().filter(|entry| !entry.is_property())
    }

    pub fn props(&self) -> impl Iterator<Item = &Entry<'src>> {
        self.entries.iter().filter(|entry| entry.is_property())
    }

    /// The children block. `Some` (possibly empty) when braces were written.
    pub fn children(&self) -> Option<&Document<'src>> {
        self.children.as_ref()
    }

    /// Span of the whole node, terminator excluded.
    pub fn span(&self) -> Span {
        self.span
    }

    pub fn into_owned(self) -> Node<'static> {
        Node {
            ty: self.ty.map(Identifier::into_owned),
            name: self.name.into_owned(),
            entries: self.entries.into_iter().map(Entry::into_owned).collect(),
            children: self.children.map(Document::into_owned),
            span: self.span,
        }
    }
}

/// A parsed KDL document: an ordered list of nodes.
///
/// The document owns every node beneath it. String data borrows from the
/// parsed source where no decoding was needed; [`Document::into_owned`]
/// detaches it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document<'src> {
    pub(crate) nodes: Vec<Node<'src>>,
}

impl<'src> Document<'src> {
    /// Parse a document from a string.
    pub fn parse(source: &'src str) -> Result<Self, crate::Error<'src>> {
        crate::parse_str(source, kdl_parse::ParseOptions::default())
    }

    /// Top-level nodes in source order.
    pub fn nodes(&self) -> &[Node<'src>] {
        &self.nodes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node<'src>> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The first node called `name`.
    pub fn get(&self, name: &str) -> Option<&Node<'src>> {
        self.nodes.iter().find(|node| node.name.value() == name)
    }

    /// The first argument of the first node called `name`.
    pub fn get_arg(&self, name: &str) -> Option<&Value<'src>> {
        self.get(name)?.get_arg(0).map(Entry::value)
    }

    /// All arguments of the first node called `name`.
    pub fn get_args(&self, name: &str) -> Vec<&Value<'src>> {
        self.get(name)
            .map(|node| node.args().map(Entry::value).collect())
            .unwrap_or_default()
    }

    pub fn into_owned(self) -> Document<'static> {
        Document {
            nodes: self.nodes.into_iter().map(Node::into_owned).collect(),
        }
    }
}

impl<'a, 'src> IntoIterator for &'a Document<'src> {
    type Item = &'a Node<'src>;
    type IntoIter = std::slice::Iter<'a, Node<'src>>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}
