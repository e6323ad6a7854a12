//! Arena-allocated AST.
//!
//! Nodes live in an [`AstTree`] owned by their document and refer to each
//! other by [`NodeId`]. Containment is stored in feature values; the
//! container back-link on each node is a plain id filled in when the tree is
//! finished, so there are no ownership cycles.
//!
//! Cross-references are [`Reference`]s in the tree's reference table. The
//! table only records what was parsed (text, range, expected type); the
//! resolution state is kept by the linker next to the document.

use smol_str::SmolStr;
use text_size::{TextRange, TextSize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReferenceId(pub u32);

impl ReferenceId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A feature value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    String(SmolStr),
    Int(i64),
    Bool(bool),
    Node(NodeId),
    Reference(ReferenceId),
    List(Vec<Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Value::Node(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<ReferenceId> {
        match self {
            Value::Reference(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(values) => Some(values),
            _ => None,
        }
    }
}

/// Where a node or reference sits in its container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerLink {
    pub node: NodeId,
    pub feature: SmolStr,
    /// Position inside a list feature.
    pub index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AstNode {
    pub type_name: SmolStr,
    pub container: Option<ContainerLink>,
    pub range: TextRange,
    features: Vec<(SmolStr, Value)>,
    feature_ranges: Vec<(SmolStr, TextRange)>,
}

impl AstNode {
    pub fn feature(&self, name: &str) -> Option<&Value> {
        self.features
            .iter()
            .find(|(feature, _)| feature == name)
            .map(|(_, value)| value)
    }

    /// Features in assignment order.
    pub fn features(&self) -> impl Iterator<Item = (&SmolStr, &Value)> {
        self.features.iter().map(|(name, value)| (name, value))
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        self.feature(name).and_then(Value::as_str)
    }

    /// A `?=` flag; absent flags are `false`.
    pub fn flag(&self, name: &str) -> bool {
        matches!(self.feature(name), Some(Value::Bool(true)))
    }

    /// Source range of the value assigned to `name`. For `+=` features this is
    /// the first element.
    pub fn feature_range(&self, name: &str) -> Option<TextRange> {
        self.feature_ranges
            .iter()
            .find(|(feature, _)| feature == name)
            .map(|(_, range)| *range)
    }
}

/// A parsed cross-reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub ref_text: SmolStr,
    /// Range of the reference text, qualifier included.
    pub range: TextRange,
    /// Type the target must be an instance of.
    pub target_type: SmolStr,
    pub container: ContainerLink,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AstTree {
    nodes: Vec<AstNode>,
    references: Vec<Reference>,
    root: NodeId,
}

impl AstTree {
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Node by id. Ids are handed out by this tree.
    pub fn node(&self, id: NodeId) -> &AstNode {
        &self.nodes[id.index()]
    }

    pub fn get(&self, id: NodeId) -> Option<&AstNode> {
        self.nodes.get(id.index())
    }

    /// References in document order.
    pub fn references(&self) -> impl Iterator<Item = (ReferenceId, &Reference)> {
        self.references
            .iter()
            .enumerate()
            .map(|(idx, reference)| (ReferenceId(idx as u32), reference))
    }

    pub fn reference(&self, id: ReferenceId) -> &Reference {
        &self.references[id.index()]
    }

    pub fn reference_count(&self) -> usize {
        self.references.len()
    }

    /// Child nodes in feature order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let mut children = Vec::new();
        for (_, value) in self.node(id).features() {
            collect_nodes(value, &mut children);
        }
        children
    }

    /// `id` and every node below it, pre-order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            let mut children = self.children(current);
            children.reverse();
            stack.extend(children);
        }
        out
    }

    /// Containers of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.node(id).container.as_ref().map(|c| c.node), move |node| {
            self.node(*node).container.as_ref().map(|c| c.node)
        })
    }

    /// Deepest node whose range contains `offset`.
    pub fn node_at_offset(&self, offset: TextSize) -> Option<NodeId> {
        let mut current = self.root;
        if !self.node(current).range.contains_inclusive(offset) {
            return None;
        }
        'descend: loop {
            for child in self.children(current) {
                if self.node(child).range.contains_inclusive(offset) {
                    current = child;
                    continue 'descend;
                }
            }
            return Some(current);
        }
    }

    /// References whose container is `id` or one of its descendants.
    pub fn references_below(&self, id: NodeId) -> Vec<ReferenceId> {
        let below: rustc_hash::FxHashSet<NodeId> = self.descendants(id).into_iter().collect();
        self.references()
            .filter(|(_, reference)| below.contains(&reference.container.node))
            .map(|(id, _)| id)
            .collect()
    }
}

fn collect_nodes(value: &Value, out: &mut Vec<NodeId>) {
    match value {
        Value::Node(id) => out.push(*id),
        Value::List(values) => {
            for value in values {
                collect_nodes(value, out);
            }
        }
        Value::String(_) | Value::Int(_) | Value::Bool(_) | Value::Reference(_) => {}
    }
}

// ============================================================================
// CONSTRUCTION
// ============================================================================

/// Reference text recorded by the parser, attached to a node on finish.
#[derive(Debug, Clone)]
pub(crate) struct PendingReference {
    pub ref_text: SmolStr,
    pub range: TextRange,
    pub target_type: SmolStr,
}

/// A node under construction.
#[derive(Debug, Clone, Default)]
pub(crate) struct NodeData {
    pub type_name: SmolStr,
    pub features: Vec<(SmolStr, Value)>,
    pub feature_ranges: Vec<(SmolStr, TextRange)>,
}

impl NodeData {
    pub fn new(type_name: SmolStr) -> Self {
        Self {
            type_name,
            ..Self::default()
        }
    }

    /// `feature=value`: replaces an earlier value.
    pub fn set(&mut self, feature: &SmolStr, value: Value) {
        match self.features.iter_mut().find(|(name, _)| name == feature) {
            Some((_, slot)) => *slot = value,
            None => self.features.push((feature.clone(), value)),
        }
    }

    /// `feature+=value`
    pub fn append(&mut self, feature: &SmolStr, value: Value) {
        match self.features.iter_mut().find(|(name, _)| name == feature) {
            Some((_, Value::List(values))) => values.push(value),
            Some((_, slot)) => {
                let previous = std::mem::replace(slot, Value::Bool(false));
                *slot = Value::List(vec![previous, value]);
            }
            None => self.features.push((feature.clone(), Value::List(vec![value]))),
        }
    }

    /// Keeps the first range recorded for `feature`.
    pub fn record_range(&mut self, feature: &SmolStr, range: TextRange) {
        if !self.feature_ranges.iter().any(|(name, _)| name == feature) {
            self.feature_ranges.push((feature.clone(), range));
        }
    }

    /// Range of a value that replaced an earlier one under `feature=`.
    pub fn replace_range(&mut self, feature: &SmolStr, range: TextRange) {
        match self.feature_ranges.iter_mut().find(|(name, _)| name == feature) {
            Some((_, slot)) => *slot = range,
            None => self.feature_ranges.push((feature.clone(), range)),
        }
    }

    /// Copy `other`'s features over, keeping values already present.
    pub fn merge_from(&mut self, other: NodeData) {
        for (feature, value) in other.features {
            if !self.features.iter().any(|(name, _)| *name == feature) {
                self.features.push((feature, value));
            }
        }
        for (feature, range) in other.feature_ranges {
            self.record_range(&feature, range);
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct AstTreeBuilder {
    nodes: Vec<AstNode>,
    pending: Vec<PendingReference>,
}

impl AstTreeBuilder {
    pub fn alloc(&mut self, data: NodeData, range: TextRange) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(AstNode {
            type_name: data.type_name,
            container: None,
            range,
            features: data.features,
            feature_ranges: data.feature_ranges,
        });
        id
    }

    pub fn reference(&mut self, pending: PendingReference) -> ReferenceId {
        let id = ReferenceId(self.pending.len() as u32);
        self.pending.push(pending);
        id
    }

    /// Fill in container links and number references in document order.
    ///
    /// References that never ended up in a node reachable from `root` are
    /// dropped.
    pub fn finish(mut self, root: NodeId) -> AstTree {
        let mut references = Vec::new();
        let mut stack = vec![root];
        while let Some(parent) = stack.pop() {
            let mut features = std::mem::take(&mut self.nodes[parent.index()].features);
            let mut children = Vec::new();
            for (feature, value) in features.iter_mut() {
                match value {
                    Value::List(values) => {
                        for (idx, item) in values.iter_mut().enumerate() {
                            let index = Some(idx);
                            self.link(parent, feature, index, item, &mut references, &mut children);
                        }
                    }
                    other => {
                        self.link(parent, feature, None, other, &mut references, &mut children)
                    }
                }
            }
            self.nodes[parent.index()].features = features;
            children.reverse();
            stack.extend(children);
        }
        AstTree {
            nodes: self.nodes,
            references,
            root,
        }
    }

    fn link(
        &mut self,
        parent: NodeId,
        feature: &SmolStr,
        index: Option<usize>,
        value: &mut Value,
        references: &mut Vec<Reference>,
        children: &mut Vec<NodeId>,
    ) {
        let container = ContainerLink {
            node: parent,
            feature: feature.clone(),
            index,
        };
        match value {
            Value::Node(child) => {
                self.nodes[child.index()].container = Some(container);
                children.push(*child);
            }
            Value::Reference(id) => {
                let pending = &self.pending[id.index()];
                let new_id = ReferenceId(references.len() as u32);
                references.push(Reference {
                    ref_text: pending.ref_text.clone(),
                    range: pending.range,
                    target_type: pending.target_type.clone(),
                    container,
                });
                *id = new_id;
            }
            Value::List(values) => {
                for item in values.iter_mut() {
                    self.link(parent, feature, index, item, references, children);
                }
            }
            Value::String(_) | Value::Int(_) | Value::Bool(_) => {}
        }
    }
}
