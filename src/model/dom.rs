use std::collections::HashMap;

use ego_tree::{NodeId, NodeRef};
use indexmap::IndexMap;
use scraper::node::Text;
use scraper::{ElementRef, Html, Node};

use crate::model::page::{
    MutationKind, MutationRecord, MutationSource, NodeType, ObserveOptions, Page, SubscribeError,
    SubscriptionId,
};
use crate::parse::Selector;

#[derive(Debug, Clone)]
struct Observer {
    id: SubscriptionId,
    target: NodeId,
    options: ObserveOptions,
}

/// Records queued for one subscription since the last delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subscription: SubscriptionId,
    pub records: Vec<MutationRecord<NodeId>>,
}

/// An in-memory page: parsed HTML with `MutationObserver`-style change queues.
///
/// Structure lives in the `scraper` tree. Inline styles are kept beside it,
/// keyed by node, the way a browser keeps them in the CSSOM; `style`
/// attributes in the parsed markup seed them.
///
/// Mutations are queued per subscription and handed out by
/// [`take_notifications`](Document::take_notifications), which plays the role
/// of the browser's microtask checkpoint.
#[derive(Debug)]
pub struct Document {
    html: Html,
    body: NodeId,
    styles: HashMap<NodeId, IndexMap<String, String>>,
    observers: Vec<Observer>,
    pending: IndexMap<SubscriptionId, Vec<MutationRecord<NodeId>>>,
    next_subscription: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// `color: red; opacity: 0` as ordered declarations
fn parse_declarations(text: &str) -> IndexMap<String, String> {
    text.split(';')
        .filter_map(|decl| decl.split_once(':'))
        .map(|(name, value)| (name.trim().to_ascii_lowercase(), value.trim().to_string()))
        .filter(|(name, _)| !name.is_empty())
        .collect()
}

impl Document {
    /// An empty `<html><head></head><body></body></html>` document
    pub fn new() -> Self {
        Self::parse("")
    }

    /// Parse a whole page
    pub fn parse(source: &str) -> Self {
        let html = Html::parse_document(source);
        let root = html.tree.root().id();
        let body = html
            .tree
            .root()
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "body")
            .map(|el| el.id())
            .unwrap_or(root);

        let mut doc = Document {
            html,
            body,
            styles: HashMap::new(),
            observers: Vec::new(),
            pending: IndexMap::new(),
            next_subscription: 1,
        };
        doc.seed_styles(root);
        doc
    }

    pub fn body_id(&self) -> NodeId {
        self.body
    }

    fn seed_styles(&mut self, scope: NodeId) {
        let Some(scope) = self.html.tree.get(scope) else {
            return;
        };
        let seeded: Vec<(NodeId, IndexMap<String, String>)> = scope
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter_map(|el| Some((el.id(), parse_declarations(el.value().attr("style")?))))
            .collect();
        self.styles.extend(seeded);
    }

    // -----------------------------------------------------------------------
    // Node creation (detached, no notifications)
    // -----------------------------------------------------------------------

    /// Parse an HTML fragment into detached nodes. Returns every top-level
    /// node, text included, in order.
    pub fn create_fragment(&mut self, source: &str) -> Vec<NodeId> {
        let fragment = Html::parse_fragment(source);
        let top: Vec<NodeId> = fragment
            .root_element()
            .children()
            .map(|node| self.graft(node))
            .collect();
        for &node in &top {
            self.seed_styles(node);
        }
        top
    }

    /// Copy a subtree of another tree into this one, detached
    fn graft(&mut self, node: NodeRef<'_, Node>) -> NodeId {
        let id = self.html.tree.orphan(node.value().clone()).id();
        for child in node.children() {
            let child_id = self.graft(child);
            if let Some(mut parent) = self.html.tree.get_mut(id) {
                parent.append_id(child_id);
            }
        }
        id
    }

    /// Parse `source` and append it to `parent`. Returns the top-level
    /// elements that were added.
    pub fn append_html(&mut self, parent: NodeId, source: &str) -> Vec<NodeId> {
        let nodes = self.create_fragment(source);
        for &node in &nodes {
            self.append_child(parent, node);
        }
        nodes
            .into_iter()
            .filter(|&node| self.element(node).is_some())
            .collect()
    }

    // -----------------------------------------------------------------------
    // Read access
    // -----------------------------------------------------------------------

    pub fn element(&self, node: NodeId) -> Option<ElementRef<'_>> {
        self.html.tree.get(node).and_then(ElementRef::wrap)
    }

    pub fn node_type(&self, node: NodeId) -> NodeType {
        match self.html.tree.get(node).map(|n| n.value()) {
            Some(Node::Element(_)) => NodeType::Element,
            Some(Node::Text(_)) => NodeType::Text,
            _ => NodeType::Other,
        }
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.html.tree.get(node)?.parent().map(|p| p.id())
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.html
            .tree
            .get(node)
            .map(|n| n.children().map(|c| c.id()).collect())
            .unwrap_or_default()
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        if let Some(node) = self.html.tree.get(node) {
            for text in node.descendants().filter_map(|d| d.value().as_text()) {
                out.push_str(text);
            }
        }
        out
    }

    /// Serialized markup of an element, without the inline styles set since parsing
    pub fn outer_html(&self, node: NodeId) -> Option<String> {
        self.element(node).map(|el| el.html())
    }

    /// Whether `ancestor` is `node` or one of its ancestors
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.html
            .tree
            .get(node)
            .is_some_and(|n| n.id() == ancestor || n.ancestors().any(|a| a.id() == ancestor))
    }

    /// Elements under `scope` (excluding `scope`) matching `selector`, in document order
    fn select(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        let Some(scope) = self.html.tree.get(scope) else {
            return Vec::new();
        };
        scope
            .descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .filter(|el| selector.matches(el))
            .map(|el| el.id())
            .collect()
    }

    // -----------------------------------------------------------------------
    // Mutation (queues notifications)
    // -----------------------------------------------------------------------

    fn unlink(&mut self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        self.html.tree.get_mut(node)?.detach();
        Some(parent)
    }

    /// Insert `child` under `parent` before `before` (or at the end).
    /// A child that is already attached elsewhere is moved.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, before: Option<NodeId>) {
        if self.element(parent).is_none() || self.is_inclusive_ancestor(child, parent) {
            return;
        }
        if let Some(old_parent) = self.unlink(child) {
            self.record(old_parent, MutationKind::ChildList);
        }

        let anchor = before.filter(|&b| self.parent(b) == Some(parent));
        match anchor {
            Some(anchor) => {
                if let Some(mut sibling) = self.html.tree.get_mut(anchor) {
                    sibling.insert_id_before(child);
                }
            }
            None => {
                if let Some(mut parent) = self.html.tree.get_mut(parent) {
                    parent.append_id(child);
                }
            }
        }
        self.record(parent, MutationKind::ChildList);
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.insert_before(parent, child, None);
    }

    /// Detach `node` from its parent
    pub fn remove(&mut self, node: NodeId) {
        if let Some(parent) = self.unlink(node) {
            self.record(parent, MutationKind::ChildList);
        }
    }

    /// Replace all children of `node` with a single text node, like setting `textContent`
    pub fn set_text_content(&mut self, node: NodeId, text: &str) {
        if self.element(node).is_none() {
            return;
        }
        for child in self.children(node) {
            if let Some(mut child) = self.html.tree.get_mut(child) {
                child.detach();
            }
        }
        let text_node = self
            .html
            .tree
            .orphan(Node::Text(Text { text: text.into() }))
            .id();
        if let Some(mut node) = self.html.tree.get_mut(node) {
            node.append_id(text_node);
        }
        self.record(node, MutationKind::ChildList);
    }

    /// Change the text of a text node in place
    pub fn set_character_data(&mut self, node: NodeId, text: &str) {
        let changed = match self.html.tree.get_mut(node) {
            Some(mut target) => match target.value() {
                Node::Text(old) => {
                    old.text = text.into();
                    true
                }
                _ => false,
            },
            None => false,
        };
        if changed {
            self.record(node, MutationKind::CharacterData);
        }
    }

    /// Queue a record for every observer watching `target`
    fn record(&mut self, target: NodeId, kind: MutationKind) {
        let target_type = self.node_type(target);
        let interested: Vec<SubscriptionId> = self
            .observers
            .iter()
            .filter(|o| o.options.wants(kind))
            .filter(|o| {
                o.target == target
                    || (o.options.subtree && self.is_inclusive_ancestor(o.target, target))
            })
            .map(|o| o.id)
            .collect();
        for id in interested {
            self.pending.entry(id).or_default().push(MutationRecord {
                kind,
                target,
                target_type,
            });
        }
    }

    // -----------------------------------------------------------------------
    // Subscriptions
    // -----------------------------------------------------------------------

    /// Drain every queued notification, oldest subscription first
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        self.pending
            .drain(..)
            .map(|(subscription, records)| Notification {
                subscription,
                records,
            })
            .collect()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.observers.iter().any(|o| o.id == id)
    }

    /// Live subscriptions and the node each one watches
    pub fn subscriptions(&self) -> Vec<(SubscriptionId, NodeId)> {
        self.observers.iter().map(|o| (o.id, o.target)).collect()
    }

    /// Indented outline of the elements under `node` with their inline styles
    pub fn style_outline(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_outline(node, 0, &mut out);
        out
    }

    fn write_outline(&self, node: NodeId, depth: usize, out: &mut String) {
        let Some(el) = self.element(node) else {
            return;
        };
        out.push_str(&"  ".repeat(depth));
        out.push_str(el.value().name());
        for class in el.value().classes() {
            out.push('.');
            out.push_str(class);
        }
        if let Some(style) = self.styles.get(&node).filter(|s| !s.is_empty()) {
            let decls: Vec<String> = style.iter().map(|(k, v)| format!("{k}: {v}")).collect();
            out.push_str(" [");
            out.push_str(&decls.join("; "));
            out.push(']');
        }
        out.push('\n');
        for child in self.children(node) {
            self.write_outline(child, depth + 1, out);
        }
    }
}

impl Page for Document {
    type Node = NodeId;

    fn body(&self) -> Option<NodeId> {
        Some(self.body)
    }

    fn query_all(&self, selector: &Selector) -> Vec<NodeId> {
        // Detached nodes are not part of the page
        self.select(self.html.tree.root().id(), selector)
    }

    fn query_within(&self, scope: &NodeId, selector: &Selector) -> Vec<NodeId> {
        self.select(*scope, selector)
    }

    fn visible_text(&self, node: &NodeId) -> String {
        self.text_content(*node)
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.element(*node)?.value().attr(name).map(str::to_string)
    }

    fn style_property(&self, node: &NodeId, property: &str) -> Option<String> {
        self.styles.get(node)?.get(property).cloned()
    }

    fn set_style_property(&mut self, node: &NodeId, property: &str, value: &str) {
        if self.element(*node).is_none() {
            return;
        }
        self.styles
            .entry(*node)
            .or_default()
            .insert(property.to_string(), value.to_string());
        self.record(*node, MutationKind::Attributes);
    }
}

impl MutationSource for Document {
    fn subscribe(
        &mut self,
        target: &NodeId,
        options: ObserveOptions,
    ) -> Result<SubscriptionId, SubscribeError> {
        if self.html.tree.get(*target).is_none() {
            return Err(SubscribeError(format!("no node {:?}", target)));
        }
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push(Observer {
            id,
            target: *target,
            options,
        });
        Ok(id)
    }

    fn dispose(&mut self, id: SubscriptionId) {
        self.observers.retain(|o| o.id != id);
        self.pending.shift_remove(&id);
    }
}
