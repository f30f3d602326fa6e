use std::fmt;

use crate::parse::Selector;

/// Kind of structural or content change reported by a host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    ChildList,
    Attributes,
    CharacterData,
}

/// Coarse node classification, mirroring the DOM's `nodeType`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Element,
    Text,
    Other,
}

/// One change notification entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord<N> {
    pub kind: MutationKind,
    pub target: N,
    pub target_type: NodeType,
}

impl<N> MutationRecord<N> {
    pub fn targets_element(&self) -> bool {
        self.target_type == NodeType::Element
    }
}

/// Which changes a subscription wants to hear about
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObserveOptions {
    pub child_list: bool,
    pub subtree: bool,
    pub attributes: bool,
    pub character_data: bool,
}

impl ObserveOptions {
    /// Child-list changes anywhere under the target
    pub fn structural() -> Self {
        ObserveOptions {
            child_list: true,
            subtree: true,
            ..Default::default()
        }
    }

    pub fn wants(&self, kind: MutationKind) -> bool {
        match kind {
            MutationKind::ChildList => self.child_list,
            MutationKind::Attributes => self.attributes,
            MutationKind::CharacterData => self.character_data,
        }
    }
}

/// Handle for an active change subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// The host refused to create a subscription
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("could not subscribe to changes: {0}")]
pub struct SubscribeError(pub String);

/// Read and restyle access to a rendered page.
///
/// Every lookup is null-tolerant: missing nodes come back as `None` or an
/// empty list, never as an error.
pub trait Page {
    type Node: Clone + fmt::Debug;

    fn body(&self) -> Option<Self::Node>;

    /// All elements in the document matching `selector`, in document order
    fn query_all(&self, selector: &Selector) -> Vec<Self::Node>;

    /// Descendants of `scope` matching `selector`, in document order
    fn query_within(&self, scope: &Self::Node, selector: &Selector) -> Vec<Self::Node>;

    fn query_first(&self, selector: &Selector) -> Option<Self::Node> {
        self.query_all(selector).into_iter().next()
    }

    fn query_first_within(&self, scope: &Self::Node, selector: &Selector) -> Option<Self::Node> {
        self.query_within(scope, selector).into_iter().next()
    }

    /// Rendered text of the node and its descendants
    fn visible_text(&self, node: &Self::Node) -> String;

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    /// Current inline style value, `None` when unset
    fn style_property(&self, node: &Self::Node, property: &str) -> Option<String>;

    fn set_style_property(&mut self, node: &Self::Node, property: &str, value: &str);
}

/// Structural-change subscriptions on a page.
///
/// Hosts deliver notifications for a subscription by calling
/// [`Coordinator::notify`](crate::io::coordinator::Coordinator::notify) with
/// the id returned here. Records queued for a disposed subscription are
/// dropped.
pub trait MutationSource: Page {
    fn subscribe(
        &mut self,
        target: &Self::Node,
        options: ObserveOptions,
    ) -> Result<SubscriptionId, SubscribeError>;

    fn dispose(&mut self, id: SubscriptionId);
}
