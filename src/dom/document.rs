use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dom::geometry::{Rect, Viewport};

/// Shared handle used by the async parts of the engine. Borrows are never
/// held across a suspension point, so the page can change between them.
pub type SharedDocument = Rc<RefCell<Document>>;

// ============================================================================
// Handles
// ============================================================================

/// Weak, copyable handle to a node. A handle whose slot was freed (or reused
/// by a newer node) resolves to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}.{}", self.index, self.generation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

// ============================================================================
// Node data
// ============================================================================

/// Computed style properties the engine cares about. `None` means the
/// property is inherited or left at its initial value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Style {
    #[serde(default)]
    pub display: Option<String>,
    #[serde(default)]
    pub visibility: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Element {
    pub tag: String,
    pub attributes: HashMap<String, String>,
    pub style: Style,
    pub rect: Rect,
    pub value: String,
    pub checked: bool,
    pub selected: bool,
    /// Page-controlled widget that refuses programmatic writes.
    pub locked: bool,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_lowercase(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
enum NodeData {
    Element(Element),
    Text(String),
}

#[derive(Debug)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

// ============================================================================
// Events and mutations
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Focus,
    Input,
    Change,
    Blur,
    Keyup,
}

/// The notification set dispatched after every programmatic write.
pub const WRITE_EVENTS: [EventKind; 4] = [
    EventKind::Input,
    EventKind::Change,
    EventKind::Blur,
    EventKind::Keyup,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomEvent {
    pub target: NodeId,
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub parent: Option<NodeId>,
    pub added: Vec<NodeId>,
    pub removed: Vec<NodeId>,
}

struct Observer {
    id: ObserverId,
    callback: Box<dyn Fn(&Document, &MutationRecord)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("{0} is no longer attached to the page")]
    Detached(NodeId),

    #[error("{0} is not an element")]
    NotAnElement(NodeId),

    #[error("{0} refused the write")]
    Rejected(NodeId),
}

// ============================================================================
// Document
// ============================================================================

pub struct Document {
    slots: Vec<Slot>,
    free: Vec<u32>,
    body: NodeId,
    viewport: Viewport,
    focused: Option<NodeId>,
    events: Vec<DomEvent>,
    observers: Vec<Observer>,
    next_observer: u64,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &(self.slots.len() - self.free.len()))
            .field("body", &self.body)
            .field("viewport", &self.viewport)
            .field("focused", &self.focused)
            .field("events", &self.events.len())
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let mut doc = Self {
            slots: Vec::new(),
            free: Vec::new(),
            body: NodeId {
                index: 0,
                generation: 0,
            },
            viewport: Viewport::default(),
            focused: None,
            events: Vec::new(),
            observers: Vec::new(),
            next_observer: 0,
        };
        doc.body = doc.alloc(NodeData::Element(Element::new("body")));
        doc
    }

    pub fn into_shared(self) -> SharedDocument {
        Rc::new(RefCell::new(self))
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    // ---- Allocation ----

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let node = Node {
            data,
            parent: None,
            children: Vec::new(),
        };

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            NodeId {
                index,
                generation: slot.generation,
            }
        } else {
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeId {
                index: (self.slots.len() - 1) as u32,
                generation: 0,
            }
        }
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    /// Create a detached element. It becomes part of the page once appended.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeData::Element(Element::new(tag)))
    }

    pub fn create_element_with(&mut self, element: Element) -> NodeId {
        self.alloc(NodeData::Element(element))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeData::Text(text.to_string()))
    }

    /// Create an element with attributes and append it to `parent`.
    pub fn append_element(
        &mut self,
        parent: NodeId,
        tag: &str,
        attrs: &[(&str, &str)],
    ) -> Result<NodeId, DomError> {
        let mut element = Element::new(tag);
        for (name, value) in attrs {
            element
                .attributes
                .insert(name.to_lowercase(), value.to_string());
        }
        if element.tag == "input" {
            if let Some(v) = element.attributes.get("value") {
                element.value = v.clone();
            }
            element.checked = element.attributes.contains_key("checked");
        }
        let id = self.create_element_with(element);
        self.append_child(parent, id)?;
        Ok(id)
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> Result<NodeId, DomError> {
        let id = self.create_text(text);
        self.append_child(parent, id)?;
        Ok(id)
    }

    // ---- Structure ----

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        match self.node(parent) {
            Some(Node {
                data: NodeData::Element(_),
                ..
            }) => {}
            Some(_) => return Err(DomError::NotAnElement(parent)),
            None => return Err(DomError::Detached(parent)),
        }
        if self.node(child).is_none() {
            return Err(DomError::Detached(child));
        }
        if child == parent || self.ancestors(parent).contains(&child) {
            return Err(DomError::Rejected(child));
        }

        self.unlink(child);
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.node_mut(parent) {
            node.children.push(child);
        }

        if self.is_attached(parent) {
            self.notify(MutationRecord {
                parent: Some(parent),
                added: vec![child],
                removed: vec![],
            });
        }
        Ok(())
    }

    fn unlink(&mut self, child: NodeId) {
        let old_parent = self.node(child).and_then(|n| n.parent);
        if let Some(p) = old_parent {
            if let Some(parent) = self.node_mut(p) {
                parent.children.retain(|c| *c != child);
            }
        }
        if let Some(node) = self.node_mut(child) {
            node.parent = None;
        }
    }

    /// Remove a node and its subtree from the page. Every handle into the
    /// subtree goes stale.
    pub fn remove(&mut self, id: NodeId) -> Result<(), DomError> {
        if self.node(id).is_none() {
            return Err(DomError::Detached(id));
        }
        if id == self.body {
            return Err(DomError::Rejected(id));
        }

        let parent = self.parent(id);
        let was_attached = self.is_attached(id);
        self.unlink(id);

        let mut doomed = vec![id];
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let children = self.children(current).to_vec();
            doomed.extend(children.iter().copied());
            stack.extend(children);
        }

        for node in &doomed {
            if self.focused == Some(*node) {
                self.focused = None;
            }
            let slot = &mut self.slots[node.index as usize];
            slot.node = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(node.index);
        }

        if was_attached {
            self.notify(MutationRecord {
                parent,
                added: vec![],
                removed: vec![id],
            });
        }
        Ok(())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// True when the node is live and connected to `<body>`.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.body {
                return true;
            }
            match self.node(current).and_then(|n| n.parent) {
                Some(p) => current = p,
                None => return false,
            }
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|c| self.is_element(*c))
            .collect()
    }

    /// Siblings before `id`, nearest first. Includes text nodes.
    pub fn previous_siblings(&self, id: NodeId) -> Vec<NodeId> {
        let Some(parent) = self.parent(id) else {
            return vec![];
        };
        let siblings = self.children(parent);
        match siblings.iter().position(|c| *c == id) {
            Some(pos) => siblings[..pos].iter().rev().copied().collect(),
            None => vec![],
        }
    }

    pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|c| *c == id)?;
        siblings[pos + 1..]
            .iter()
            .copied()
            .find(|c| self.is_element(*c))
    }

    /// Element descendants of `id` in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            if self.is_element(current) {
                out.push(current);
            }
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// Element ancestors, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent(id);
        while let Some(p) = current {
            out.push(p);
            current = self.parent(p);
        }
        out
    }

    /// Nearest ancestor-or-self with the given tag.
    pub fn closest(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|n| self.tag(*n) == Some(tag))
    }

    pub fn is_descendant_of(&self, id: NodeId, ancestor: NodeId) -> bool {
        self.ancestors(id).contains(&ancestor)
    }

    pub fn get_element_by_id(&self, element_id: &str) -> Option<NodeId> {
        if element_id.is_empty() {
            return None;
        }
        self.descendants(self.body)
            .into_iter()
            .find(|n| self.attr(*n, "id") == Some(element_id))
    }

    // ---- Reads ----

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.node(id) {
            Some(Node {
                data: NodeData::Element(el),
                ..
            }) => Some(el),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match self.node_mut(id) {
            Some(Node {
                data: NodeData::Element(el),
                ..
            }) => Some(el),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.tag.as_str())
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)
            .and_then(|el| el.attributes.get(name))
            .map(|s| s.as_str())
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    pub fn class_name(&self, id: NodeId) -> &str {
        self.attr(id, "class").unwrap_or("")
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match self.node(id) {
            Some(Node {
                data: NodeData::Text(t),
                ..
            }) => out.push_str(t),
            Some(node) => {
                for child in &node.children {
                    self.collect_text(*child, out);
                }
            }
            None => {}
        }
    }

    /// Whether the node would be painted: no ancestor-or-self has
    /// `display: none`, and the nearest explicit `visibility` is visible.
    pub fn is_rendered(&self, id: NodeId) -> bool {
        if !self.is_attached(id) {
            return false;
        }

        let mut visibility: Option<&str> = None;
        for node in std::iter::once(id).chain(self.ancestors(id)) {
            let Some(el) = self.element(node) else {
                continue;
            };
            if el.style.display.as_deref() == Some("none") {
                return false;
            }
            if visibility.is_none() {
                visibility = el.style.visibility.as_deref();
            }
        }

        !matches!(visibility, Some("hidden") | Some("collapse"))
    }

    pub fn rect(&self, id: NodeId) -> Rect {
        self.element(id).map(|el| el.rect).unwrap_or_default()
    }

    pub fn value(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.value.as_str())
    }

    pub fn checked(&self, id: NodeId) -> bool {
        self.element(id).is_some_and(|el| el.checked)
    }

    pub fn selected(&self, id: NodeId) -> bool {
        self.element(id).is_some_and(|el| el.selected)
    }

    /// `<option>` descendants of a select, in document order.
    pub fn options(&self, select: NodeId) -> Vec<NodeId> {
        self.descendants(select)
            .into_iter()
            .filter(|n| self.tag(*n) == Some("option"))
            .collect()
    }

    /// An option's submitted value: its `value` attribute, else its text.
    pub fn option_value(&self, option: NodeId) -> String {
        match self.attr(option, "value") {
            Some(v) => v.to_string(),
            None => collapse_whitespace(&self.text_content(option)),
        }
    }

    pub fn select_value(&self, select: NodeId) -> Option<String> {
        let options = self.options(select);
        options
            .iter()
            .find(|o| self.selected(**o))
            .or(options.first())
            .map(|o| self.option_value(*o))
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    pub fn events(&self) -> &[DomEvent] {
        &self.events
    }

    pub fn events_for(&self, id: NodeId) -> Vec<EventKind> {
        self.events
            .iter()
            .filter(|e| e.target == id)
            .map(|e| e.kind)
            .collect()
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    // ---- Setup mutations (page side) ----

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let el = self.element_mut(id).ok_or(DomError::NotAnElement(id))?;
        el.attributes.insert(name.to_lowercase(), value.to_string());
        Ok(())
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<(), DomError> {
        let el = self.element_mut(id).ok_or(DomError::NotAnElement(id))?;
        el.attributes.remove(name);
        Ok(())
    }

    pub fn set_style(&mut self, id: NodeId, style: Style) -> Result<(), DomError> {
        let el = self.element_mut(id).ok_or(DomError::NotAnElement(id))?;
        el.style = style;
        Ok(())
    }

    pub fn set_rect(&mut self, id: NodeId, rect: Rect) -> Result<(), DomError> {
        let el = self.element_mut(id).ok_or(DomError::NotAnElement(id))?;
        el.rect = rect;
        Ok(())
    }

    pub fn set_locked(&mut self, id: NodeId, locked: bool) -> Result<(), DomError> {
        let el = self.element_mut(id).ok_or(DomError::NotAnElement(id))?;
        el.locked = locked;
        Ok(())
    }

    // ---- Control writes (engine side) ----

    fn writable(&mut self, id: NodeId) -> Result<&mut Element, DomError> {
        if !self.is_attached(id) {
            return Err(DomError::Detached(id));
        }
        let el = self.element_mut(id).ok_or(DomError::NotAnElement(id))?;
        if el.locked {
            return Err(DomError::Rejected(id));
        }
        Ok(el)
    }

    pub fn focus(&mut self, id: NodeId) -> Result<(), DomError> {
        if !self.is_attached(id) {
            return Err(DomError::Detached(id));
        }
        if !self.is_element(id) {
            return Err(DomError::NotAnElement(id));
        }
        self.focused = Some(id);
        self.events.push(DomEvent {
            target: id,
            kind: EventKind::Focus,
        });
        Ok(())
    }

    pub fn set_value(&mut self, id: NodeId, value: &str) -> Result<(), DomError> {
        let el = self.writable(id)?;
        el.value = value.to_string();
        Ok(())
    }

    pub fn set_checked(&mut self, id: NodeId, checked: bool) -> Result<(), DomError> {
        let el = self.writable(id)?;
        el.checked = checked;
        Ok(())
    }

    /// Make `option` the single selected option of `select`.
    pub fn select_option(&mut self, select: NodeId, option: NodeId) -> Result<(), DomError> {
        self.writable(select)?;
        if !self.is_descendant_of(option, select) || self.tag(option) != Some("option") {
            return Err(DomError::Rejected(option));
        }

        let value = self.option_value(option);
        for o in self.options(select) {
            if let Some(el) = self.element_mut(o) {
                el.selected = o == option;
            }
        }
        if let Some(el) = self.element_mut(select) {
            el.value = value;
        }
        Ok(())
    }

    pub fn dispatch(&mut self, id: NodeId, kind: EventKind) -> Result<(), DomError> {
        if !self.is_attached(id) {
            return Err(DomError::Detached(id));
        }
        self.events.push(DomEvent { target: id, kind });
        Ok(())
    }

    /// Dispatch the standard post-write notification set.
    pub fn dispatch_write_events(&mut self, id: NodeId) -> Result<(), DomError> {
        for kind in WRITE_EVENTS {
            self.dispatch(id, kind)?;
        }
        Ok(())
    }

    // ---- Observers ----

    pub fn observe<F>(&mut self, callback: F) -> ObserverId
    where
        F: Fn(&Document, &MutationRecord) + 'static,
    {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push(Observer {
            id,
            callback: Box::new(callback),
        });
        id
    }

    /// Returns whether an observer was registered under `id`.
    pub fn disconnect(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|o| o.id != id);
        self.observers.len() != before
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    fn notify(&mut self, record: MutationRecord) {
        if self.observers.is_empty() {
            return;
        }
        // Callbacks only see `&Document`, so they cannot touch the registry.
        let observers = std::mem::take(&mut self.observers);
        for observer in &observers {
            (observer.callback)(self, &record);
        }
        self.observers = observers;
    }
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
