//! Client-side widget tree shared by the toolkit implementations.
//!
//! The store keeps the state a retained-mode toolkit owns for each widget:
//! reference counts, containment, visibility, sensitivity, allocations,
//! spin-button adjustments and signal connections. It never runs handlers
//! itself. Operations that emit signals hand back the handlers to run so the
//! caller can release its borrow of the store first.

use std::collections::HashMap;

use log::*;

use crate::toolkit::{
    Allocation, Handler, HandlerId, Property, Requisition, ShadowType, Signal, Widget, WidgetKind,
};

/// Width of one character cell.
pub const CHAR_WIDTH: i32 = 8;
/// Height of one line of text.
pub const LINE_HEIGHT: i32 = 18;
/// Inner padding of framed widgets (entries, spin buttons).
pub const PADDING: i32 = 4;
/// Thickness of a scrollbar.
pub const SCROLLBAR: i32 = 12;
/// Thickness of a scrolled window's `In` frame.
pub const FRAME: i32 = 1;

const ENTRY_WIDTH_CHARS: i32 = 20;
const ENTRY_MIN_CHARS: i32 = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adjustment {
    pub lower: f64,
    pub upper: f64,
    pub step: f64,
    pub value: f64,
    pub digits: u32,
}

impl Default for Adjustment {
    fn default() -> Self {
        Self {
            lower: 0.0,
            upper: 0.0,
            step: 1.0,
            value: 0.0,
            digits: 0,
        }
    }
}

impl Adjustment {
    fn normalize(&self, value: f64) -> f64 {
        let factor = 10f64.powi(self.digits as i32);
        let rounded = (value.max(self.lower).min(self.upper) * factor).round() / factor;
        rounded.max(self.lower).min(self.upper)
    }

    fn format(&self, value: f64) -> String {
        format!("{:.*}", self.digits as usize, value)
    }
}

struct Connection {
    id: HandlerId,
    signal: Signal,
    handler: Handler,
    blocked: u32,
}

pub struct Node {
    pub kind: WidgetKind,
    pub ref_count: u32,
    pub floating: bool,
    pub parent: Option<Widget>,
    pub children: Vec<Widget>,
    pub visible: bool,
    pub sensitive: bool,
    pub shadow: ShadowType,
    pub allocation: Allocation,
    pub text: String,
    pub ellipsize: bool,
    pub adjustment: Adjustment,
    connections: Vec<Connection>,
}

impl Node {
    fn new(kind: WidgetKind, properties: &[Property]) -> Self {
        let mut node = Node {
            kind,
            ref_count: 1,
            floating: true,
            parent: None,
            children: Vec::new(),
            visible: false,
            sensitive: true,
            shadow: ShadowType::None,
            allocation: Allocation::default(),
            text: String::new(),
            ellipsize: false,
            adjustment: Adjustment::default(),
            connections: Vec::new(),
        };
        let mut initial = None;
        for property in properties {
            match property {
                Property::Range { lower, upper } => {
                    node.adjustment.lower = *lower;
                    node.adjustment.upper = *upper;
                }
                Property::Step(step) => node.adjustment.step = *step,
                Property::Digits(digits) => node.adjustment.digits = *digits,
                Property::Value(value) => initial = Some(*value),
                Property::Text(text) => node.text = text.clone(),
                Property::Ellipsize(ellipsize) => node.ellipsize = *ellipsize,
            }
        }
        let adjustment = node.adjustment;
        node.adjustment.value = adjustment.normalize(initial.unwrap_or(adjustment.lower));
        node
    }

    pub fn handler_count(&self) -> usize {
        self.connections.len()
    }
}

#[derive(Default)]
pub struct WidgetStore {
    nodes: HashMap<Widget, Node>,
    next_handler: u64,
}

impl WidgetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, widget: Widget, kind: WidgetKind, properties: &[Property]) {
        trace!("WidgetStore::insert({}, {:?})", widget, kind);
        self.nodes.insert(widget, Node::new(kind, properties));
    }

    pub fn get(&self, widget: Widget) -> Option<&Node> {
        self.nodes.get(&widget)
    }

    fn live(&self, widget: Widget, op: &str) -> Option<&Node> {
        let node = self.nodes.get(&widget);
        if node.is_none() {
            warn!("{} on dead {}", op, widget);
        }
        node
    }

    fn live_mut(&mut self, widget: Widget, op: &str) -> Option<&mut Node> {
        let node = self.nodes.get_mut(&widget);
        if node.is_none() {
            warn!("{} on dead {}", op, widget);
        }
        node
    }

    pub fn is_scrollable(&self, widget: Widget) -> bool {
        self.live(widget, "is_scrollable")
            .map_or(false, |node| node.kind.is_scrollable())
    }

    pub fn set_shadow_type(&mut self, widget: Widget, shadow: ShadowType) {
        if let Some(node) = self.live_mut(widget, "set_shadow_type") {
            node.shadow = shadow;
        }
    }

    /// Returns whether the child was actually added.
    pub fn add(&mut self, container: Widget, child: Widget) -> bool {
        match (self.nodes.get(&container), self.nodes.get(&child)) {
            (Some(parent), Some(node)) => {
                if !parent.kind.is_container() {
                    warn!("cannot add {} to {:?} {}", child, parent.kind, container);
                    return false;
                }
                if let Some(existing) = node.parent {
                    warn!("{} already has parent {}; not adding to {}", child, existing, container);
                    return false;
                }
            }
            _ => {
                warn!("add of {} to {} with a dead widget", child, container);
                return false;
            }
        }
        if let Some(node) = self.nodes.get_mut(&child) {
            if node.floating {
                node.floating = false;
            } else {
                node.ref_count += 1;
            }
            node.parent = Some(container);
        }
        if let Some(parent) = self.nodes.get_mut(&container) {
            parent.children.push(child);
        }
        true
    }

    /// Returns the widgets finalized as a result.
    pub fn remove(&mut self, container: Widget, child: Widget) -> Vec<Widget> {
        let attached = self
            .nodes
            .get(&child)
            .map_or(false, |node| node.parent == Some(container));
        if !attached {
            warn!("{} is not a child of {}", child, container);
            return Vec::new();
        }
        if let Some(parent) = self.nodes.get_mut(&container) {
            parent.children.retain(|c| *c != child);
        }
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = None;
        }
        self.unref(child)
    }

    pub fn ref_sink(&mut self, widget: Widget) {
        if let Some(node) = self.live_mut(widget, "ref_sink") {
            if node.floating {
                node.floating = false;
            } else {
                node.ref_count += 1;
            }
        }
    }

    /// Returns the widgets finalized as a result.
    pub fn unref(&mut self, widget: Widget) -> Vec<Widget> {
        let mut finalized = Vec::new();
        let remaining = match self.live_mut(widget, "unref") {
            Some(node) => {
                node.ref_count -= 1;
                node.ref_count
            }
            None => return finalized,
        };
        if remaining == 0 {
            self.finalize(widget, &mut finalized);
        }
        finalized
    }

    fn finalize(&mut self, widget: Widget, finalized: &mut Vec<Widget>) {
        let node = match self.nodes.remove(&widget) {
            Some(node) => node,
            None => return,
        };
        trace!("WidgetStore::finalize({}, {:?})", widget, node.kind);
        finalized.push(widget);
        if let Some(parent) = node.parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.retain(|c| *c != widget);
        }
        // the container's references go away with it
        for child in node.children {
            let remaining = match self.nodes.get_mut(&child) {
                Some(child_node) => {
                    child_node.parent = None;
                    child_node.ref_count -= 1;
                    child_node.ref_count
                }
                None => continue,
            };
            if remaining == 0 {
                self.finalize(child, finalized);
            }
        }
    }

    /// Returns every widget in the subtree, root first.
    pub fn show_all(&mut self, widget: Widget) -> Vec<Widget> {
        let mut shown = Vec::new();
        let mut pending = vec![widget];
        while let Some(current) = pending.pop() {
            if let Some(node) = self.live_mut(current, "show_all") {
                node.visible = true;
                pending.extend(node.children.iter().rev().copied());
                shown.push(current);
            }
        }
        shown
    }

    pub fn hide(&mut self, widget: Widget) {
        if let Some(node) = self.live_mut(widget, "hide") {
            node.visible = false;
        }
    }

    /// Whether the widget and all of its ancestors are visible.
    pub fn is_drawable(&self, widget: Widget) -> bool {
        self.nodes.contains_key(&widget) && self.ancestry(widget).all(|node| node.visible)
    }

    /// Whether the widget and all of its ancestors are sensitive.
    pub fn is_sensitive(&self, widget: Widget) -> bool {
        self.nodes.contains_key(&widget) && self.ancestry(widget).all(|node| node.sensitive)
    }

    /// Whether a backend with real windows should have the widget mapped:
    /// it and every ancestor are visible, and the topmost ancestor is a
    /// toplevel window. An unparented widget is never viewable.
    pub fn is_viewable(&self, widget: Widget) -> bool {
        let mut top = None;
        for node in self.ancestry(widget) {
            if !node.visible {
                return false;
            }
            top = Some(node.kind);
        }
        top == Some(WidgetKind::Window)
    }

    /// Every widget in the subtree, root first.
    pub fn subtree(&self, widget: Widget) -> Vec<Widget> {
        let mut found = Vec::new();
        let mut pending = vec![widget];
        while let Some(current) = pending.pop() {
            if let Some(node) = self.nodes.get(&current) {
                pending.extend(node.children.iter().rev().copied());
                found.push(current);
            }
        }
        found
    }

    fn ancestry(&self, widget: Widget) -> impl Iterator<Item = &Node> + '_ {
        let mut next = self.nodes.get(&widget);
        std::iter::from_fn(move || {
            let current = next?;
            next = current.parent.and_then(|p| self.nodes.get(&p));
            Some(current)
        })
    }

    pub fn set_sensitive(&mut self, widget: Widget, sensitive: bool) {
        if let Some(node) = self.live_mut(widget, "set_sensitive") {
            node.sensitive = sensitive;
        }
    }

    pub fn size_allocate(&mut self, widget: Widget, allocation: Allocation) {
        if let Some(node) = self.live_mut(widget, "size_allocate") {
            node.allocation = allocation;
        }
    }

    /// Returns `(minimum, natural)`. Hidden children of containers do not
    /// count.
    pub fn preferred_size(&self, widget: Widget) -> (Requisition, Requisition) {
        let node = match self.live(widget, "preferred_size") {
            Some(node) => node,
            None => return (Requisition::default(), Requisition::default()),
        };
        let text_width = node.text.chars().count() as i32 * CHAR_WIDTH;
        match node.kind {
            WidgetKind::Label => {
                let natural = Requisition {
                    width: text_width,
                    height: LINE_HEIGHT,
                };
                let minimum = if node.ellipsize && !node.text.is_empty() {
                    // just the ellipsis
                    Requisition {
                        width: CHAR_WIDTH,
                        height: LINE_HEIGHT,
                    }
                } else {
                    natural
                };
                (minimum, natural)
            }
            WidgetKind::Entry => {
                let height = LINE_HEIGHT + 2 * PADDING;
                let minimum = Requisition {
                    width: ENTRY_MIN_CHARS * CHAR_WIDTH + 2 * PADDING,
                    height,
                };
                let natural = Requisition {
                    width: text_width.max(ENTRY_WIDTH_CHARS * CHAR_WIDTH) + 2 * PADDING,
                    height,
                };
                (minimum, natural)
            }
            WidgetKind::SpinButton => {
                let adjustment = &node.adjustment;
                let chars = adjustment
                    .format(adjustment.lower)
                    .len()
                    .max(adjustment.format(adjustment.upper).len()) as i32;
                // two square step buttons beside the text
                let size = Requisition {
                    width: chars * CHAR_WIDTH + 2 * PADDING + 2 * (LINE_HEIGHT + 2 * PADDING),
                    height: LINE_HEIGHT + 2 * PADDING,
                };
                (size, size)
            }
            WidgetKind::TextView => {
                let lines = node.text.lines().count().max(1) as i32;
                let widest = node
                    .text
                    .lines()
                    .map(|line| line.chars().count() as i32)
                    .max()
                    .unwrap_or(0);
                let minimum = Requisition {
                    width: CHAR_WIDTH,
                    height: LINE_HEIGHT,
                };
                let natural = Requisition {
                    width: (widest * CHAR_WIDTH).max(CHAR_WIDTH),
                    height: lines * LINE_HEIGHT,
                };
                (minimum, natural)
            }
            WidgetKind::Box | WidgetKind::Window => {
                // vertical stacking
                let mut minimum = Requisition::default();
                let mut natural = Requisition::default();
                for child in self.visible_children(node) {
                    let (child_min, child_nat) = self.preferred_size(child);
                    minimum.width = minimum.width.max(child_min.width);
                    minimum.height += child_min.height;
                    natural.width = natural.width.max(child_nat.width);
                    natural.height += child_nat.height;
                }
                (minimum, natural)
            }
            WidgetKind::Viewport => {
                let natural = self
                    .visible_children(node)
                    .next()
                    .map_or(Requisition::default(), |child| self.preferred_size(child).1);
                (Requisition::default(), natural)
            }
            WidgetKind::ScrolledWindow => {
                let frame = match node.shadow {
                    ShadowType::In => 2 * FRAME,
                    ShadowType::None => 0,
                };
                let minimum = Requisition {
                    width: 2 * SCROLLBAR + frame,
                    height: 2 * SCROLLBAR + frame,
                };
                let child = self
                    .visible_children(node)
                    .next()
                    .map_or(Requisition::default(), |child| self.preferred_size(child).1);
                let natural = Requisition {
                    width: (child.width + frame).max(minimum.width),
                    height: (child.height + frame).max(minimum.height),
                };
                (minimum, natural)
            }
        }
    }

    fn visible_children<'a>(&'a self, node: &'a Node) -> impl Iterator<Item = Widget> + 'a {
        node.children
            .iter()
            .copied()
            .filter(move |child| self.nodes.get(child).map_or(false, |n| n.visible))
    }

    pub fn connect(&mut self, widget: Widget, signal: Signal, handler: Handler) -> HandlerId {
        self.next_handler += 1;
        let id = HandlerId::from_raw(self.next_handler);
        if let Some(node) = self.live_mut(widget, "connect") {
            node.connections.push(Connection {
                id,
                signal,
                handler,
                blocked: 0,
            });
        }
        id
    }

    pub fn disconnect(&mut self, widget: Widget, id: HandlerId) {
        if let Some(node) = self.live_mut(widget, "disconnect") {
            let before = node.connections.len();
            node.connections.retain(|c| c.id != id);
            if node.connections.len() == before {
                warn!("no handler {:?} on {}", id, widget);
            }
        }
    }

    fn connection_mut(&mut self, widget: Widget, id: HandlerId) -> Option<&mut Connection> {
        let connection = self
            .nodes
            .get_mut(&widget)
            .and_then(|node| node.connections.iter_mut().find(|c| c.id == id));
        if connection.is_none() {
            warn!("no handler {:?} on {}", id, widget);
        }
        connection
    }

    pub fn block(&mut self, widget: Widget, id: HandlerId) {
        if let Some(connection) = self.connection_mut(widget, id) {
            connection.blocked += 1;
        }
    }

    pub fn unblock(&mut self, widget: Widget, id: HandlerId) {
        if let Some(connection) = self.connection_mut(widget, id) {
            if connection.blocked == 0 {
                warn!("handler {:?} on {} is not blocked", id, widget);
            } else {
                connection.blocked -= 1;
            }
        }
    }

    /// Unblocked handlers for `signal`, in connection order.
    pub fn handlers(&self, widget: Widget, signal: Signal) -> Vec<Handler> {
        self.nodes.get(&widget).map_or_else(Vec::new, |node| {
            node.connections
                .iter()
                .filter(|c| c.signal == signal && c.blocked == 0)
                .map(|c| c.handler.clone())
                .collect()
        })
    }

    pub fn value(&self, widget: Widget) -> f64 {
        self.live(widget, "value")
            .map_or(0.0, |node| node.adjustment.value)
    }

    /// Returns the handlers to run if the value changed.
    pub fn set_value(&mut self, widget: Widget, value: f64) -> Vec<Handler> {
        if value.is_nan() {
            warn!("ignoring NaN value for {}", widget);
            return Vec::new();
        }
        let changed = match self.live_mut(widget, "set_value") {
            Some(node) if node.kind == WidgetKind::SpinButton => {
                let value = node.adjustment.normalize(value);
                let changed = value != node.adjustment.value;
                node.adjustment.value = value;
                changed
            }
            Some(node) => {
                warn!("set_value on {:?} {}", node.kind, widget);
                false
            }
            None => false,
        };
        if changed {
            self.handlers(widget, Signal::ValueChanged)
        } else {
            Vec::new()
        }
    }

    /// Step a spin button as its arrow buttons would. Insensitive widgets
    /// ignore this.
    pub fn step(&mut self, widget: Widget, steps: f64) -> Vec<Handler> {
        if !self.is_sensitive(widget) {
            debug!("{} is insensitive; ignoring step", widget);
            return Vec::new();
        }
        let target = match self.nodes.get(&widget) {
            Some(node) => node.adjustment.value + steps * node.adjustment.step,
            None => return Vec::new(),
        };
        self.set_value(widget, target)
    }
}

/// Run handlers collected from the store, after its borrow has ended.
pub fn emit(handlers: Vec<Handler>, widget: Widget) {
    for handler in handlers {
        handler(widget);
    }
}
