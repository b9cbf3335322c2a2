//! A toolkit with no display behind it.
//!
//! Widgets live only in a [`WidgetStore`]. Beyond the [`Toolkit`] trait it
//! exposes inspection (containment, reference counts, visibility) and input
//! simulation (stepping and typing into spin buttons), which makes it the
//! toolkit the control tests run against.

use std::cell::{Cell, RefCell};

use log::*;

use super::store::{self, WidgetStore};
use crate::toolkit::{
    Allocation, Handler, HandlerId, Property, Requisition, ShadowType, Signal, Toolkit, Widget,
    WidgetKind,
};

pub struct HeadlessToolkit {
    store: RefCell<WidgetStore>,
    next_widget: Cell<u32>,
}

impl HeadlessToolkit {
    pub fn new() -> Self {
        info!("HeadlessToolkit::new()");
        Self {
            store: RefCell::new(WidgetStore::new()),
            next_widget: Cell::new(1),
        }
    }

    pub fn is_alive(&self, widget: Widget) -> bool {
        self.store.borrow().get(widget).is_some()
    }

    pub fn kind(&self, widget: Widget) -> Option<WidgetKind> {
        self.store.borrow().get(widget).map(|node| node.kind)
    }

    pub fn parent(&self, widget: Widget) -> Option<Widget> {
        self.store.borrow().get(widget).and_then(|node| node.parent)
    }

    pub fn children(&self, container: Widget) -> Vec<Widget> {
        self.store
            .borrow()
            .get(container)
            .map_or_else(Vec::new, |node| node.children.clone())
    }

    pub fn ref_count(&self, widget: Widget) -> u32 {
        self.store.borrow().get(widget).map_or(0, |node| node.ref_count)
    }

    pub fn is_floating(&self, widget: Widget) -> bool {
        self.store.borrow().get(widget).map_or(false, |node| node.floating)
    }

    /// The widget's own visibility flag.
    pub fn is_visible(&self, widget: Widget) -> bool {
        self.store.borrow().get(widget).map_or(false, |node| node.visible)
    }

    /// Visible along with every ancestor.
    pub fn is_drawable(&self, widget: Widget) -> bool {
        self.store.borrow().is_drawable(widget)
    }

    /// The widget's own sensitivity flag.
    pub fn is_sensitive(&self, widget: Widget) -> bool {
        self.store.borrow().get(widget).map_or(false, |node| node.sensitive)
    }

    pub fn shadow_type(&self, widget: Widget) -> Option<ShadowType> {
        self.store.borrow().get(widget).map(|node| node.shadow)
    }

    pub fn allocation(&self, widget: Widget) -> Option<Allocation> {
        self.store.borrow().get(widget).map(|node| node.allocation)
    }

    /// `(lower, upper)` of a spin button.
    pub fn range(&self, widget: Widget) -> Option<(f64, f64)> {
        self.store
            .borrow()
            .get(widget)
            .map(|node| (node.adjustment.lower, node.adjustment.upper))
    }

    pub fn digits(&self, widget: Widget) -> Option<u32> {
        self.store.borrow().get(widget).map(|node| node.adjustment.digits)
    }

    pub fn step_increment(&self, widget: Widget) -> Option<f64> {
        self.store.borrow().get(widget).map(|node| node.adjustment.step)
    }

    pub fn handler_count(&self, widget: Widget) -> usize {
        self.store.borrow().get(widget).map_or(0, |node| node.handler_count())
    }

    /// Press a spin button's arrows `steps` times over (negative steps go
    /// down), as a user would. Pressing stops once the value no longer moves.
    pub fn step(&self, widget: Widget, steps: i32) {
        for _ in 0..steps.unsigned_abs() {
            let (handlers, moved) = {
                let mut store = self.store.borrow_mut();
                let before = store.value(widget);
                let handlers = store.step(widget, f64::from(steps.signum()));
                (handlers, store.value(widget) != before)
            };
            store::emit(handlers, widget);
            if !moved {
                break;
            }
        }
    }

    /// Type into a spin button's entry and commit. Text that does not parse
    /// as a number is discarded.
    pub fn type_text(&self, widget: Widget, text: &str) {
        if !self.store.borrow().is_sensitive(widget) {
            debug!("{} is insensitive; ignoring typed text", widget);
            return;
        }
        match text.trim().parse::<f64>() {
            Ok(value) => {
                let handlers = self.store.borrow_mut().set_value(widget, value);
                store::emit(handlers, widget);
            }
            Err(_) => debug!("discarding non-numeric input {:?} for {}", text, widget),
        }
    }
}

impl Default for HeadlessToolkit {
    fn default() -> Self {
        Self::new()
    }
}

impl Toolkit for HeadlessToolkit {
    fn create(&self, kind: WidgetKind, properties: &[Property]) -> Widget {
        let widget = Widget::from_raw(self.next_widget.get());
        self.next_widget.set(widget.raw() + 1);
        self.store.borrow_mut().insert(widget, kind, properties);
        widget
    }

    fn is_scrollable(&self, widget: Widget) -> bool {
        self.store.borrow().is_scrollable(widget)
    }

    fn set_shadow_type(&self, scrolled_window: Widget, shadow: ShadowType) {
        self.store.borrow_mut().set_shadow_type(scrolled_window, shadow);
    }

    fn add(&self, container: Widget, child: Widget) {
        self.store.borrow_mut().add(container, child);
    }

    fn remove(&self, container: Widget, child: Widget) {
        self.store.borrow_mut().remove(container, child);
    }

    fn ref_sink(&self, widget: Widget) {
        self.store.borrow_mut().ref_sink(widget);
    }

    fn unref(&self, widget: Widget) {
        let finalized = self.store.borrow_mut().unref(widget);
        if !finalized.is_empty() {
            debug!("finalized {:?}", finalized);
        }
    }

    fn show_all(&self, widget: Widget) {
        self.store.borrow_mut().show_all(widget);
    }

    fn hide(&self, widget: Widget) {
        self.store.borrow_mut().hide(widget);
    }

    fn preferred_size(&self, widget: Widget) -> (Requisition, Requisition) {
        self.store.borrow().preferred_size(widget)
    }

    fn size_allocate(&self, widget: Widget, allocation: Allocation) {
        self.store.borrow_mut().size_allocate(widget, allocation);
    }

    fn set_sensitive(&self, widget: Widget, sensitive: bool) {
        self.store.borrow_mut().set_sensitive(widget, sensitive);
    }

    fn connect(&self, widget: Widget, signal: Signal, handler: Handler) -> HandlerId {
        self.store.borrow_mut().connect(widget, signal, handler)
    }

    fn disconnect(&self, widget: Widget, id: HandlerId) {
        self.store.borrow_mut().disconnect(widget, id);
    }

    fn block(&self, widget: Widget, id: HandlerId) {
        self.store.borrow_mut().block(widget, id);
    }

    fn unblock(&self, widget: Widget, id: HandlerId) {
        self.store.borrow_mut().unblock(widget, id);
    }

    fn value(&self, widget: Widget) -> f64 {
        self.store.borrow().value(widget)
    }

    fn set_value(&self, widget: Widget, value: f64) {
        let handlers = self.store.borrow_mut().set_value(widget, value);
        store::emit(handlers, widget);
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;

    #[test]
    fn handlers_may_reenter_the_toolkit() {
        let toolkit = Rc::new(HeadlessToolkit::new());
        let spin = toolkit.create(
            WidgetKind::SpinButton,
            &[Property::Range { lower: 0.0, upper: 100.0 }],
        );
        let seen = Rc::new(Cell::new(0.0));
        let (inner, seen_inner) = (Rc::downgrade(&toolkit), seen.clone());
        toolkit.connect(
            spin,
            Signal::ValueChanged,
            Rc::new(move |widget: Widget| {
                if let Some(toolkit) = inner.upgrade() {
                    seen_inner.set(toolkit.value(widget));
                    toolkit.size_allocate(widget, Allocation::default());
                }
            }),
        );

        toolkit.step(spin, 3);
        assert_eq!(seen.get(), 3.0);
        toolkit.type_text(spin, " 42 ");
        assert_eq!(seen.get(), 42.0);
        toolkit.type_text(spin, "forty-two");
        assert_eq!(toolkit.value(spin), 42.0);
    }

    #[test]
    fn extreme_step_counts_stop_at_the_bounds() {
        let toolkit = HeadlessToolkit::new();
        let spin = toolkit.create(
            WidgetKind::SpinButton,
            &[Property::Range { lower: 0.0, upper: 10.0 }, Property::Value(5.0)],
        );
        assert_eq!(toolkit.value(spin), 5.0);
        toolkit.step(spin, i32::MIN);
        assert_eq!(toolkit.value(spin), 0.0);
        toolkit.step(spin, i32::MAX);
        assert_eq!(toolkit.value(spin), 10.0);
    }

    #[test]
    fn widget_ids_are_not_reused() {
        let toolkit = HeadlessToolkit::new();
        let first = toolkit.create(WidgetKind::Label, &[]);
        toolkit.unref(first);
        assert!(!toolkit.is_alive(first));
        let second = toolkit.create(WidgetKind::Label, &[]);
        assert_ne!(first, second);
    }
}
