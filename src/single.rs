//! The generic single-widget adapter.
//!
//! A [`SingleWidget`] owns one native widget, optionally wrapped in a
//! scrolled window, and implements the whole control interface on top of
//! it. Leaf controls build one through [`ControlConfig`] and then only add
//! their own operations.
//!
//! The adapter holds exactly one sunk reference on the outer widget (the
//! scroll wrapper if there is one) for its whole life. That reference is
//! what lets the widget move between containers: a container dropping its
//! reference on removal never finalizes it. The reference is released once,
//! by `destroy` or on drop.

use std::fmt;
use std::rc::{Rc, Weak};

use log::*;

use crate::control::{Container, Rect, SingleWidgetBacked, Size};
use crate::toolkit::{Allocation, Property, ShadowType, Toolkit, Widget, WidgetKind};

/// Cleanup run right before the adapter releases its native reference. It
/// receives the inner widget.
pub type DestroyHook = Box<dyn FnOnce(&dyn Toolkit, Widget)>;

/// Describes the control to build.
pub struct ControlConfig {
    kind: WidgetKind,
    scroll: Option<ShadowType>,
    properties: Vec<Property>,
    on_destroy: Option<DestroyHook>,
}

impl ControlConfig {
    pub fn new(kind: WidgetKind) -> Self {
        Self {
            kind,
            scroll: None,
            properties: Vec::new(),
            on_destroy: None,
        }
    }

    /// Wrap the widget in a scrolled window, optionally with a sunken frame.
    pub fn scrolled(mut self, bordered: bool) -> Self {
        self.scroll = Some(if bordered { ShadowType::In } else { ShadowType::None });
        self
    }

    pub fn property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    pub fn properties<I>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = Property>,
    {
        self.properties.extend(properties);
        self
    }

    pub fn on_destroy<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(&dyn Toolkit, Widget) + 'static,
    {
        self.on_destroy = Some(Box::new(hook));
        self
    }

    pub fn build(self, toolkit: Rc<dyn Toolkit>) -> SingleWidget {
        SingleWidget::new(toolkit, self)
    }
}

impl fmt::Debug for ControlConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ControlConfig")
            .field("kind", &self.kind)
            .field("scroll", &self.scroll)
            .field("properties", &self.properties)
            .field("on_destroy", &self.on_destroy.is_some())
            .finish()
    }
}

/// Non-owning link to the container holding the outer widget. The native
/// handle is kept so the widget can still be detached from a container
/// whose owner has already let go of it.
struct ParentLink {
    container: Weak<dyn Container>,
    native: Widget,
}

pub struct SingleWidget {
    toolkit: Rc<dyn Toolkit>,
    widget: Widget,
    scrolled_window: Option<Widget>,
    // widget or scrolled_window; the one that goes into containers
    outer: Widget,
    parent: Option<ParentLink>,
    hidden: bool,
    on_destroy: Option<DestroyHook>,
    released: bool,
}

impl SingleWidget {
    pub fn new(toolkit: Rc<dyn Toolkit>, config: ControlConfig) -> Self {
        info!("SingleWidget::new({:?})", config);
        let ControlConfig {
            kind,
            scroll,
            properties,
            on_destroy,
        } = config;

        let widget = toolkit.create(kind, &properties);
        let mut outer = widget;
        let mut scrolled_window = None;

        if let Some(shadow) = scroll {
            let scrolled = toolkit.create(WidgetKind::ScrolledWindow, &[]);
            if toolkit.is_scrollable(widget) {
                toolkit.add(scrolled, widget);
            } else {
                let viewport = toolkit.create(WidgetKind::Viewport, &[]);
                toolkit.add(viewport, widget);
                toolkit.add(scrolled, viewport);
            }
            if shadow != ShadowType::None {
                toolkit.set_shadow_type(scrolled, shadow);
            }
            scrolled_window = Some(scrolled);
            outer = scrolled;
        }

        toolkit.ref_sink(outer);
        toolkit.show_all(outer);

        Self {
            toolkit,
            widget,
            scrolled_window,
            outer,
            parent: None,
            hidden: false,
            on_destroy,
            released: false,
        }
    }

    pub fn handle(&self) -> Widget {
        self.widget
    }

    pub fn outer(&self) -> Widget {
        self.outer
    }

    pub fn scrolled_window(&self) -> Option<Widget> {
        self.scrolled_window
    }

    pub fn has_parent(&self) -> bool {
        self.parent.is_some()
    }

    /// The current container, if it is still alive.
    pub fn parent(&self) -> Option<Rc<dyn Container>> {
        self.parent.as_ref().and_then(|link| link.container.upgrade())
    }

    pub fn set_parent(&mut self, parent: Option<&Rc<dyn Container>>) {
        let old = self.parent.take();
        self.parent = parent.map(|container| ParentLink {
            container: Rc::downgrade(container),
            native: container.handle(),
        });
        if let Some(old) = old {
            debug!("detaching {} from {}", self.outer, old.native);
            self.toolkit.remove(old.native, self.outer);
        }
        if let Some(new) = &self.parent {
            debug!("attaching {} to {}", self.outer, new.native);
            self.toolkit.add(new.native, self.outer);
        }
    }

    // The natural size, because the minimum is an absolute floor: an
    // ellipsizing label's minimum is the ellipsis, not its text.
    // No height-for-width negotiation happens here.
    pub fn preferred_size(&self) -> Size {
        let (_, natural) = self.toolkit.preferred_size(self.widget);
        Size {
            width: natural.width,
            height: natural.height,
        }
    }

    pub fn resize(&mut self, rect: Rect) {
        self.toolkit.size_allocate(
            self.outer,
            Allocation {
                x: rect.x,
                y: rect.y,
                width: rect.width,
                height: rect.height,
            },
        );
    }

    pub fn visible(&self) -> bool {
        !self.hidden
    }

    pub fn show(&mut self) {
        self.toolkit.show_all(self.outer);
        self.hidden = false;
        self.relayout_parent();
    }

    pub fn hide(&mut self) {
        self.toolkit.hide(self.outer);
        self.hidden = true;
        self.relayout_parent();
    }

    pub fn enable(&mut self) {
        self.toolkit.set_sensitive(self.outer, true);
    }

    pub fn disable(&mut self) {
        self.toolkit.set_sensitive(self.outer, false);
    }

    fn relayout_parent(&self) {
        if let Some(parent) = self.parent() {
            trace!("relayout of {} for {}", parent.handle(), self.outer);
            parent.request_relayout();
        }
    }

    /// Tear down an unparented adapter.
    pub(crate) fn release(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        debug!("releasing {}", self.outer);
        if let Some(hook) = self.on_destroy.take() {
            hook(&*self.toolkit, self.widget);
        }
        self.toolkit.unref(self.outer);
        self.released = true;
    }
}

impl SingleWidgetBacked for SingleWidget {
    fn single(&self) -> &SingleWidget {
        self
    }

    fn single_mut(&mut self) -> &mut SingleWidget {
        self
    }

    fn into_single(self) -> SingleWidget {
        self
    }
}

impl Drop for SingleWidget {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Some(link) = &self.parent {
            error!(
                "control for {} dropped while still in {}; leaking its native reference",
                self.widget, link.native
            );
            return;
        }
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::control::Control;
    use crate::platform::HeadlessToolkit;
    use crate::testing::{init_logger, TestContainer};

    fn toolkit() -> (Rc<HeadlessToolkit>, Rc<dyn Toolkit>) {
        init_logger();
        let toolkit = Rc::new(HeadlessToolkit::new());
        let dyn_toolkit: Rc<dyn Toolkit> = toolkit.clone();
        (toolkit, dyn_toolkit)
    }

    fn label(toolkit: &Rc<dyn Toolkit>, text: &str) -> SingleWidget {
        ControlConfig::new(WidgetKind::Label)
            .property(Property::Text(text.into()))
            .build(toolkit.clone())
    }

    #[test]
    fn a_new_control_owns_one_sunk_reference_and_is_visible() {
        let (headless, toolkit) = toolkit();
        let control = label(&toolkit, "hello");

        assert_eq!(control.outer(), control.handle());
        assert_eq!(control.scrolled_window(), None);
        assert_eq!(headless.ref_count(control.outer()), 1);
        assert!(!headless.is_floating(control.outer()));
        assert!(headless.is_visible(control.handle()));
        assert!(control.visible());
        assert!(!control.has_parent());
    }

    #[test]
    fn non_scrollable_widgets_get_a_viewport() {
        let (headless, toolkit) = toolkit();
        let control = ControlConfig::new(WidgetKind::Label)
            .scrolled(true)
            .build(toolkit);

        let scrolled = control.scrolled_window().unwrap();
        assert_eq!(control.outer(), scrolled);
        assert_eq!(headless.kind(scrolled), Some(WidgetKind::ScrolledWindow));
        assert_eq!(headless.shadow_type(scrolled), Some(ShadowType::In));

        let viewport = headless.parent(control.handle()).unwrap();
        assert_eq!(headless.kind(viewport), Some(WidgetKind::Viewport));
        assert_eq!(headless.parent(viewport), Some(scrolled));
        // the whole tree is shown
        assert!(headless.is_drawable(control.handle()));
    }

    #[test]
    fn scrollable_widgets_go_straight_into_the_scrolled_window() {
        let (headless, toolkit) = toolkit();
        let control = ControlConfig::new(WidgetKind::TextView)
            .scrolled(false)
            .build(toolkit);

        let scrolled = control.scrolled_window().unwrap();
        assert_eq!(headless.parent(control.handle()), Some(scrolled));
        assert_eq!(headless.shadow_type(scrolled), Some(ShadowType::None));
        // the handle is the real widget, not the wrapper
        assert_eq!(headless.kind(control.handle()), Some(WidgetKind::TextView));
    }

    #[test]
    fn destroying_a_parented_control_is_refused() {
        let (headless, toolkit) = toolkit();
        let container = TestContainer::new(&headless);
        let hook_ran = Rc::new(Cell::new(false));
        let hook_flag = hook_ran.clone();
        let mut control = ControlConfig::new(WidgetKind::Entry)
            .on_destroy(move |_, _| hook_flag.set(true))
            .build(toolkit);
        control.set_parent(Some(&container.as_parent()));
        let outer = control.outer();

        let err = control.destroy().unwrap_err();
        assert!(err.to_string().contains("still has a parent"));
        assert!(std::error::Error::source(&err).is_none());
        assert!(!hook_ran.get());
        assert!(headless.is_alive(outer));
        assert_eq!(headless.children(container.handle()), vec![outer]);
        // ours and the container's
        assert_eq!(headless.ref_count(outer), 2);

        let mut control = err.into_inner();
        control.set_parent(None);
        assert!(control.destroy().is_ok());
        assert!(hook_ran.get());
        assert!(!headless.is_alive(outer));
    }

    #[test]
    fn unparenting_detaches_completely() {
        let (headless, toolkit) = toolkit();
        let container = TestContainer::new(&headless);
        let mut control = label(&toolkit, "x");

        control.set_parent(Some(&container.as_parent()));
        assert_eq!(headless.parent(control.outer()), Some(container.handle()));
        control.set_parent(None);
        assert_eq!(headless.parent(control.outer()), None);
        assert!(headless.children(container.handle()).is_empty());
        assert!(!control.has_parent());
        assert_eq!(headless.ref_count(control.outer()), 1);

        let outer = control.outer();
        assert!(control.destroy().is_ok());
        assert!(!headless.is_alive(outer));
    }

    #[test]
    fn reparenting_moves_the_outer_widget() {
        let (headless, toolkit) = toolkit();
        let a = TestContainer::new(&headless);
        let b = TestContainer::new(&headless);
        let mut control = ControlConfig::new(WidgetKind::TextView)
            .scrolled(true)
            .build(toolkit);

        control.set_parent(Some(&a.as_parent()));
        control.set_parent(Some(&b.as_parent()));

        assert!(headless.children(a.handle()).is_empty());
        assert_eq!(headless.children(b.handle()), vec![control.outer()]);
        assert_eq!(headless.parent(control.outer()), Some(b.handle()));
        assert_eq!(control.parent().map(|p| p.handle()), Some(b.handle()));
        control.set_parent(None);
    }

    #[test]
    fn show_and_hide_request_one_relayout_each() {
        let (headless, toolkit) = toolkit();
        let container = TestContainer::new(&headless);
        let mut control = label(&toolkit, "x");

        // no parent, nobody to tell
        control.hide();
        assert!(!control.visible());
        assert_eq!(container.relayouts(), 0);

        control.set_parent(Some(&container.as_parent()));
        control.show();
        assert!(control.visible());
        assert!(headless.is_visible(control.outer()));
        assert_eq!(container.relayouts(), 1);

        control.hide();
        assert!(!control.visible());
        assert!(!headless.is_visible(control.outer()));
        assert_eq!(container.relayouts(), 2);
        control.set_parent(None);
    }

    #[test]
    fn visibility_is_adapter_state() {
        let (headless, toolkit) = toolkit();
        let control = label(&toolkit, "x");
        headless.hide(control.outer());
        // the native widget changed behind our back; the flag did not
        assert!(control.visible());
    }

    #[test]
    fn a_dead_container_is_still_detached_from() {
        let (headless, toolkit) = toolkit();
        let container = TestContainer::new(&headless);
        let native = container.handle();
        let mut control = label(&toolkit, "x");
        control.set_parent(Some(&container.as_parent()));
        drop(container);

        assert!(control.parent().is_none());
        control.hide();
        control.set_parent(None);
        assert!(headless.children(native).is_empty());
        assert!(control.destroy().is_ok());
    }

    #[test]
    fn preferred_size_is_the_natural_size() {
        let (headless, toolkit) = toolkit();
        let text = "a fairly long label that may be ellipsized";
        let control = ControlConfig::new(WidgetKind::Label)
            .properties(vec![Property::Text(text.into()), Property::Ellipsize(true)])
            .build(toolkit);

        let (minimum, natural) = headless.preferred_size(control.handle());
        assert!(minimum.width < natural.width);
        let size = control.preferred_size();
        assert_eq!(size.width, natural.width);
        assert_eq!(size.height, natural.height);
        assert!(size.width >= minimum.width && size.height >= minimum.height);
    }

    #[test]
    fn preferred_size_has_no_side_effects() {
        let (headless, toolkit) = toolkit();
        let control = label(&toolkit, "abc");
        let before = headless.allocation(control.outer());
        let first = control.preferred_size();
        assert_eq!(first, control.preferred_size());
        assert_eq!(headless.allocation(control.outer()), before);
    }

    #[test]
    fn resize_allocates_the_outer_widget() {
        let (headless, toolkit) = toolkit();
        let mut control = ControlConfig::new(WidgetKind::Label)
            .scrolled(false)
            .build(toolkit);

        control.resize(Rect::new(3, 4, 100, 50));
        assert_eq!(
            headless.allocation(control.outer()),
            Some(Allocation { x: 3, y: 4, width: 100, height: 50 })
        );
        assert_eq!(headless.allocation(control.handle()), Some(Allocation::default()));
    }

    #[test]
    fn enable_and_disable_touch_only_sensitivity() {
        let (headless, toolkit) = toolkit();
        let container = TestContainer::new(&headless);
        let mut control = label(&toolkit, "x");
        control.set_parent(Some(&container.as_parent()));

        control.disable();
        assert!(!headless.is_sensitive(control.outer()));
        assert!(control.visible());
        assert!(control.has_parent());
        assert_eq!(container.relayouts(), 0);

        control.enable();
        assert!(headless.is_sensitive(control.outer()));
        control.set_parent(None);
    }

    #[test]
    fn the_destroy_hook_runs_before_the_release() {
        let (headless, toolkit) = toolkit();
        let observed = Rc::new(RefCell::new(None));
        let (hook_toolkit, hook_observed) = (headless.clone(), observed.clone());
        let control = ControlConfig::new(WidgetKind::Label)
            .scrolled(true)
            .on_destroy(move |_, widget| {
                *hook_observed.borrow_mut() = Some((widget, hook_toolkit.is_alive(widget)));
            })
            .build(toolkit);
        let (widget, scrolled) = (control.handle(), control.outer());
        let viewport = headless.parent(widget).unwrap();

        assert!(control.destroy().is_ok());
        assert_eq!(*observed.borrow(), Some((widget, true)));
        for gone in &[widget, viewport, scrolled] {
            assert!(!headless.is_alive(*gone));
        }
    }

    #[test]
    fn dropping_releases_unless_parented() {
        let (headless, toolkit) = toolkit();
        let container = TestContainer::new(&headless);

        let control = label(&toolkit, "x");
        let outer = control.outer();
        drop(control);
        assert!(!headless.is_alive(outer));

        let mut control = label(&toolkit, "y");
        control.set_parent(Some(&container.as_parent()));
        let outer = control.outer();
        drop(control);
        // leaked on purpose, the container still holds it
        assert!(headless.is_alive(outer));
        assert_eq!(headless.children(container.handle()), vec![outer]);
    }
}
