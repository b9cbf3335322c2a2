//! Toolkit backed by X11 child windows.
//!
//! Each widget is an X window, created as an unmapped child of the root.
//! Containment is reparenting and allocation is a configure request. A
//! window is mapped only while the store says it is viewable, that is shown
//! and inside a shown [`WidgetKind::Window`]; anything else left mapped
//! under the root would be taken over by the window manager. The widget tree itself
//! (references, sizes, spin values, signals) is kept client-side in the
//! shared store, so the only thing the server sees is geometry. Input
//! arrives through [`X11Toolkit::dispatch_pending`]: a click on the upper
//! half of a spin button steps it up, the lower half steps it down.

use std::cell::RefCell;

use log::*;

use super::store::{self, WidgetStore};
use crate::error::PlatformError;
use crate::toolkit::{
    Allocation, Handler, HandlerId, Property, Requisition, ShadowType, Signal, Toolkit, Widget,
    WidgetKind,
};

mod x_handle;

pub struct X11Toolkit {
    x_handle: x_handle::XHandle,
    store: RefCell<WidgetStore>,
}

impl X11Toolkit {
    pub fn new() -> Result<Self, PlatformError> {
        info!("X11Toolkit::new()");
        let x_handle = x_handle::XHandle::new()?;
        debug!("connected to screen {}", x_handle.screen_num());
        Ok(Self {
            x_handle,
            store: RefCell::new(WidgetStore::new()),
        })
    }

    /// Handle every queued event without blocking. Returns how many were
    /// handled.
    pub fn dispatch_pending(&self) -> usize {
        let mut handled = 0;
        while let Some(event) = self.x_handle.poll_for_event() {
            handled += 1;
            match event.response_type() & !0x80 {
                xcb::BUTTON_PRESS => {
                    let press = unsafe { xcb::cast_event::<xcb::ButtonPressEvent>(&event) };
                    self.handle_press(Widget::from_raw(press.event()), i32::from(press.event_y()));
                }
                xcb::EXPOSE => trace!("expose"),
                other => trace!("ignoring event type {}", other),
            }
        }
        self.x_handle.flush();
        handled
    }

    fn handle_press(&self, widget: Widget, y: i32) {
        let height = match self.store.borrow().get(widget) {
            Some(node) if node.kind == WidgetKind::SpinButton => node.allocation.height,
            _ => return,
        };
        let steps = if y < height / 2 { 1.0 } else { -1.0 };
        let handlers = self.store.borrow_mut().step(widget, steps);
        store::emit(handlers, widget);
    }

    /// Bring the mapping of `widget` and its descendants in line with the
    /// store.
    fn sync_mapping(&self, widget: Widget) {
        let (map, unmap): (Vec<Widget>, Vec<Widget>) = {
            let store = self.store.borrow();
            store
                .subtree(widget)
                .into_iter()
                .partition(|w| store.is_viewable(*w))
        };
        for widget in unmap {
            xcb::unmap_window(self.x_handle.conn_ref(), widget.raw());
        }
        // children first so the subtree appears at once
        for widget in map.into_iter().rev() {
            xcb::map_window(self.x_handle.conn_ref(), widget.raw());
        }
        self.x_handle.flush();
    }

    fn destroy_windows(&self, finalized: Vec<Widget>) {
        for widget in finalized {
            trace!("destroying window for {}", widget);
            xcb::destroy_window(self.x_handle.conn_ref(), widget.raw());
        }
        self.x_handle.flush();
    }
}

impl Drop for X11Toolkit {
    fn drop(&mut self) {
        info!("X11Toolkit::drop()");
        self.x_handle.sync();
    }
}

impl Toolkit for X11Toolkit {
    fn create(&self, kind: WidgetKind, properties: &[Property]) -> Widget {
        let widget = Widget::from_raw(self.x_handle.create_window());
        self.store.borrow_mut().insert(widget, kind, properties);
        widget
    }

    fn is_scrollable(&self, widget: Widget) -> bool {
        self.store.borrow().is_scrollable(widget)
    }

    fn set_shadow_type(&self, scrolled_window: Widget, shadow: ShadowType) {
        self.store.borrow_mut().set_shadow_type(scrolled_window, shadow);
        let border = match shadow {
            ShadowType::In => store::FRAME as u32,
            ShadowType::None => 0,
        };
        xcb::configure_window(
            self.x_handle.conn_ref(),
            scrolled_window.raw(),
            &[(xcb::CONFIG_WINDOW_BORDER_WIDTH as u16, border)],
        );
        self.x_handle.flush();
    }

    fn add(&self, container: Widget, child: Widget) {
        if self.store.borrow_mut().add(container, child) {
            xcb::reparent_window(self.x_handle.conn_ref(), child.raw(), container.raw(), 0, 0);
            self.sync_mapping(child);
        }
    }

    fn remove(&self, container: Widget, child: Widget) {
        let attached = self
            .store
            .borrow()
            .get(child)
            .map_or(false, |node| node.parent == Some(container));
        if attached {
            // unmapped first, or it shows up as a toplevel under the root
            xcb::unmap_window(self.x_handle.conn_ref(), child.raw());
            xcb::reparent_window(self.x_handle.conn_ref(), child.raw(), self.x_handle.root(), 0, 0);
        }
        let finalized = self.store.borrow_mut().remove(container, child);
        self.destroy_windows(finalized);
    }

    fn ref_sink(&self, widget: Widget) {
        self.store.borrow_mut().ref_sink(widget);
    }

    fn unref(&self, widget: Widget) {
        let finalized = self.store.borrow_mut().unref(widget);
        self.destroy_windows(finalized);
    }

    fn show_all(&self, widget: Widget) {
        self.store.borrow_mut().show_all(widget);
        self.sync_mapping(widget);
    }

    fn hide(&self, widget: Widget) {
        self.store.borrow_mut().hide(widget);
        self.sync_mapping(widget);
    }

    fn preferred_size(&self, widget: Widget) -> (Requisition, Requisition) {
        self.store.borrow().preferred_size(widget)
    }

    fn size_allocate(&self, widget: Widget, allocation: Allocation) {
        self.store.borrow_mut().size_allocate(widget, allocation);
        // X rejects empty windows
        let values = [
            (xcb::CONFIG_WINDOW_X as u16, allocation.x as u32),
            (xcb::CONFIG_WINDOW_Y as u16, allocation.y as u32),
            (xcb::CONFIG_WINDOW_WIDTH as u16, allocation.width.max(1) as u32),
            (xcb::CONFIG_WINDOW_HEIGHT as u16, allocation.height.max(1) as u32),
        ];
        xcb::configure_window(self.x_handle.conn_ref(), widget.raw(), &values);
        self.x_handle.flush();
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
