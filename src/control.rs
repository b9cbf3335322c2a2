//! The uniform control interface.
//!
//! Every control is backed by a [`SingleWidget`] adapter. Concrete controls
//! embed one and expose it through [`SingleWidgetBacked`]; the blanket
//! implementation below then gives them the whole [`Control`] interface, so
//! containers and windows can treat a spin box exactly like any other
//! control.

use std::rc::Rc;

use log::*;

use crate::error::DestroyError;
use crate::single::SingleWidget;
use crate::toolkit::Widget;

/// A preferred size, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

/// A placement rectangle in the parent's coordinate space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }
}

/// What a control needs from the container that holds it.
///
/// Controls only keep a weak link to their container; whoever owns the
/// container's child list owns the controls.
pub trait Container {
    /// The native widget children are added to.
    fn handle(&self) -> Widget;

    /// Recompute and reapply child placement.
    fn request_relayout(&self);
}

pub trait Control {
    /// Release the control.
    ///
    /// Fails, handing the control back untouched, if it still has a parent.
    fn destroy(self) -> Result<(), DestroyError<Self>>
    where
        Self: Sized;

    /// The interactive native widget, never its scroll wrapper.
    fn handle(&self) -> Widget;

    /// Move the control to `parent`, or detach it with `None`.
    fn set_parent(&mut self, parent: Option<&Rc<dyn Container>>);

    /// The natural size of the widget.
    fn preferred_size(&self) -> Size;

    fn resize(&mut self, rect: Rect);

    fn visible(&self) -> bool;

    fn show(&mut self);

    fn hide(&mut self);

    fn enable(&mut self);

    fn disable(&mut self);
}

/// Gives a control the [`Control`] interface by delegating to its adapter.
pub trait SingleWidgetBacked: Sized {
    fn single(&self) -> &SingleWidget;

    fn single_mut(&mut self) -> &mut SingleWidget;

    /// Give up the control's own state, keeping only the adapter.
    fn into_single(self) -> SingleWidget;
}

impl<T: SingleWidgetBacked> Control for T {
    fn destroy(self) -> Result<(), DestroyError<Self>> {
        if self.single().has_parent() {
            error!(
                "attempt to destroy the control for {} while it still has a parent",
                self.single().handle()
            );
            return Err(DestroyError::new(self));
        }
        self.into_single().release();
        Ok(())
    }

    fn handle(&self) -> Widget {
        self.single().handle()
    }

    fn set_parent(&mut self, parent: Option<&Rc<dyn Container>>) {
        self.single_mut().set_parent(parent)
    }

    fn preferred_size(&self) -> Size {
        self.single().preferred_size()
    }

    fn resize(&mut self, rect: Rect) {
        self.single_mut().resize(rect)
    }

    fn visible(&self) -> bool {
        self.single().visible()
    }

    fn show(&mut self) {
        self.single_mut().show()
    }

    fn hide(&mut self) {
        self.single_mut().hide()
    }

    fn enable(&mut self) {
        self.single_mut().enable()
    }

    fn disable(&mut self) {
        self.single_mut().disable()
    }
}
