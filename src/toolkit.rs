//! The slice of the native toolkit that controls are built on.
//!
//! Everything a control does to its native widgets goes through [`Toolkit`]:
//! creation, the reference-counting and containment protocol, visibility,
//! size negotiation, sensitivity, signals and spin-button values. The
//! semantics follow a retained-mode toolkit with floating references: a new
//! widget starts with one floating reference, `ref_sink` turns that into a
//! real one, and adding a widget to a container sinks it on the container's
//! behalf.

use std::fmt;
use std::rc::Rc;

/// Native identity of a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Widget(u32);

impl Widget {
    pub const fn from_raw(raw: u32) -> Self {
        Widget(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Widget {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "widget#{}", self.0)
    }
}

/// Native widget types a control can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    /// Numeric entry with step buttons.
    SpinButton,
    /// Static text.
    Label,
    /// Single-line text entry.
    Entry,
    /// Multi-line text; natively scrollable.
    TextView,
    /// Plain container; used for parents.
    Box,
    /// Scroll container.
    ScrolledWindow,
    /// Adapter that makes a non-scrollable child scrollable.
    Viewport,
    /// Top-level window. Nothing reaches the screen except through one.
    Window,
}

impl WidgetKind {
    /// Whether the widget can be placed in a scrolled window without a viewport.
    pub fn is_scrollable(self) -> bool {
        match self {
            WidgetKind::TextView | WidgetKind::Viewport => true,
            _ => false,
        }
    }

    /// Whether the widget can hold children.
    pub fn is_container(self) -> bool {
        match self {
            WidgetKind::Box
            | WidgetKind::ScrolledWindow
            | WidgetKind::Viewport
            | WidgetKind::Window => true,
            _ => false,
        }
    }
}

/// Construction-time properties.
///
/// Unrecognized combinations (e.g. `Digits` on a label) are ignored by the
/// toolkit.
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    /// Inclusive bounds of a spin button's adjustment.
    Range { lower: f64, upper: f64 },
    /// Step increment of a spin button.
    Step(f64),
    /// Decimal digits a spin button displays and rounds to.
    Digits(u32),
    /// Initial value of a spin button.
    Value(f64),
    /// Text of a label, entry or text view.
    Text(String),
    /// Whether a label may shrink its text down to an ellipsis.
    Ellipsize(bool),
}

/// Frame drawn around a scrolled window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowType {
    None,
    In,
}

impl Default for ShadowType {
    fn default() -> Self {
        ShadowType::None
    }
}

/// A size request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Requisition {
    pub width: i32,
    pub height: i32,
}

/// The rectangle a widget is given by its container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Allocation {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// A spin button's value changed.
    ValueChanged,
}

/// Identifies one signal connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

impl HandlerId {
    pub const fn from_raw(raw: u64) -> Self {
        HandlerId(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// A signal handler. It receives the widget that emitted the signal.
pub type Handler = Rc<dyn Fn(Widget)>;

/// Native toolkit operations used by controls.
///
/// All calls happen on the UI thread. Implementations must not hold internal
/// borrows while running signal handlers, because handlers are free to call
/// back into the toolkit.
pub trait Toolkit {
    /// Create a widget holding a single floating reference.
    fn create(&self, kind: WidgetKind, properties: &[Property]) -> Widget;

    fn is_scrollable(&self, widget: Widget) -> bool;

    fn set_shadow_type(&self, scrolled_window: Widget, shadow: ShadowType);

    /// Add `child` to `container`. A floating child is sunk, otherwise the
    /// container takes a new reference.
    fn add(&self, container: Widget, child: Widget);

    /// Remove `child` from `container`, dropping the container's reference.
    fn remove(&self, container: Widget, child: Widget);

    /// Take ownership of the floating reference, or add a reference if
    /// there is none.
    fn ref_sink(&self, widget: Widget);

    /// Drop one reference; the widget and its subtree are finalized when the
    /// count reaches zero.
    fn unref(&self, widget: Widget);

    /// Make the widget and all of its descendants visible.
    fn show_all(&self, widget: Widget);

    fn hide(&self, widget: Widget);

    /// Returns `(minimum, natural)`.
    fn preferred_size(&self, widget: Widget) -> (Requisition, Requisition);

    fn size_allocate(&self, widget: Widget, allocation: Allocation);

    fn set_sensitive(&self, widget: Widget, sensitive: bool);

    fn connect(&self, widget: Widget, signal: Signal, handler: Handler) -> HandlerId;

    fn disconnect(&self, widget: Widget, id: HandlerId);

    /// Stop delivering to `id` until the matching `unblock`. Blocks nest.
    fn block(&self, widget: Widget, id: HandlerId);

    fn unblock(&self, widget: Widget, id: HandlerId);

    fn value(&self, widget: Widget) -> f64;

    /// Set a spin button's value, clamped to its range and rounded to its
    /// digits. Emits `ValueChanged` if the stored value changed.
    fn set_value(&self, widget: Widget, value: f64);
}
