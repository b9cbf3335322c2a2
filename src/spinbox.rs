//! Integer spin box.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use log::*;

use crate::control::SingleWidgetBacked;
use crate::single::{ControlConfig, SingleWidget};
use crate::toolkit::{HandlerId, Property, Signal, Toolkit, Widget, WidgetKind};

/// Called after the user changes the value.
pub type ChangedCallback = Rc<dyn Fn(&SpinBoxRef)>;

fn no_callback() -> ChangedCallback {
    Rc::new(|_: &SpinBoxRef| {})
}

struct Shared {
    toolkit: Rc<dyn Toolkit>,
    spin_button: Widget,
    range: (i64, i64),
    changed_signal: Rc<Cell<Option<HandlerId>>>,
    on_changed: Rc<RefCell<ChangedCallback>>,
    // The native value is an f64, which cannot hold every i64. This is the
    // exact value last assigned, good for as long as the widget still shows
    // its rounded form.
    assigned: Cell<i64>,
}

/// The value side of a spin box. This is what change callbacks receive.
#[derive(Clone)]
pub struct SpinBoxRef {
    shared: Rc<Shared>,
}

impl SpinBoxRef {
    pub fn value(&self) -> i64 {
        let shared = &self.shared;
        let native = shared.toolkit.value(shared.spin_button);
        let assigned = shared.assigned.get();
        if assigned as f64 == native {
            return assigned;
        }
        let (min, max) = shared.range;
        (native as i64).max(min).min(max)
    }

    /// Set the value without notifying the change callback. Values outside
    /// the range are clamped.
    pub fn set_value(&self, value: i64) {
        let shared = &self.shared;
        let (min, max) = shared.range;
        let value = value.max(min).min(max);
        shared.assigned.set(value);
        let signal = shared.changed_signal.get();
        // setting the value WILL emit value-changed otherwise
        if let Some(id) = signal {
            shared.toolkit.block(shared.spin_button, id);
        }
        shared.toolkit.set_value(shared.spin_button, value as f64);
        if let Some(id) = signal {
            shared.toolkit.unblock(shared.spin_button, id);
        }
    }

    /// Inclusive `(min, max)`.
    pub fn range(&self) -> (i64, i64) {
        self.shared.range
    }
}

pub struct SpinBox {
    control: SingleWidget,
    spin: SpinBoxRef,
}

impl SpinBox {
    /// Bounds given in the wrong order are swapped.
    pub fn new(toolkit: Rc<dyn Toolkit>, min: i64, max: i64) -> Self {
        let (min, max) = if min >= max { (max, min) } else { (min, max) };
        info!("SpinBox::new({}, {})", min, max);

        let changed_signal = Rc::new(Cell::new(None));
        let on_changed = Rc::new(RefCell::new(no_callback()));
        let (hook_signal, hook_callback) = (changed_signal.clone(), on_changed.clone());
        let control = ControlConfig::new(WidgetKind::SpinButton)
            .properties(vec![
                Property::Range {
                    lower: min as f64,
                    upper: max as f64,
                },
                Property::Step(1.0),
                Property::Digits(0),
            ])
            .on_destroy(move |toolkit: &dyn Toolkit, widget| {
                if let Some(id) = hook_signal.take() {
                    toolkit.disconnect(widget, id);
                }
                // the callback may hold a SpinBoxRef, which holds the toolkit
                drop(hook_callback.replace(no_callback()));
            })
            .build(toolkit.clone());

        let shared = Rc::new(Shared {
            toolkit,
            spin_button: control.handle(),
            range: (min, max),
            changed_signal,
            on_changed,
            assigned: Cell::new(min),
        });

        let weak = Rc::downgrade(&shared);
        let id = shared.toolkit.connect(
            shared.spin_button,
            Signal::ValueChanged,
            Rc::new(move |_: Widget| {
                if let Some(shared) = weak.upgrade() {
                    let callback = shared.on_changed.borrow().clone();
                    callback(&SpinBoxRef { shared });
                }
            }),
        );
        shared.changed_signal.set(Some(id));

        Self {
            control,
            spin: SpinBoxRef { shared },
        }
    }

    pub fn value(&self) -> i64 {
        self.spin.value()
    }

    pub fn set_value(&mut self, value: i64) {
        self.spin.set_value(value)
    }

    /// Replace the change callback.
    pub fn on_changed<F>(&mut self, callback: F)
    where
        F: Fn(&SpinBoxRef) + 'static,
    {
        *self.spin.shared.on_changed.borrow_mut() = Rc::new(callback);
    }

    pub fn range(&self) -> (i64, i64) {
        self.spin.range()
    }

    /// A handle on the value that outlives borrows of the spin box. It stops
    /// tracking the widget once the spin box is destroyed.
    pub fn to_ref(&self) -> SpinBoxRef {
        self.spin.clone()
    }
}

impl SingleWidgetBacked for SpinBox {
    fn single(&self) -> &SingleWidget {
        &self.control
    }

    fn single_mut(&mut self) -> &mut SingleWidget {
        &mut self.control
    }

    fn into_single(self) -> SingleWidget {
        self.control
    }
}
