//! Native widgets behind one control interface.
//!
//! [`SingleWidget`](single::SingleWidget) adapts a toolkit widget to the
//! [`Control`](control::Control) interface; [`SpinBox`](spinbox::SpinBox)
//! is a leaf control built on it. Toolkits plug in through
//! [`Toolkit`](toolkit::Toolkit).

extern crate log;

pub mod control;
pub mod error;
pub mod platform;
pub mod single;
pub mod spinbox;
pub mod toolkit;

#[cfg(test)]
mod testing;

pub use crate::control::{Container, Control, Rect, SingleWidgetBacked, Size};
pub use crate::error::{DestroyError, PlatformError};
pub use crate::single::{ControlConfig, SingleWidget};
pub use crate::spinbox::{SpinBox, SpinBoxRef};
pub use crate::toolkit::{Toolkit, Widget, WidgetKind};

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::platform::HeadlessToolkit;

    // run with: RUSTFLAGS="-Z sanitizer=leak" cargo +nightly test --target x86_64-unknown-linux-gnu
    // (for linux)
    #[test]
    fn test_leaks() {
        crate::testing::init_logger();

        let headless = Rc::new(HeadlessToolkit::new());
        let toolkit: Rc<dyn Toolkit> = headless.clone();
        let container = crate::testing::TestContainer::new(&headless);
        let mut widgets = Vec::new();

        for i in 0..100 {
            let mut spin = SpinBox::new(toolkit.clone(), 0, i);
            let mut scrolled = ControlConfig::new(WidgetKind::Label).scrolled(i % 2 == 0).build(toolkit.clone());
            spin.on_changed(|spin| log::trace!("changed to {}", spin.value()));
            spin.set_parent(Some(&container.as_parent()));
            scrolled.set_parent(Some(&container.as_parent()));
            widgets.push(spin.handle());
            widgets.push(scrolled.handle());
            spin.set_parent(None);
            scrolled.set_parent(None);
            assert!(spin.destroy().is_ok());
            assert!(scrolled.destroy().is_ok());
        }

        assert!(widgets.iter().all(|w| !headless.is_alive(*w)));
        assert!(headless.children(container.handle()).is_empty());
    }
}
