use std::cell::Cell;
use std::fs::File;
use std::rc::Rc;
use std::sync::Once;

use log::*;

use crate::control::Container;
use crate::platform::HeadlessToolkit;
use crate::toolkit::{Toolkit, Widget, WidgetKind};

static LOGGER: Once = Once::new();

/// Set up a logger once per test binary so we can see what's going on.
pub fn init_logger() {
    LOGGER.call_once(|| {
        let mut logger_config = simplelog::Config::default();
        logger_config.time_format = Some("%H:%M:%S%.6f");
        let path = std::env::temp_dir().join("uicontrol-tests.log");
        if let Ok(file) = File::create(path) {
            let _ = simplelog::CombinedLogger::init(vec![simplelog::WriteLogger::new(
                simplelog::LevelFilter::max(),
                logger_config,
                file,
            )]);
        }
        info!("====================================================================");
    });
}

struct Parent {
    toolkit: Rc<HeadlessToolkit>,
    widget: Widget,
    relayouts: Cell<usize>,
}

impl Container for Parent {
    fn handle(&self) -> Widget {
        self.widget
    }

    fn request_relayout(&self) {
        self.relayouts.set(self.relayouts.get() + 1);
    }
}

impl Drop for Parent {
    fn drop(&mut self) {
        self.toolkit.unref(self.widget);
    }
}

/// A box that counts relayout requests. Dropping it releases the box.
pub struct TestContainer {
    parent: Rc<Parent>,
}

impl TestContainer {
    pub fn new(toolkit: &Rc<HeadlessToolkit>) -> Self {
        let widget = toolkit.create(WidgetKind::Box, &[]);
        toolkit.ref_sink(widget);
        toolkit.show_all(widget);
        Self {
            parent: Rc::new(Parent {
                toolkit: toolkit.clone(),
                widget,
                relayouts: Cell::new(0),
            }),
        }
    }

    pub fn as_parent(&self) -> Rc<dyn Container> {
        self.parent.clone()
    }

    pub fn handle(&self) -> Widget {
        self.parent.widget
    }

    pub fn relayouts(&self) -> usize {
        self.parent.relayouts.get()
    }
}
