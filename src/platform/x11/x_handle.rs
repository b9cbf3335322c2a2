use ::x11::xlib;
use log::*;

use crate::error::PlatformError;

pub struct XHandle {
    conn: xcb::Connection,
    screen_num: i32,
    root: u32,
    root_visual: u32,
    root_depth: u8,
    white_pixel: u32,
}

impl XHandle {
    pub fn new() -> Result<Self, PlatformError> {
        info!("XHandle::new()");
        let (conn, screen_num) = xcb::Connection::connect_with_xlib_display()
            .map_err(|err| PlatformError::Connect(format!("{:?}", err)))?;

        // Xlib owns the queue on a shared connection unless told otherwise.
        conn.set_event_queue_owner(xcb::EventQueueOwner::Xcb);

        let (root, root_visual, root_depth, white_pixel) = {
            let setup = conn.get_setup();
            let screen = setup
                .roots()
                .nth(screen_num as usize)
                .ok_or(PlatformError::NoScreen(screen_num))?;
            (
                screen.root(),
                screen.root_visual(),
                screen.root_depth(),
                screen.white_pixel(),
            )
        };

        Ok(Self {
            conn,
            screen_num,
            root,
            root_visual,
            root_depth,
            white_pixel,
        })
    }

    pub fn flush(&self) {
        self.conn.flush();
    }

    /// Flush and wait until the server has processed every request.
    pub fn sync(&self) {
        self.conn.flush();
        unsafe {
            xlib::XSync(self.conn.get_raw_dpy(), xlib::False);
        }
    }

    pub fn generate_id(&self) -> u32 {
        self.conn.generate_id()
    }

    pub fn conn_ref(&self) -> &xcb::Connection {
        &self.conn
    }

    pub fn screen_num(&self) -> i32 {
        self.screen_num
    }

    pub fn root(&self) -> u32 {
        self.root
    }

    /// Create an unmapped 1x1 child of the root window.
    pub fn create_window(&self) -> u32 {
        let id = self.generate_id();
        let arguments = [
            (xcb::CW_BACK_PIXEL, self.white_pixel),
            (
                xcb::CW_EVENT_MASK,
                xcb::EVENT_MASK_EXPOSURE | xcb::EVENT_MASK_BUTTON_PRESS,
            ),
        ];
        xcb::create_window(
            &self.conn,
            self.root_depth,
            id,
            self.root,
            0,
            0,
            1,
            1,
            0,
            xcb::WINDOW_CLASS_INPUT_OUTPUT as u16,
            self.root_visual,
            &arguments,
        );
        id
    }

    pub fn poll_for_event(&self) -> Option<xcb::GenericEvent> {
        self.conn.poll_for_event()
    }
}

impl Drop for XHandle {
    fn drop(&mut self) {
        info!("XHandle::drop()");
    }
}
