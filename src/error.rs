use std::fmt;

/// Returned by [`Control::destroy`](crate::control::Control::destroy) when
/// the control still has a parent.
///
/// This is a defect in the caller: controls must be unparented before they
/// are destroyed. Nothing has been released, and the control can be recovered
/// with [`into_inner`](DestroyError::into_inner).
#[derive(thiserror::Error)]
#[error("attempt to destroy a control while it still has a parent")]
pub struct DestroyError<C> {
    control: C,
}

impl<C> DestroyError<C> {
    pub(crate) fn new(control: C) -> Self {
        Self { control }
    }

    pub fn into_inner(self) -> C {
        self.control
    }
}

impl<C> fmt::Debug for DestroyError<C> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("DestroyError").finish()
    }
}

/// Errors from bringing up a native platform.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("could not connect to the display: {0}")]
    Connect(String),

    #[error("screen {0} does not exist")]
    NoScreen(i32),
}
