// The headless toolkit is always available; native backends are opt-in features.
pub mod headless;
pub(crate) mod store;

// Anything that uses X11 (Linux, BSD, etc.)
#[cfg(all(feature = "x11-backend", unix, not(target_os = "macos")))]
pub mod x11;

pub use self::headless::HeadlessToolkit;
#[cfg(all(feature = "x11-backend", unix, not(target_os = "macos")))]
pub use self::x11::X11Toolkit;
