//! Contains logic for finding out which application currently has focus.
//! [GenericFocusProvider] is the main artifact of this module that abstracts
//! the platforms.

#[cfg(feature = "win")]
pub mod win;
#[cfg(feature = "x11")]
pub mod x11;

#[cfg(feature = "win")]
extern crate windows;

#[cfg(feature = "x11")]
extern crate xcb;

use std::sync::Arc;

use anyhow::Result;

/// Capability every platform binding must implement. Polled by the tracker.
#[cfg_attr(test, mockall::automock)]
pub trait FocusActivityProvider {
    /// Name of the application that currently has focus. For example `firefox` or `Code`.
    fn get_activity_name(&mut self) -> Result<Arc<str>>;
}

/// Serves as a cross-compatible FocusActivityProvider implementation.
pub struct GenericFocusProvider {
    inner: Box<dyn FocusActivityProvider>,
}

impl GenericFocusProvider {
    pub fn new() -> Result<Self> {
        cfg_if::cfg_if! {
            if #[cfg(feature = "win")] {
                use win::WindowsFocusProvider;
                Ok(Self {
                    inner: Box::new(WindowsFocusProvider::new()),
                })
            }
            else if #[cfg(feature = "x11")] {
                use x11::X11FocusProvider;
                Ok(Self {
                    inner: Box::new(X11FocusProvider::new()?),
                })
            }
            else {
                Err(anyhow::anyhow!(
                    "No focus provider available. Build with the `x11` or `win` feature"
                ))
            }
        }
    }
}

impl FocusActivityProvider for GenericFocusProvider {
    fn get_activity_name(&mut self) -> Result<Arc<str>> {
        self.inner.get_activity_name()
    }
}

/// Turns a path to an executable into an application name. `/usr/bin/nvim` becomes `nvim`,
/// `C:\Program Files\Code.exe` becomes `Code`.
pub fn application_name(executable: &str) -> Arc<str> {
    let file_name = executable
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .filter(|v| !v.is_empty())
        .unwrap_or(executable);
    let name = file_name
        .strip_suffix(".exe")
        .or_else(|| file_name.strip_suffix(".EXE"))
        .unwrap_or(file_name);
    name.into()
}

#[cfg(test)]
mod tests {
    use super::application_name;

    #[test]
    fn application_names() {
        assert_eq!(application_name("/usr/bin/nvim").as_ref(), "nvim");
        assert_eq!(
            application_name(r"C:\Program Files\Microsoft VS Code\Code.exe").as_ref(),
            "Code"
        );
        assert_eq!(application_name("PyCharm").as_ref(), "PyCharm");
    }
}
