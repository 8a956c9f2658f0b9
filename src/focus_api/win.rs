use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing::error;
use windows::{
    core::PWSTR,
    Win32::{
        Foundation::{CloseHandle, BOOL},
        System::Threading::{
            OpenProcess, QueryFullProcessImageNameW, PROCESS_NAME_WIN32,
            PROCESS_QUERY_LIMITED_INFORMATION,
        },
        UI::WindowsAndMessaging::{GetForegroundWindow, GetWindowThreadProcessId},
    },
};

use super::{application_name, FocusActivityProvider};

/// Executable path of the process owning the foreground window.
#[tracing::instrument]
pub fn get_foreground_executable() -> Result<String> {
    let window = unsafe { GetForegroundWindow() };
    if window.is_invalid() {
        return Err(anyhow!("Failed to get foreground window"));
    }

    let mut id = 0u32;
    unsafe { GetWindowThreadProcessId(window, Some(&mut id)) };
    if id == 0 {
        return Err(anyhow!(
            "Failed to get process of foreground window {:?}",
            windows::core::Error::from_win32()
        ));
    }

    let process_handle =
        unsafe { OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, BOOL::from(false), id) }
            .inspect_err(|e| error!("Failed to open process {e:?}"))?;

    let mut text = [0u16; 4096];
    let mut length = text.len() as u32;
    let query = unsafe {
        QueryFullProcessImageNameW(
            process_handle,
            PROCESS_NAME_WIN32,
            PWSTR(text.as_mut_ptr()),
            &mut length,
        )
    };
    unsafe { CloseHandle(process_handle) }
        .inspect_err(|e| error!("Failed to close handle {e:?}"))?;
    query?;

    Ok(String::from_utf16_lossy(&text[..length as usize]))
}

#[derive(Default)]
pub struct WindowsFocusProvider {}

impl WindowsFocusProvider {
    pub fn new() -> Self {
        Self {}
    }
}

impl FocusActivityProvider for WindowsFocusProvider {
    fn get_activity_name(&mut self) -> Result<Arc<str>> {
        let executable = get_foreground_executable()
            .inspect_err(|e| error!("Failed to get focused application {e:?}"))?;
        Ok(application_name(&executable))
    }
}
