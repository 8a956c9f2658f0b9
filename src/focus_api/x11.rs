use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};
use tracing::instrument;
use xcb::{
    x::{Atom, GetProperty, InternAtom, Window, ATOM_ANY},
    Connection,
};

use super::{application_name, FocusActivityProvider};

fn intern_atom(conn: &Connection, name: &[u8]) -> Result<Atom> {
    let reply = conn.wait_for_reply(conn.send_request(&InternAtom {
        only_if_exists: false,
        name,
    }))?;
    Ok(reply.atom())
}

/// Reads the first 32 bit value of a window property.
fn first_property_value<T: Copy + xcb::x::PropEl>(
    conn: &Connection,
    window: Window,
    property: Atom,
) -> Result<Option<T>> {
    let reply = conn.wait_for_reply(conn.send_request(&GetProperty {
        delete: false,
        window,
        property,
        r#type: ATOM_ANY,
        long_offset: 0,
        long_length: 1,
    }))?;
    Ok(reply.value::<T>().first().copied())
}

/// Resolves the focused application through `_NET_ACTIVE_WINDOW` and `_NET_WM_PID`.
pub struct X11FocusProvider {
    connection: Connection,
    root: Window,
    active_window_atom: Atom,
    pid_atom: Atom,
    system: System,
}

impl X11FocusProvider {
    pub fn new() -> Result<Self> {
        let (connection, preferred_screen) = Connection::connect(None)?;
        let root = connection
            .get_setup()
            .roots()
            .nth(preferred_screen.max(0) as usize)
            .context("X11 screen is missing")?
            .root();
        let active_window_atom = intern_atom(&connection, b"_NET_ACTIVE_WINDOW")?;
        let pid_atom = intern_atom(&connection, b"_NET_WM_PID")?;
        Ok(Self {
            connection,
            root,
            active_window_atom,
            pid_atom,
            system: System::new(),
        })
    }

    fn process_name(&mut self, pid: u32) -> Option<Arc<str>> {
        let pid = Pid::from_u32(pid);
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_exe(sysinfo::UpdateKind::OnlyIfNotSet),
        );
        let process = self.system.process(pid)?;
        match process.exe().and_then(|v| v.to_str()) {
            Some(exe) => Some(application_name(exe)),
            None => process.name().to_str().map(application_name),
        }
    }
}

impl FocusActivityProvider for X11FocusProvider {
    #[instrument(skip(self))]
    fn get_activity_name(&mut self) -> Result<Arc<str>> {
        let window: Window =
            first_property_value(&self.connection, self.root, self.active_window_atom)?
                .context("No active window")?;
        let pid: u32 = first_property_value(&self.connection, window, self.pid_atom)?
            .context("Active window has no pid")?;
        self.process_name(pid)
            .ok_or_else(|| anyhow!("Process {pid} of the active window is gone"))
    }
}
