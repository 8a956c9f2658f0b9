use std::{
    env,
    path::Path,
    process::{Command, Stdio},
};

use anyhow::Result;
use sysinfo::{get_current_pid, Signal, System};
use tracing::info;

/// Terminates every other process running the executable at `name`. Trackers get a chance to
/// store the interval in progress before exiting.
pub fn stop_trackers(name: &Path) {
    let system = System::new_all();
    let current_id = get_current_pid().ok();
    for (pid, process) in system.processes() {
        if Some(*pid) == current_id {
            continue;
        }
        if current_id.is_some() && process.parent() == current_id {
            continue;
        }

        if process.exe().filter(|v| *v == name).is_some() {
            info!("Stopping tracker {pid}");
            // On Windows there is no graceful termination, the process is killed outright.
            if process.kill_with(Signal::Term).is_none() {
                process.kill();
            }
            process.wait();
        }
    }
}

/// Stops running trackers and starts a new one detached from the console.
pub fn restart_tracker(app_dir: &Path) -> Result<()> {
    let executable = env::current_exe()?;
    stop_trackers(&executable);

    let mut command = Command::new(executable);
    command.arg("--dir").arg(app_dir).arg("serve");
    command.stdin(Stdio::null());
    command.stdout(Stdio::null());
    command.stderr(Stdio::null());

    #[cfg(feature = "win")]
    {
        use std::os::windows::process::CommandExt;
        use windows::Win32::System::Threading::DETACHED_PROCESS;
        command.creation_flags(DETACHED_PROCESS.0);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }

    #[allow(clippy::zombie_processes)]
    let child = command.spawn()?;
    println!("Started tracker {}", child.id());
    Ok(())
}
