use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::{Pid, setsid};
use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// Ignores `SIGCHLD` with `SA_NOCLDWAIT` so spawned children never become
/// zombies, then reaps any inherited from a previous exec.
pub fn install_child_reaper() -> nix::Result<()> {
    let action = SigAction::new(
        SigHandler::SigIgn,
        SaFlags::SA_NOCLDSTOP | SaFlags::SA_NOCLDWAIT | SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    unsafe { sigaction(Signal::SIGCHLD, &action) }?;

    loop {
        match waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) | Err(_) => break,
            Ok(status) => debug!(?status, "reaped inherited child"),
        }
    }
    Ok(())
}

/// Launches `argv` in its own session. Failures are logged and otherwise
/// ignored.
pub fn spawn_detached(argv: &[String]) {
    let Some((program, args)) = argv.split_first() else {
        return;
    };

    let mut command = Command::new(program);
    command.args(args).stdin(Stdio::null());
    unsafe {
        command.pre_exec(|| {
            setsid().map_err(std::io::Error::from)?;
            Ok(())
        });
    }

    match command.spawn() {
        Ok(child) => debug!(pid = child.id(), program = %program, "spawned"),
        Err(error) => warn!(%error, program = %program, "failed to spawn"),
    }
}
