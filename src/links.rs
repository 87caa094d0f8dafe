use std::io;
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use tracing::{info, warn};

/// Opens a URL outside the terminal.
pub trait LinkOpener {
    fn open(&self, url: &str) -> io::Result<()>;
}

/// Hands the URL to the desktop's default handler.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemOpener;

impl SystemOpener {
    fn command(url: &str) -> Command {
        if cfg!(target_os = "macos") {
            let mut c = Command::new("open");
            c.arg(url);
            c
        } else if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.args(["/C", "start", "", url]);
            c
        } else {
            let mut c = Command::new("xdg-open");
            c.arg(url);
            c
        }
    }
}

impl LinkOpener for SystemOpener {
    fn open(&self, url: &str) -> io::Result<()> {
        launch(Self::command(url))?;
        info!(%url, "Opened platform search");
        Ok(())
    }
}

/// Spawns `cmd` with its output silenced and reaps it on a helper thread,
/// so finished openers don't linger as zombies.
fn launch(mut cmd: Command) -> io::Result<JoinHandle<io::Result<ExitStatus>>> {
    // Child output would corrupt the TUI.
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    Ok(thread::spawn(move || {
        let status = child.wait();
        match &status {
            Ok(s) if !s.success() => warn!(%s, "Link opener exited unsuccessfully"),
            Err(e) => warn!("Could not wait on link opener: {}", e),
            _ => {}
        }
        status
    }))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn launched_child_is_reaped() {
        let handle = launch(Command::new("true")).unwrap();
        let status = handle.join().unwrap().unwrap();
        assert!(status.success());
    }

    #[test]
    fn failing_child_reports_its_status() {
        let handle = launch(Command::new("false")).unwrap();
        let status = handle.join().unwrap().unwrap();
        assert!(!status.success());
    }

    #[test]
    fn missing_program_is_an_error() {
        assert!(launch(Command::new("basket-tui-no-such-opener")).is_err());
    }
}
