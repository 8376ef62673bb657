//! Supervises one `llama-server` child process on the Metal path: spawns
//! it with the same argument-construction rules as the containerized
//! workload builder, restarts it with capped exponential backoff on exit,
//! and stops it gracefully (SIGTERM, then a deadline, then SIGKILL).

use std::path::PathBuf;
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::workload::args::build_args;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);
const GRACEFUL_STOP_DEADLINE: Duration = Duration::from_secs(30);

/// One supervised `llama-server` invocation.
pub struct Supervisor {
    binary: PathBuf,
}

impl Supervisor {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self { binary: binary.into() }
    }

    /// Run the supervised child until `stop` is set to `true`. Restarts the
    /// child with exponential backoff (capped at [`MAX_BACKOFF`]) whenever
    /// it exits on its own.
    pub async fn run(&self, model_path: &str, port: u16, gpu_layers: i64, mut stop: watch::Receiver<bool>) {
        let args = build_args(model_path, port, true, gpu_layers);
        let mut backoff = INITIAL_BACKOFF;

        loop {
            if *stop.borrow() {
                return;
            }

            let mut child = match self.spawn(&args) {
                Ok(c) => c,
                Err(e) => {
                    error!(error = %e, binary = %self.binary.display(), "failed to spawn inference binary");
                    if Self::wait_backoff(&mut stop, backoff).await {
                        return;
                    }
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                    continue;
                }
            };
            backoff = INITIAL_BACKOFF;

            tokio::select! {
                status = child.wait() => {
                    match status {
                        Ok(s) if s.success() => info!("inference process exited cleanly, restarting"),
                        Ok(s) => warn!(code = ?s.code(), "inference process exited with failure, restarting"),
                        Err(e) => error!(error = %e, "failed to wait on inference process"),
                    }
                    if Self::wait_backoff(&mut stop, backoff).await {
                        return;
                    }
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                }
                changed = stop.changed() => {
                    if changed.is_ok() && *stop.borrow() {
                        Self::graceful_stop(&mut child).await;
                        return;
                    }
                }
            }
        }
    }

    fn spawn(&self, args: &[String]) -> std::io::Result<Child> {
        Command::new(&self.binary).args(args).kill_on_drop(true).spawn()
    }

    /// Sleep for `backoff`, waking early if a stop is requested. Returns
    /// `true` if the caller should stop instead of retrying.
    async fn wait_backoff(stop: &mut watch::Receiver<bool>, backoff: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(backoff) => false,
            changed = stop.changed() => changed.is_ok() && *stop.borrow(),
        }
    }

    #[cfg(unix)]
    async fn graceful_stop(child: &mut Child) {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        if let Some(id) = child.id() {
            let _ = kill(Pid::from_raw(id as i32), Signal::SIGTERM);
        }

        if tokio::time::timeout(GRACEFUL_STOP_DEADLINE, child.wait()).await.is_err() {
            warn!("inference process did not exit within grace period, force-killing");
            let _ = child.kill().await;
        }
    }

    #[cfg(not(unix))]
    async fn graceful_stop(child: &mut Child) {
        let _ = child.kill().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn restarts_a_process_that_exits_immediately_until_stopped() {
        let supervisor = Supervisor::new("/bin/true");
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            supervisor.run("/dev/null", 0, -1, rx).await;
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn missing_binary_backs_off_and_stops_cleanly() {
        let supervisor = Supervisor::new("/no/such/binary");
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            supervisor.run("/dev/null", 0, -1, rx).await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
    }
}
