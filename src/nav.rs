use std::process::{Command, ExitStatus, Stdio};

use anyhow::{Context, Result};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const MARKET_BASE_URL: &str = "https://universalis.app/market";

pub fn market_url(item_id: u64) -> String {
    format!("{MARKET_BASE_URL}/{item_id}")
}

/// Hands the market page for `item_id` to the desktop's URL opener.
/// Nothing is read back from the launched process; it is reaped in the background.
/// Must be called from within the tokio runtime.
pub fn open_market_page(item_id: u64) -> Result<()> {
    let url = market_url(item_id);
    spawn_reaped(opener_command(&url), &url)?;
    info!(item_id, url = %url, "Opened market page");
    Ok(())
}

/// Spawns `command` and waits for it on the blocking pool so no zombie is left behind.
fn spawn_reaped(mut command: Command, url: &str) -> Result<JoinHandle<Option<ExitStatus>>> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("Failed to launch URL opener for {url}"))?;
    Ok(tokio::task::spawn_blocking(move || match child.wait() {
        Ok(status) => {
            debug!(%status, "URL opener exited");
            Some(status)
        }
        Err(err) => {
            warn!(error = %err, "Failed to wait for URL opener");
            None
        }
    }))
}

#[cfg(target_os = "macos")]
fn opener_command(url: &str) -> Command {
    let mut command = Command::new("open");
    command.arg(url);
    command
}

#[cfg(target_os = "windows")]
fn opener_command(url: &str) -> Command {
    let mut command = Command::new("cmd");
    command.args(["/C", "start", "", url]);
    command
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn opener_command(url: &str) -> Command {
    let mut command = Command::new("xdg-open");
    command.arg(url);
    command
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_url_uses_item_id() {
        assert_eq!(market_url(41760), "https://universalis.app/market/41760");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn launched_opener_is_waited_on() {
        let handle = spawn_reaped(Command::new("true"), "https://universalis.app/market/1")
            .expect("spawn");
        let status = handle.await.expect("join").expect("exit status");
        assert!(status.success());
    }

    #[tokio::test]
    async fn missing_opener_is_an_error() {
        let err = spawn_reaped(
            Command::new("/nonexistent/materia-board-opener"),
            "https://universalis.app/market/1",
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("URL opener"));
    }

    #[test]
    fn opener_receives_the_url() {
        let command = opener_command("https://universalis.app/market/1");
        let args: Vec<String> = command
            .get_args()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args.last().map(String::as_str),
            Some("https://universalis.app/market/1")
        );
    }
}
