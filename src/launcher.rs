use std::process::{Child, Command, Stdio};
use std::thread;

use crate::mailto::LinkError;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("failed to build mail link: {0}")]
    Link(#[from] LinkError),
    #[error("failed to start {program}: {source}")]
    Launch {
        program: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("no mail handler opener is known for this platform")]
    Unsupported,
}

/// Hands a `mailto:` link to whatever opens it.
///
/// Success only means the request left the process; nothing reports whether
/// a composer opened or a message was sent.
pub trait MailLauncher: Send + Sync {
    fn launch(&self, uri: &str) -> Result<(), DispatchError>;
}

impl<F> MailLauncher for F
where
    F: Fn(&str) -> Result<(), DispatchError> + Send + Sync,
{
    fn launch(&self, uri: &str) -> Result<(), DispatchError> {
        (self)(uri)
    }
}

/// Opens links with the desktop's default handler.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemMailLauncher;

impl MailLauncher for SystemMailLauncher {
    fn launch(&self, uri: &str) -> Result<(), DispatchError> {
        let (program, mut command) = opener_command(uri)?;
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        let child = command
            .spawn()
            .map_err(|source| DispatchError::Launch { program, source })?;
        reap_in_background(program, child);
        Ok(())
    }
}

/// Waits for the opener on a detached thread so it does not linger as a zombie.
fn reap_in_background(program: &'static str, mut child: Child) {
    let spawned = thread::Builder::new()
        .name(format!("{program}-reaper"))
        .spawn(move || {
            if let Err(error) = child.wait() {
                tracing::debug!(program, %error, "failed to reap mail opener");
            }
        });
    if let Err(error) = spawned {
        tracing::warn!(program, %error, "failed to start mail opener reaper");
    }
}

#[cfg(target_os = "windows")]
fn opener_command(uri: &str) -> Result<(&'static str, Command), DispatchError> {
    // `cmd /C start` would split the link at `&`.
    let mut command = Command::new("rundll32");
    command.args(["url.dll,FileProtocolHandler", uri]);
    Ok(("rundll32", command))
}

#[cfg(target_os = "macos")]
fn opener_command(uri: &str) -> Result<(&'static str, Command), DispatchError> {
    let mut command = Command::new("open");
    command.arg(uri);
    Ok(("open", command))
}

#[cfg(all(unix, not(target_os = "macos")))]
fn opener_command(uri: &str) -> Result<(&'static str, Command), DispatchError> {
    let mut command = Command::new("xdg-open");
    command.arg(uri);
    Ok(("xdg-open", command))
}

#[cfg(not(any(unix, target_os = "windows")))]
fn opener_command(_uri: &str) -> Result<(&'static str, Command), DispatchError> {
    Err(DispatchError::Unsupported)
}
