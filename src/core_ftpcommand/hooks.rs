use crate::config::PostHookConfig;
use log::{debug, error, warn};
use std::time::Duration;
use tokio::process::Command;

/// Runs every hook attached to `verb`, in configuration order.
///
/// Hooks get the verb, the argument string and the username as arguments.
/// Failures are logged; they never reach the client.
pub async fn run_post_hooks(hooks: &[PostHookConfig], verb: &str, arg_str: &str, username: &str) {
    for hook in hooks.iter().filter(|hook| hook.verb.eq_ignore_ascii_case(verb)) {
        run_hook(hook, verb, arg_str, username).await;
    }
}

async fn run_hook(hook: &PostHookConfig, verb: &str, arg_str: &str, username: &str) {
    debug!("Running post hook {} for {}", hook.command, verb);
    let child = Command::new(&hook.command)
        .arg(verb)
        .arg(arg_str)
        .arg(username)
        .kill_on_drop(true)
        .status();

    match tokio::time::timeout(Duration::from_secs(hook.timeout_secs.max(1)), child).await {
        Ok(Ok(status)) if status.success() => {}
        Ok(Ok(status)) => warn!("Post hook {} exited with {}", hook.command, status),
        Ok(Err(e)) => error!("Failed to run post hook {}: {}", hook.command, e),
        Err(_) => error!(
            "Post hook {} timed out after {}s",
            hook.command, hook.timeout_secs
        ),
    }
}
