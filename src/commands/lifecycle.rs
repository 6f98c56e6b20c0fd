// ABOUTME: Container lifecycle commands: start, stop, restart, pause, unpause.
// ABOUTME: Each acts on the application's recorded container only.

use super::app_name;
use super::runtime_connection::App;
use slipway::error::Result;
use slipway::output::Output;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Start,
    Stop,
    Restart,
    Pause,
    Unpause,
}

impl Action {
    fn past_tense(self) -> &'static str {
        match self {
            Action::Start => "Started",
            Action::Stop => "Stopped",
            Action::Restart => "Restarted",
            Action::Pause => "Paused",
            Action::Unpause => "Unpaused",
        }
    }
}

pub async fn lifecycle(app: &App, action: Action, name: &str, output: Output) -> Result<()> {
    let name = app_name(name)?;

    match action {
        Action::Start => app.start_application(&name).await?,
        Action::Stop => app.stop_application(&name).await?,
        Action::Restart => app.restart_application(&name).await?,
        Action::Pause => app.pause_application(&name).await?,
        Action::Unpause => app.unpause_application(&name).await?,
    }

    output.success(&format!("{} {name}", action.past_tense()));
    Ok(())
}
