// ABOUTME: Create and notify command implementations.
// ABOUTME: Both trigger the build pipeline and stay attached until it finishes.

use super::runtime_connection::App;
use slipway::config::Manifest;
use slipway::deploy::{DeployFailure, DeployReport};
use slipway::diagnostics::Warning;
use slipway::error::{Error, Result};
use slipway::orchestrator::Triggered;
use slipway::output::Output;
use slipway::types::WebhookToken;
use std::path::Path;

/// Register the application described by `manifest` and run its first deployment.
pub async fn create(app: &App, manifest: &Path, mut output: Output) -> Result<()> {
    output.start_timer();
    let request = Manifest::load(manifest)?.into_request()?;

    output.progress(&format!(
        "Creating {} ({})",
        request.name, request.image_reference
    ));
    let triggered = app.create_application(request).await?;
    output.progress(&format!(
        "  → Webhook token: {}",
        triggered.application.webhook_token.as_str()
    ));

    finish(triggered, &output).await
}

/// Redeploy whichever application owns `token`.
pub async fn notify(app: &App, token: &str, mut output: Output) -> Result<()> {
    output.start_timer();
    let token = WebhookToken::from_caller(token);

    let triggered = app.redeploy_on_notification(&token).await?;
    output.progress(&format!("Redeploying {}", triggered.application.name));

    finish(triggered, &output).await
}

/// Wait for the pipeline; the process hosts it, so exiting early would abort it.
async fn finish(triggered: Triggered, output: &Output) -> Result<()> {
    let name = triggered.application.name.clone();
    output.progress("  → Building...");

    let outcome = triggered.completion.await.map_err(|e| Error::ContainerOperationFailed {
        operation: "deploy",
        message: e.to_string(),
    })?;

    match outcome {
        Ok(report) => {
            emit_warnings(&report.warnings, output);
            output.data(&report, |report: &DeployReport| {
                let steps: Vec<String> = report.steps.iter().map(ToString::to_string).collect();
                output.progress(&format!("  → Steps: {}", steps.join(" → ")));
            });
            let container = report
                .config
                .runtime_id
                .as_ref()
                .map(|id| id.short().to_string())
                .unwrap_or_default();
            output.success(&format!("Deployed {name} (container {container})"));
            Ok(())
        }
        Err(DeployFailure {
            error,
            steps,
            warnings,
        }) => {
            emit_warnings(&warnings, output);
            if let Some(last) = steps.last() {
                output.progress(&format!("  ✗ Failed during {last}"));
            }
            Err(error.into())
        }
    }
}

fn emit_warnings(warnings: &[Warning], output: &Output) {
    for warning in warnings {
        output.warning(&warning.message);
    }
}
