// ABOUTME: Read and housekeeping commands: list, show, delete, rotate-token, logs, orphans.
// ABOUTME: Renders facade results as tables or JSON depending on the output mode.

use super::app_name;
use super::runtime_connection::App;
use serde::Serialize;
use slipway::application::ObservedApplication;
use slipway::error::Result;
use slipway::orchestrator::LogRequest;
use slipway::output::Output;

pub async fn list(app: &App, output: Output) -> Result<()> {
    let applications = app.list_applications().await?;

    output.data(&applications, |applications| {
        if applications.is_empty() {
            output.progress("No applications");
            return;
        }
        println!("{:<24} {:<20} {:<10} IMAGE", "NAME", "STATUS", "DEPLOYING");
        for observed in applications {
            println!(
                "{:<24} {:<20} {:<10} {}",
                observed.config.name.as_str(),
                observed.status.as_str(),
                observed.config.is_deploying,
                observed.config.image_reference
            );
        }
    });
    Ok(())
}

pub async fn show(app: &App, name: &str, output: Output) -> Result<()> {
    let observed = app.get_application(&app_name(name)?).await?;
    output.data(&observed, print_application);
    Ok(())
}

fn print_application(observed: &ObservedApplication) {
    let config = &observed.config;
    println!("Name:       {}", config.name);
    println!("Image:      {}", config.image_reference);
    println!(
        "Source:     {} ({}) {}",
        config.source_repo_url, config.source_branch, config.build_context_path
    );
    println!("Status:     {}", observed.status);
    if let Some(id) = &config.runtime_id {
        println!("Container:  {}", id.short());
    }
    if config.is_deploying {
        println!("Deploying:  since {:?}", config.deploying_since);
    }
    for binding in &observed.port_bindings {
        println!("Port:       {binding}");
    }
    for var in &observed.env_vars {
        println!("Env:        {}", var.key);
    }
    for volume in &observed.volumes {
        println!("Volume:     {volume}");
    }
    println!("Created:    {}", config.created_at);
    println!("Updated:    {}", config.updated_at);
}

pub async fn delete(app: &App, name: &str, output: Output) -> Result<()> {
    let deleted = app.delete_application(&app_name(name)?).await?;

    for warning in &deleted.warnings {
        output.warning(&warning.message);
    }
    output.success(&format!("Deleted {}", deleted.application.name));
    Ok(())
}

#[derive(Serialize)]
struct RotatedToken<'a> {
    name: &'a str,
    webhook_token: &'a str,
}

pub async fn rotate_token(app: &App, name: &str, output: Output) -> Result<()> {
    let name = app_name(name)?;
    let token = app.rotate_token(&name).await?;

    let rotated = RotatedToken {
        name: name.as_str(),
        webhook_token: token.as_str(),
    };
    output.data(&rotated, |rotated| println!("{}", rotated.webhook_token));
    Ok(())
}

pub async fn logs(
    app: &App,
    name: &str,
    lines: Option<&str>,
    timestamps: bool,
    output: Output,
) -> Result<()> {
    let request = LogRequest::from_query(lines, timestamps);
    let lines = app.fetch_logs(&app_name(name)?, request).await?;

    output.data(&lines, |lines| {
        for line in lines {
            if line.content.ends_with('\n') {
                print!("{}", line.content);
            } else {
                println!("{}", line.content);
            }
        }
    });
    Ok(())
}

pub async fn orphans(app: &App, remove: bool, output: Output) -> Result<()> {
    if !remove {
        let orphans = app.orphaned_containers().await?;
        output.data(&orphans, |orphans| {
            if orphans.is_empty() {
                output.progress("No orphaned containers");
            }
            for container in orphans {
                println!("{} {} {}", container.id.short(), container.name, container.state);
            }
        });
        return Ok(());
    }

    let result = app.remove_orphaned_containers().await?;
    for failure in &result.failures {
        output.warning(&format!(
            "failed to remove {}: {}",
            failure.container.short(),
            failure.error
        ));
    }
    output.data(&result, |result| {
        output.success(&format!("Removed {} orphaned container(s)", result.removed.len()));
    });
    Ok(())
}
