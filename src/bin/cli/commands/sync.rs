use anyhow::Result;

use flashdrill_lib::sync::{PullTrigger, WebDAVError, WebDavRemote};
use flashdrill_lib::AppConfig;

use crate::app::App;
use crate::render::terminal::sync_badge;
use crate::OutputFormat;

/// Reachability of the configured server; `None` when no remote is set
async fn check_server(app: &App) -> Option<std::result::Result<bool, WebDAVError>> {
    let config = app.ctx.config().remote.as_ref()?;
    let remote = match WebDavRemote::new(config) {
        Ok(remote) => remote,
        Err(e) => return Some(Err(e)),
    };
    Some(remote.test_connection().await)
}

fn describe_server(check: &std::result::Result<bool, WebDAVError>) -> String {
    match check {
        Ok(true) => "reachable".to_string(),
        Ok(false) => "answered with an error status".to_string(),
        Err(e) => e.to_string(),
    }
}

pub async fn run(app: &App, format: &OutputFormat, use_color: bool) -> Result<()> {
    let sync = app.ctx.sync();
    let server = check_server(app).await;
    let result = sync.pull(PullTrigger::Manual).await;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "remote": sync.has_remote(),
                "reachable": server.as_ref().map(|check| matches!(check, Ok(true))),
                "status": sync.status(),
                "error": result.as_ref().err().map(|e| e.to_string()),
                "customSets": sync.custom_sets().len(),
                "overrides": sync.overrides().len(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            let Some(check) = server.as_ref() else {
                println!(
                    "No [remote] in {}; using local data only",
                    AppConfig::path_in(&app.data_dir).display()
                );
                return Ok(());
            };
            println!("Server: {}", describe_server(check));
            match &result {
                Ok(()) => println!(
                    "{} pulled {} custom sets, {} priority overrides",
                    sync_badge(sync.status(), use_color),
                    sync.custom_sets().len(),
                    sync.overrides().len()
                ),
                Err(e) => println!("{} {} (local data kept)", sync_badge(sync.status(), use_color), e),
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_server() {
        assert_eq!(describe_server(&Ok(true)), "reachable");
        assert_eq!(describe_server(&Ok(false)), "answered with an error status");
        assert_eq!(describe_server(&Err(WebDAVError::AuthFailed)), "Authentication failed");
    }
}
