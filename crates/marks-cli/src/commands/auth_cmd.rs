use marks_core::remote::SessionSource;
use tracing::warn;

use crate::auth::{clear_stored_session, load_stored_session};
use crate::cli::AuthCommands;
use crate::commands::common::open_remote;
use crate::config_profiles::CliProfilesConfig;
use crate::error::CliError;

pub async fn run_auth(command: AuthCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        AuthCommands::Login { email, password } => {
            let (profile_name, remote) = open_remote(global_profile)?;
            let session = remote
                .auth()
                .sign_in(&email, &password)
                .await
                .map_err(|error| CliError::Auth(error.to_string()))?;
            println!(
                "Signed in profile '{profile_name}' as {}",
                session.email_label()
            );
            Ok(())
        }
        AuthCommands::Status => {
            let config = CliProfilesConfig::load().map_err(CliError::Config)?;
            let profile_name = config.resolve_profile_name(global_profile);
            let session = match open_remote(Some(&profile_name)) {
                Ok((_, remote)) => remote
                    .get_session()
                    .await
                    .map_err(|error| CliError::Auth(error.to_string()))?,
                Err(CliError::NotConfigured(_)) => {
                    println!("Profile '{profile_name}' is not configured.");
                    return Ok(());
                }
                Err(error) => return Err(error),
            };

            if let Some(session) = session {
                println!(
                    "Profile '{}' is signed in as {} (expires_at={})",
                    profile_name,
                    session.email_label(),
                    session.expires_at
                );
            } else {
                println!("Profile '{profile_name}' is not signed in.");
            }
            Ok(())
        }
        AuthCommands::Logout => {
            let config = CliProfilesConfig::load().map_err(CliError::Config)?;
            let profile_name = config.resolve_profile_name(global_profile);
            let stored_session = load_stored_session(&profile_name)
                .map_err(|error| CliError::Auth(error.to_string()))?;

            if stored_session.is_some() {
                match open_remote(Some(&profile_name)) {
                    Ok((_, remote)) => {
                        if let Err(error) = remote.sign_out().await {
                            warn!(%error, "Remote sign out failed");
                        }
                    }
                    Err(error) => warn!(%error, "Skipping remote sign out"),
                }
            }
            clear_stored_session(&profile_name)
                .map_err(|error| CliError::Auth(error.to_string()))?;

            println!("Signed out profile '{profile_name}'");
            Ok(())
        }
    }
}
