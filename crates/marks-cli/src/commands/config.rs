use std::env;

use marks_core::config::RemoteConfig;

use crate::cli::ConfigCommands;
use crate::config_profiles::{is_http_url, normalize_text_option, CliProfile, CliProfilesConfig};
use crate::error::CliError;

pub fn run_config(command: ConfigCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            supabase_url,
            supabase_anon_key,
            table,
            channel,
            no_activate,
        } => run_config_init(
            global_profile,
            ProfileInput {
                supabase_url,
                supabase_anon_key,
                table,
                realtime_channel: channel,
            },
            no_activate,
        ),
    }
}

/// Values given on the command line; unset fields keep their previous value.
#[derive(Debug, Default)]
pub struct ProfileInput {
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    pub table: Option<String>,
    pub realtime_channel: Option<String>,
}

pub fn run_config_init(
    profile_name: Option<&str>,
    input: ProfileInput,
    no_activate: bool,
) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);
    let existing_profile = config.profile(&profile_name).cloned().unwrap_or_default();

    let profile = merge_profile(
        &existing_profile,
        input,
        env::var("SUPABASE_URL").ok(),
        env::var("SUPABASE_ANON_KEY").ok(),
    );
    validate_profile(&profile)?;
    *config.profile_mut_or_default(&profile_name) = profile.clone();

    if !no_activate {
        config.active_profile = Some(profile_name.clone());
    }

    let path = config.save().map_err(CliError::Config)?;
    println!(
        "Profile '{}' initialized at {}",
        profile_name,
        path.display()
    );

    let missing_fields = missing_fields(&profile);
    if missing_fields.is_empty() {
        println!(
            "Profile '{profile_name}' is ready. Run `marks auth login --email <email> --password <password>`."
        );
    } else {
        println!(
            "Profile '{}' is missing: {}",
            profile_name,
            missing_fields.join(", ")
        );
    }

    Ok(())
}

/// Explicit flags win over environment values, which win over the saved profile.
pub fn merge_profile(
    existing: &CliProfile,
    input: ProfileInput,
    env_url: Option<String>,
    env_anon_key: Option<String>,
) -> CliProfile {
    CliProfile {
        supabase_url: normalize_text_option(input.supabase_url)
            .or_else(|| normalize_text_option(env_url))
            .or_else(|| existing.supabase_url()),
        supabase_anon_key: normalize_text_option(input.supabase_anon_key)
            .or_else(|| normalize_text_option(env_anon_key))
            .or_else(|| existing.supabase_anon_key()),
        table: normalize_text_option(input.table)
            .or_else(|| normalize_text_option(existing.table.clone())),
        realtime_channel: normalize_text_option(input.realtime_channel)
            .or_else(|| normalize_text_option(existing.realtime_channel.clone())),
    }
}

pub fn validate_profile(profile: &CliProfile) -> Result<(), CliError> {
    if let Some(url) = profile.supabase_url() {
        if !is_http_url(&url) {
            return Err(CliError::Config(
                "supabase_url must include http:// or https://".to_string(),
            ));
        }
        if let Some(anon_key) = profile.supabase_anon_key() {
            RemoteConfig::new(&url, &anon_key)?;
        }
    }
    Ok(())
}

pub fn missing_fields(profile: &CliProfile) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if profile.supabase_url().is_none() {
        missing.push("supabase_url");
    }
    if profile.supabase_anon_key().is_none() {
        missing.push("supabase_anon_key");
    }
    missing
}
