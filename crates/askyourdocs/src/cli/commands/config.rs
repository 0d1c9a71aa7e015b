//! Implementation of `askyourdocs config`.

use std::process::ExitCode;

use ayd_config::{CONFIG_FILENAME, ConfigError, EmbeddingProvider, format_value};

use super::shared::confirm;
use crate::cli::{args::ConfigAction, context::CommandContext, output::print_error};

/// Runs a `config` action.
pub fn run(ctx: &CommandContext, action: &ConfigAction) -> ExitCode {
    match action {
        ConfigAction::Show => show(ctx),
        ConfigAction::Get { key } => get(ctx, key),
        ConfigAction::Set { key, value, local } => set(ctx, key, value, *local),
        ConfigAction::Reset(args) => reset(ctx, args.yes),
        ConfigAction::Path => path(ctx),
        ConfigAction::Validate => validate(ctx),
    }
}

/// Prints a configuration error with a hint for the common cases.
fn config_failure(error: &ConfigError) -> ExitCode {
    let hint = match error {
        ConfigError::UnknownKey { .. } => {
            Some("run 'askyourdocs config show' to list the available keys".to_string())
        }
        ConfigError::Invalid { .. } | ConfigError::Parse { .. } => {
            Some("fix the file or run 'askyourdocs config reset'".to_string())
        }
        _ => None,
    };
    print_error(error, hint)
}

/// Prints the effective configuration as YAML.
fn show(ctx: &CommandContext) -> ExitCode {
    match ctx.config.to_yaml() {
        Ok(yaml) => {
            print!("{}", ctx.palette.yaml(&yaml));
            ExitCode::SUCCESS
        }
        Err(e) => config_failure(&e),
    }
}

/// Prints one effective value.
fn get(ctx: &CommandContext, key: &str) -> ExitCode {
    match ctx.config.get_value(key) {
        Ok(value) => {
            println!("{}", format_value(&value));
            ExitCode::SUCCESS
        }
        Err(e) => config_failure(&e),
    }
}

/// Sets one value in the global or project file.
fn set(ctx: &CommandContext, key: &str, value: &str, local: bool) -> ExitCode {
    let written = if local {
        ctx.manager.set_local_value(&ctx.cwd, key, value)
    } else {
        ctx.manager
            .set_value(key, value)
            .map(|_| ctx.manager.config_file.clone())
    };
    match written {
        Ok(path) => {
            println!(
                "{} {key} = {value} {}",
                ctx.palette.success("Set"),
                ctx.palette.dim(&format!("({})", ctx.display_path(&path)))
            );
            ExitCode::SUCCESS
        }
        Err(e) => config_failure(&e),
    }
}

/// Restores the default global configuration.
fn reset(ctx: &CommandContext, yes: bool) -> ExitCode {
    let file = ctx.manager.config_file.display().to_string();
    if !yes && !confirm(&format!("Reset {file} to the defaults?")) {
        println!("Aborted.");
        return ExitCode::SUCCESS;
    }
    match ctx.manager.reset() {
        Ok(_) => {
            println!("{} {file}", ctx.palette.success("Reset"));
            ExitCode::SUCCESS
        }
        Err(e) => config_failure(&e),
    }
}

/// Prints configuration and data locations.
fn path(ctx: &CommandContext) -> ExitCode {
    let manager = &ctx.manager;
    println!("Config file:   {}", manager.config_file.display());
    println!("Project file:  {}", ctx.cwd.join(CONFIG_FILENAME).display());
    println!("Data dir:      {}", manager.data_dir.display());
    println!("Cache dir:     {}", manager.cache_dir.display());
    ExitCode::SUCCESS
}

/// Reports whether the effective configuration is valid.
///
/// Invalid files already fail while loading, so reaching this point means
/// every file parsed. The remaining checks cover the environment.
fn validate(ctx: &CommandContext) -> ExitCode {
    let palette = ctx.palette;
    let config = &ctx.config;
    let issues = config.validate();
    if !issues.is_empty() {
        for issue in &issues {
            eprintln!("   {}", palette.warning(&issue.to_string()));
        }
        return print_error(&format!("{} configuration problem(s)", issues.len()), None);
    }

    let mut warnings = Vec::new();
    if let Some(env_var) = config.model.provider.api_key_env()
        && config.model.resolved_api_key().is_none()
    {
        warnings.push(format!(
            "model.provider is {} but no API key is set (model.api_key or {env_var})",
            config.model.provider
        ));
    }
    if config.embedding.provider == EmbeddingProvider::OpenAi
        && config.embedding.resolved_api_key().is_none()
    {
        warnings.push(
            "embedding.provider is openai but no API key is set (embedding.api_key or OPENAI_API_KEY)"
                .to_string(),
        );
    }

    println!("{}", palette.subheader("Config files:"));
    for source in &config.sources {
        println!("   {}", ctx.display_path(source));
    }
    for warning in &warnings {
        println!("{}", palette.warning(&format!("warning: {warning}")));
    }
    println!("{}", palette.success("Configuration is valid."));
    ExitCode::SUCCESS
}
