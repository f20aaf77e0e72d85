//! Config subcommand handlers.

use dialoguer::{Input, Password, Select};
use secrecy::SecretString;

use photofeed_config::Config;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::commands::util::prompt_err;
use crate::config;
use crate::error::CliError;
use crate::output;

const REDACTED: &str = "****";

// ── Helpers ─────────────────────────────────────────────────────────

/// The config as shown to the user: secrets masked.
fn redact(cfg: &Config) -> Config {
    Config {
        secret_key: cfg.secret_key.as_ref().map(|_| REDACTED.into()),
        ..cfg.clone()
    }
}

/// Format config for display as TOML-ish key/value lines.
fn format_config(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    let _ = writeln!(out, "api_base = \"{}\"", cfg.api_base);
    let _ = writeln!(out, "auth_base = \"{}\"", cfg.auth_base);
    match cfg.access_key {
        Some(ref key) => {
            let _ = writeln!(out, "access_key = \"{key}\"");
        }
        None => {
            let _ = writeln!(out, "# access_key not set");
        }
    }
    match cfg.secret_key {
        Some(ref secret) => {
            let _ = writeln!(out, "secret_key = \"{secret}\"");
        }
        None => {
            let _ = writeln!(out, "# secret_key read from keyring");
        }
    }
    let _ = writeln!(out, "redirect_uri = \"{}\"", cfg.redirect_uri);
    let _ = writeln!(out, "scope = \"{}\"", cfg.scope);
    let _ = writeln!(out, "per_page = {}", cfg.per_page);
    let _ = writeln!(out, "prefetch_threshold = {}", cfg.prefetch_threshold);
    let _ = write!(out, "timeout = {}", cfg.timeout);
    out
}

/// Offer to store the app secret in the system keyring.
///
/// Returns `Some(secret)` if the user chose plaintext, `None` if stored in
/// the keyring.
fn prompt_secret_storage(secret: String) -> Result<Option<String>, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt("Where should the secret key be stored?")
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection == 0 {
        photofeed_config::store_secret_key(&SecretString::from(secret))?;
        eprintln!("   ✓ secret key stored in system keyring");
        Ok(None)
    } else {
        Ok(Some(secret))
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => {
            let defaults = Config::default();
            eprintln!("Register an application with the photo API to get an access and secret key.\n");

            let access_key: String = Input::new()
                .with_prompt("Access key")
                .interact_text()
                .map_err(prompt_err)?;
            let secret = Password::new()
                .with_prompt("Secret key")
                .interact()
                .map_err(prompt_err)?;
            if access_key.trim().is_empty() || secret.is_empty() {
                return Err(CliError::Validation {
                    field: "credentials".into(),
                    reason: "access key and secret key cannot be empty".into(),
                });
            }
            let per_page: u32 = Input::new()
                .with_prompt("Photos per page")
                .default(defaults.per_page)
                .interact_text()
                .map_err(prompt_err)?;

            let cfg = Config {
                access_key: Some(access_key.trim().to_owned()),
                secret_key: prompt_secret_storage(secret)?,
                per_page,
                ..defaults
            };
            let path = photofeed_config::save_config(&cfg)?;
            eprintln!("✓ Config written to {}", path.display());
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = redact(&config::load_config(global)?);
            let out = output::render_single(
                global.output,
                &cfg,
                format_config,
                |c| c.api_base.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(
                &photofeed_config::config_path().display().to_string(),
                global.quiet,
            );
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redact_masks_only_the_secret() {
        let cfg = Config {
            access_key: Some("public".into()),
            secret_key: Some("hunter2".into()),
            ..Config::default()
        };
        let shown = format_config(&redact(&cfg));
        assert!(shown.contains("access_key = \"public\""));
        assert!(shown.contains("secret_key = \"****\""));
        assert!(!shown.contains("hunter2"));
    }

    #[test]
    fn missing_secret_points_at_keyring() {
        let shown = format_config(&redact(&Config::default()));
        assert!(shown.contains("# secret_key read from keyring"));
    }
}
