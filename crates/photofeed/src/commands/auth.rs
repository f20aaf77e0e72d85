//! Auth subcommand handlers.

use dialoguer::Input;
use url::Url;

use photofeed_api::code_from_redirect;

use crate::cli::{AuthArgs, AuthCommand, GlobalOpts};
use crate::commands::util::{prompt_err, spinner};
use crate::config;
use crate::error::CliError;
use crate::output;

/// Accept either a bare code or the redirect URL the provider landed on.
fn parse_code(input: &str) -> Result<String, CliError> {
    let input = input.trim();
    if let Ok(url) = Url::parse(input) {
        return code_from_redirect(&url).ok_or_else(|| CliError::Validation {
            field: "code".into(),
            reason: "redirect URL does not carry an authorization code".into(),
        });
    }
    if input.is_empty() {
        return Err(CliError::Validation {
            field: "code".into(),
            reason: "authorization code cannot be empty".into(),
        });
    }
    Ok(input.to_owned())
}

pub async fn handle(args: AuthArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (session, _dispatcher) = config::connect(global)?;
    let authorize_url = session
        .api()
        .authorize_url()
        .map_err(photofeed_core::CoreError::from)?;

    match args.command {
        AuthCommand::Url => {
            output::print_output(authorize_url.as_str(), global.quiet);
            Ok(())
        }

        AuthCommand::Login { code } => {
            let raw = match code {
                Some(code) => code,
                None => {
                    eprintln!("Open this URL in a browser and authorize the app:\n\n  {authorize_url}\n");
                    Input::<String>::new()
                        .with_prompt("Authorization code or redirect URL")
                        .interact_text()
                        .map_err(prompt_err)?
                }
            };
            let code = parse_code(&raw)?;

            let pb = spinner(global, "Exchanging authorization code...");
            let result = session.sign_in(&code).await;
            pb.finish_and_clear();
            result?;

            if !global.quiet {
                eprintln!("✓ Access token stored");
            }
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::parse_code;

    #[test]
    fn bare_code_is_trimmed() {
        assert_eq!(parse_code("  abc123 \n").unwrap(), "abc123");
    }

    #[test]
    fn redirect_url_yields_its_code() {
        let code = parse_code("https://unsplash.com/oauth/authorize/native?code=xyz").unwrap();
        assert_eq!(code, "xyz");
    }

    #[test]
    fn redirect_without_code_is_rejected() {
        assert!(parse_code("https://unsplash.com/oauth/authorize/native").is_err());
        assert!(parse_code("   ").is_err());
    }
}
