//! Connecting and (on first run) signing in the listening account.

use grammers_client::{session::Session, Client, Config as ClientConfig, InitParams, SignInError};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

use tgmon_core::{config::Config, errors::Error, Result};

use crate::UserbotSource;

/// Connect with the stored session, signing in interactively if it is not
/// authorized yet, and return the update feed.
pub async fn connect(cfg: &Config) -> Result<UserbotSource> {
    let session_file = cfg.session_file();
    let session = Session::load_file_or_create(&session_file)?;

    let client = Client::connect(ClientConfig {
        session,
        api_id: cfg.api_id,
        api_hash: cfg.api_hash.clone(),
        params: InitParams {
            catch_up: false,
            ..Default::default()
        },
    })
    .await
    .map_err(|e| Error::Session(format!("failed to connect: {e}")))?;

    let authorized = client
        .is_authorized()
        .await
        .map_err(|e| Error::Session(format!("failed to check authorization: {e}")))?;

    if !authorized {
        info!("Session {session_file} is not authorized; signing in");
        sign_in(&client, cfg.phone_number.as_deref()).await?;
        client.session().save_to_file(&session_file)?;
        info!("Signed in; session saved to {session_file}");
    }

    Ok(UserbotSource::new(client))
}

async fn sign_in(client: &Client, phone: Option<&str>) -> Result<()> {
    let phone = match phone {
        Some(p) => p.to_string(),
        None => prompt("Enter your phone number (international format): ").await?,
    };

    let token = client
        .request_login_code(&phone)
        .await
        .map_err(|e| Error::Session(format!("failed to request login code: {e}")))?;
    let code = prompt("Enter the code you received: ").await?;

    match client.sign_in(&token, &code).await {
        Ok(_) => Ok(()),
        Err(SignInError::PasswordRequired(password_token)) => {
            let hint = password_token.hint().unwrap_or("none").to_string();
            let password = prompt(&format!("Enter the 2FA password (hint: {hint}): ")).await?;
            client
                .check_password(password_token, password.trim())
                .await
                .map_err(|e| Error::Session(format!("2FA sign-in failed: {e}")))?;
            Ok(())
        }
        Err(e) => Err(Error::Session(format!("sign-in failed: {e}"))),
    }
}

async fn prompt(question: &str) -> Result<String> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(question.as_bytes()).await?;
    stdout.flush().await?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await?;

    let answer = line.trim().to_string();
    if answer.is_empty() {
        return Err(Error::Session("no input given at login prompt".to_string()));
    }
    Ok(answer)
}
