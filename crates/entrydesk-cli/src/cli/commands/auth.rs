//! Auth command handlers.

use anyhow::{Context, Result};
use entrydesk_core::api::{ApiClient, Credentials, Registration};
use entrydesk_core::session::Session;
use serde_json::Value;

pub async fn register(
    api: &ApiClient,
    name: String,
    email: String,
    password: String,
    password_confirmation: Option<String>,
) -> Result<()> {
    let registration = Registration {
        name,
        email,
        password_confirmation: password_confirmation.unwrap_or_else(|| password.clone()),
        password,
    };
    let response = api.register(&registration).await.context("register")?;
    match response.message() {
        Some(message) => println!("{message}"),
        None => println!("Registered {}", registration.email),
    }
    Ok(())
}

pub async fn login(api: &ApiClient, email: String, password: String) -> Result<()> {
    let credentials = Credentials { email, password };
    let response = api.login(&credentials).await?;

    let who = response
        .data
        .get("user")
        .and_then(display_user)
        .unwrap_or_else(|| credentials.email.clone());
    if response.token().is_some() {
        println!("Logged in as {who}");
    } else {
        println!("Logged in as {who} (server returned no token)");
    }
    Ok(())
}

pub async fn logout(api: &ApiClient) {
    let response = api.logout().await;
    if let Some(message) = response.message() {
        println!("{message}");
    }
}

pub fn whoami(session: &Session) -> Result<()> {
    let Some(user) = session.user().context("read cached user")? else {
        println!("Not logged in.");
        return Ok(());
    };
    let token_state = if session.token()?.is_some() {
        "active"
    } else {
        "no token"
    };
    println!(
        "{} ({token_state})",
        display_user(&user).unwrap_or_else(|| user.to_string())
    );
    Ok(())
}

fn display_user(user: &Value) -> Option<String> {
    let name = user.get("name").and_then(Value::as_str);
    let email = user.get("email").and_then(Value::as_str);
    match (name, email) {
        (Some(name), Some(email)) => Some(format!("{name} <{email}>")),
        (Some(label), None) | (None, Some(label)) => Some(label.to_string()),
        (None, None) => user.get("id").map(|id| format!("user {id}")),
    }
}
