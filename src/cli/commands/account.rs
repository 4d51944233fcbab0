use anyhow::Context;
use std::io::Write;

use crate::services::AuthError;
use crate::state::SharedState;

fn prompt(label: &str) -> anyhow::Result<String> {
    print!("{label}: ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn report(err: &AuthError) {
    println!("⚠ {err}");
}

pub async fn cmd_login(
    state: &SharedState,
    username: &str,
    password: Option<String>,
) -> anyhow::Result<()> {
    let auth = state.auth()?;
    let password = match password {
        Some(p) => p,
        None => prompt("Password")?,
    };

    match auth.login(username, &password).await {
        Ok(user) => println!("✓ Signed in as {} <{}>", user.full_name, user.email),
        Err(e) => report(&e),
    }
    Ok(())
}

pub async fn cmd_signup(
    state: &SharedState,
    name: &str,
    email: &str,
    password: Option<String>,
) -> anyhow::Result<()> {
    let auth = state.auth()?;
    let password = match password {
        Some(p) => p,
        None => {
            let first = prompt("Password")?;
            if prompt("Confirm password")? != first {
                println!("⚠ Passwords do not match");
                return Ok(());
            }
            first
        }
    };

    match auth.sign_up(name, email, &password).await {
        Ok(user) => println!("✓ Account created for {}", user.email),
        Err(e) => report(&e),
    }
    Ok(())
}

pub async fn cmd_logout(state: &SharedState) -> anyhow::Result<()> {
    let auth = state.auth()?;
    if !auth.is_authenticated().await {
        println!("Not signed in.");
        return Ok(());
    }

    match auth.logout().await {
        Ok(()) => println!("✓ Signed out"),
        Err(e) => report(&e),
    }
    Ok(())
}

pub async fn cmd_whoami(state: &SharedState) -> anyhow::Result<()> {
    let auth = state.auth()?;
    auth.refresh_user().await;

    match auth.user().await {
        Some(user) => {
            println!("Name:     {}", user.full_name);
            println!("Email:    {}", user.email);
            if let Some(username) = &user.username {
                println!("Username: {username}");
            }
        }
        None => println!("Not signed in."),
    }
    Ok(())
}

pub async fn cmd_forgot_password(state: &SharedState, email: &str) -> anyhow::Result<()> {
    match state.auth()?.forgot_password(email).await {
        Ok(message) => println!("✓ {message}"),
        Err(e) => report(&e),
    }
    Ok(())
}
