use anyhow::{Result, bail};
use orgsync_application::AppContext;
use std::io::{self, BufRead, Write};

fn read_password(password: Option<String>) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }

    eprint!("Password: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn check_credentials(email: &str, password: &str) -> Result<()> {
    if email.trim().is_empty() {
        bail!("Email is required");
    }
    if password.is_empty() {
        bail!("Password is required");
    }
    Ok(())
}

pub async fn login(app: &AppContext, email: &str, password: Option<String>) -> Result<()> {
    let password = read_password(password)?;
    check_credentials(email, &password)?;

    app.session.sign_in(email.trim(), &password).await?;

    let state = app.session.state();
    let who = state
        .user
        .as_ref()
        .and_then(|user| user.email.clone())
        .unwrap_or_else(|| email.trim().to_string());
    println!("Signed in as {}", who);
    Ok(())
}

pub async fn register(app: &AppContext, email: &str, password: Option<String>) -> Result<()> {
    let password = read_password(password)?;
    check_credentials(email, &password)?;

    let outcome = app.session.sign_up(email.trim(), &password).await?;
    if outcome.requires_confirmation() {
        println!("Account created. Check {} for a confirmation link.", email.trim());
    } else {
        println!("Account created and signed in.");
    }
    Ok(())
}

pub async fn logout(app: &AppContext) -> Result<()> {
    if !app.session.state().is_authenticated() {
        println!("Not signed in.");
        return Ok(());
    }
    app.session.sign_out().await?;
    println!("Signed out.");
    Ok(())
}

pub fn whoami(app: &AppContext) -> Result<()> {
    let state = app.session.state();
    if let Some(error) = &state.error {
        bail!("Could not resolve session: {}", error);
    }
    match &state.user {
        Some(user) => {
            println!("{}", user.email.as_deref().unwrap_or("(no email)"));
            println!("id: {}", user.id);
        }
        None => println!("Not signed in."),
    }
    Ok(())
}
