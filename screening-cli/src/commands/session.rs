use std::io::{self, BufRead};

use anyhow::{Result, bail};
use clap::Args;
use rpassword::prompt_password;
use shared::models::{LoginRequest, SignupRequest};

use super::{AppContext, prompt, titled};

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account email; prompted for when omitted
    #[arg(long, short)]
    pub email: Option<String>,

    /// Read the password from the first line of stdin instead of prompting
    #[arg(long)]
    pub password_stdin: bool,
}

#[derive(Args, Debug)]
pub struct SignupArgs {
    /// Display name; prompted for when omitted
    #[arg(long, short)]
    pub name: Option<String>,

    /// Account email; prompted for when omitted
    #[arg(long, short)]
    pub email: Option<String>,

    /// Read the password from the first line of stdin instead of prompting
    #[arg(long)]
    pub password_stdin: bool,
}

pub async fn login(ctx: &AppContext, args: LoginArgs) -> Result<()> {
    let email = field(args.email, "Email: ")?;
    let password = password(args.password_stdin)?;

    let api = ctx.api()?;
    let response = api
        .login(&LoginRequest {
            email: email.clone(),
            password,
        })
        .await
        .map_err(titled("Login Failed"))?;

    println!("Logged in as {email}");
    if let Some(message) = response.message.filter(|m| !m.trim().is_empty()) {
        println!("{message}");
    }
    Ok(())
}

pub async fn signup(ctx: &AppContext, args: SignupArgs) -> Result<()> {
    let name = field(args.name, "Name: ")?;
    let email = field(args.email, "Email: ")?;
    let password = password(args.password_stdin)?;

    let api = ctx.api()?;
    let response = api
        .signup(&SignupRequest {
            name,
            email: email.clone(),
            password,
        })
        .await
        .map_err(titled("Signup Failed"))?;

    println!(
        "{}",
        response
            .message
            .unwrap_or_else(|| format!("Account created for {email}"))
    );
    println!("Run `screening login` to sign in.");
    Ok(())
}

pub async fn logout(ctx: &AppContext) -> Result<()> {
    ctx.api()?.logout().await.map_err(titled("Logout Failed"))?;
    println!("Logged out");
    Ok(())
}

fn field(value: Option<String>, label: &str) -> Result<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        Some(_) => bail!("{} must not be empty", label.trim_end_matches(": ")),
        None => prompt(label),
    }
}

fn password(from_stdin: bool) -> Result<String> {
    let password = if from_stdin {
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        line.trim_end_matches(['\r', '\n']).to_string()
    } else {
        prompt_password("Password: ")?
    };
    if password.trim().is_empty() {
        bail!("password must not be empty");
    }
    Ok(password)
}
