//! Sign-in and profile commands.
//!
//! # Usage
//!
//! ```bash
//! sa-cli login -e priya@example.com -p secret1
//! sa-cli register -n "Priya Sharma" -e priya@example.com -p secret1
//! sa-cli profile --phone 9876543210 --address "12 MG Road, Pune"
//! sa-cli password --current secret1 --new secret22
//! sa-cli whoami
//! sa-cli logout
//! ```

use clap::Args;
use secrecy::SecretString;
use tracing::info;

use styleaura_core::{Email, Identity, ProfileUpdate};
use styleaura_storefront::services::auth::Registration;

use crate::error::CliError;
use crate::shell::Shell;

/// Arguments of `register`.
#[derive(Debug, Args)]
pub struct RegisterArgs {
    /// Display name
    #[arg(short, long)]
    pub name: String,

    /// Email address
    #[arg(short, long)]
    pub email: String,

    /// Password (at least 6 characters)
    #[arg(short, long)]
    pub password: String,

    /// Phone number
    #[arg(long)]
    pub phone: Option<String>,

    /// Default shipping address
    #[arg(long)]
    pub address: Option<String>,
}

/// Arguments of `profile`. Omitted fields are left unchanged.
#[derive(Debug, Args)]
pub struct ProfileArgs {
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub phone: Option<String>,

    #[arg(long)]
    pub address: Option<String>,
}

/// Sign in.
///
/// # Errors
///
/// Returns an error for invalid credentials or if the identity cannot be
/// persisted.
pub async fn login(email: &str, password: String) -> Result<(), CliError> {
    let shell = Shell::open().await?;
    let identity = shell
        .state
        .auth()
        .login(email, &SecretString::from(password))
        .await?;
    info!("Signed in as {} ({})", identity.name, identity.role);
    show_cart_size(&shell);
    Ok(())
}

/// Create an account and sign in.
///
/// # Errors
///
/// Returns an error for invalid fields or if the identity cannot be
/// persisted.
pub async fn register(args: RegisterArgs) -> Result<(), CliError> {
    let shell = Shell::open().await?;
    let identity = shell
        .state
        .auth()
        .register(Registration {
            name: args.name,
            email: args.email,
            password: SecretString::from(args.password),
            phone: args.phone,
            address: args.address,
        })
        .await?;
    info!("Welcome, {}! Your id is {}", identity.name, identity.id);
    Ok(())
}

/// Sign out. The cart stays saved for the next sign-in.
///
/// # Errors
///
/// Returns an error if the identity record cannot be removed.
pub async fn logout() -> Result<(), CliError> {
    let shell = Shell::open().await?;
    let was = shell.state.auth().current_identity();
    shell.state.auth().logout()?;
    match was {
        Some(identity) => info!("Signed out {}", identity.email),
        None => info!("Nobody was signed in"),
    }
    Ok(())
}

/// Show the signed-in identity.
///
/// # Errors
///
/// Returns an error if the data file cannot be read.
pub async fn whoami() -> Result<(), CliError> {
    let shell = Shell::open().await?;
    match shell.state.auth().current_identity() {
        Some(identity) => {
            show_identity(&identity);
            show_cart_size(&shell);
        }
        None => info!("Not signed in"),
    }
    Ok(())
}

/// Update profile fields of the signed-in identity.
///
/// # Errors
///
/// Returns an error when signed out, for invalid fields, or if the identity
/// cannot be persisted.
pub async fn profile(args: ProfileArgs) -> Result<(), CliError> {
    let shell = Shell::open().await?;
    let email = args
        .email
        .as_deref()
        .map(Email::parse)
        .transpose()
        .map_err(|e| CliError::Usage(format!("Invalid email: {e}")))?;

    let identity = shell
        .state
        .auth()
        .update_profile(ProfileUpdate {
            name: args.name,
            email,
            phone: args.phone,
            address: args.address,
        })
        .await?;
    info!("Profile updated");
    show_identity(&identity);
    Ok(())
}

/// Change the password of the signed-in identity.
///
/// # Errors
///
/// Returns an error when signed out or the new password is too short.
pub async fn password(current: String, new: String) -> Result<(), CliError> {
    let shell = Shell::open().await?;
    shell
        .state
        .auth()
        .update_password(&SecretString::from(current), &SecretString::from(new))
        .await?;
    info!("Password updated");
    Ok(())
}

fn show_identity(identity: &Identity) {
    info!("  Id: {}", identity.id);
    info!("  Name: {}", identity.name);
    info!("  Email: {}", identity.email);
    info!("  Role: {}", identity.role);
    if let Some(phone) = &identity.phone {
        info!("  Phone: {phone}");
    }
    if let Some(address) = &identity.address {
        info!("  Address: {address}");
    }
}

fn show_cart_size(shell: &Shell) {
    let items = shell.state.cart().total_items();
    if items > 0 {
        info!("  {items} item(s) waiting in your cart");
    }
}
