//! Session commands.
//!
//! # Usage
//!
//! ```bash
//! atelier auth login -u alice
//! atelier auth register -u bob -p secret
//! atelier auth status
//! atelier auth logout
//! ```

use std::io::Write;

use atelier_storefront::Storefront;
use atelier_storefront::api::Credentials;

use super::CommandError;

/// Sign in and persist the session.
///
/// # Errors
///
/// Returns an error if the server rejects the credentials or the session
/// cannot be saved.
pub async fn login(
    storefront: &Storefront,
    username: &str,
    password: String,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let identity = storefront
        .login(&Credentials::new(username, password))
        .await?;

    writeln!(out, "Signed in as {username} ({})", identity.role())?;
    let items = storefront.cart().len();
    if items > 0 {
        writeln!(out, "{}", super::cart::item_count(items))?;
    }
    Ok(())
}

/// Register a regular user account.
///
/// # Errors
///
/// Returns an error if the passwords differ or the server rejects the
/// registration.
pub async fn register(
    storefront: &Storefront,
    username: &str,
    password: String,
    confirm_password: &str,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let ack = storefront
        .register(&Credentials::new(username, password), confirm_password)
        .await?;

    writeln!(
        out,
        "{}",
        ack.message
            .as_deref()
            .unwrap_or("Registration successful! Please sign in.")
    )?;
    Ok(())
}

/// Sign out and erase the saved session.
///
/// # Errors
///
/// Returns an error if the session file cannot be removed.
pub async fn logout(storefront: &Storefront, out: &mut impl Write) -> Result<(), CommandError> {
    let was_signed_in = storefront.session().is_authenticated();
    storefront.logout().await?;

    if was_signed_in {
        writeln!(out, "Signed out")?;
    } else {
        writeln!(out, "Not signed in")?;
    }
    Ok(())
}

/// Print the saved session, if any.
///
/// # Errors
///
/// Returns an error if output cannot be written.
pub fn status(storefront: &Storefront, out: &mut impl Write) -> Result<(), CommandError> {
    match storefront.session().role() {
        Some(role) => writeln!(out, "Signed in ({role})")?,
        None => writeln!(out, "Not signed in")?,
    }
    Ok(())
}
