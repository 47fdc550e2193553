use anyhow::{bail, Result};
use jotter_core::{NewUser, Store};
use tracing::info;

use crate::prompt::prompt_secret;
use crate::session::{clear_session, load_session, save_session, Session};
use crate::state::store_path;

pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
}

pub fn register(r: Registration) -> Result<()> {
    let password = prompt_secret("Password")?;
    let confirm = prompt_secret("Confirm password")?;
    if password != confirm {
        bail!("passwords do not match");
    }

    let mut store = Store::open(store_path()?)?;
    let user = store.register_user(NewUser {
        first_name: r.first_name,
        last_name: r.last_name,
        email: r.email,
        username: r.username,
        password,
    })?;
    info!(user_id = user.id, "registered");
    println!("Registration successful. Next: jotter login --username {}", user.username);
    Ok(())
}

pub fn login(username: &str) -> Result<()> {
    let password = prompt_secret("Password")?;
    let store = Store::open(store_path()?)?;
    let user = store.authenticate(username, &password)?;
    save_session(&Session {
        user_id: user.id,
        username: user.username.clone(),
    })?;
    info!(user_id = user.id, "logged in");
    println!("Logged in as {}", user.username);
    Ok(())
}

pub fn logout() -> Result<()> {
    if clear_session()? {
        println!("Logged out");
    } else {
        println!("Not logged in");
    }
    Ok(())
}

pub fn whoami() -> Result<()> {
    let Some(session) = load_session()? else {
        println!("Not logged in");
        return Ok(());
    };
    let store = Store::open(store_path()?)?;
    match store.user(session.user_id) {
        Some(u) => println!("{} ({} {}, {})", u.username, u.first_name, u.last_name, u.email),
        None => println!("{} (account no longer exists; run: jotter logout)", session.username),
    }
    Ok(())
}
