//! Reads a password from stdin and prints the Argon2 hash to put in
//! `HUSHBOX__AUTH__ADMIN_PASSWORD_HASH`.

use std::io::{self, BufRead};

use anyhow::{bail, Context};

fn main() -> anyhow::Result<()> {
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read password from stdin")?;

    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        bail!("password must not be empty");
    }

    println!("{}", hb_auth_jwt::hash_password(password)?);
    Ok(())
}
