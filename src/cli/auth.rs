//! `abz auth` / `abz deauth`

use std::error::Error;
use std::io::{self, BufRead, Write};

use crate::core::config::Config;
use crate::core::credential::{store_for, CredentialHolder};

/// Read one line from `input` and store it as the credential.
fn store_from_reader(
    holder: &mut CredentialHolder,
    input: &mut impl BufRead,
) -> Result<(), Box<dyn Error>> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    holder.save(&line)?;
    Ok(())
}

pub fn run_auth(config: &Config, env_only: bool) -> Result<(), Box<dyn Error>> {
    if env_only {
        return Err("--env-only keeps the key in memory; set ABZ_API_KEY instead".into());
    }
    let mut holder = CredentialHolder::load(store_for(config, env_only)?);

    eprint!("Enter your OpenRouter API key: ");
    io::stderr().flush()?;
    store_from_reader(&mut holder, &mut io::stdin().lock())?;

    println!("✅ API key stored.");
    Ok(())
}

pub fn run_deauth(config: &Config, env_only: bool) -> Result<(), Box<dyn Error>> {
    if env_only {
        return Err("--env-only has no stored key to remove".into());
    }
    let mut holder = CredentialHolder::load(store_for(config, env_only)?);
    holder.clear()?;
    println!("✅ API key removed.");
    Ok(())
}
