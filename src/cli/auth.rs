//! Keyring management for the API key.

use std::error::Error;
use std::io::{self, BufRead, Write};

use crate::core::keyring::{delete_secret, store_secret};
use crate::core::secrets::API_KEY_NAME;

/// Reads a key from one line of input. Blank input is rejected.
pub fn read_api_key(input: &mut impl BufRead) -> Result<String, Box<dyn Error>> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    let key = line.trim();
    if key.is_empty() {
        return Err("No API key entered".into());
    }
    Ok(key.to_string())
}

pub fn run_auth() -> Result<(), Box<dyn Error>> {
    println!("🔐 Code Correct Authentication Setup");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    print!("Enter your Gemini API key: ");
    io::stdout().flush()?;

    let key = match read_api_key(&mut io::stdin().lock()) {
        Ok(key) => key,
        Err(err) => {
            eprintln!("❌ Authentication failed: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = store_secret(API_KEY_NAME, &key) {
        eprintln!("❌ Authentication failed: {err}");
        if err.is_recoverable() {
            eprintln!("💡 The keyring is unavailable; set {API_KEY_NAME} in secrets.toml or the environment instead.");
        }
        std::process::exit(1);
    }

    println!("✅ API key stored in the system keyring");
    Ok(())
}

pub fn run_deauth() -> Result<(), Box<dyn Error>> {
    match delete_secret(API_KEY_NAME) {
        Ok(true) => println!("✅ API key removed from the system keyring"),
        Ok(false) => println!("No API key was stored in the system keyring"),
        Err(err) => {
            eprintln!("❌ Deauthentication failed: {err}");
            std::process::exit(1);
        }
    }
    Ok(())
}
