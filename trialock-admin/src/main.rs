#![allow(clippy::unwrap_used)]

use std::process;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use dialoguer::{Input, theme::ColorfulTheme};
use env_logger::{Builder, Env};
use log::{error, info};
use serde::Serialize;
use trialock_core::fingerprint::Fingerprint;
use trialock_core::key::KeyCodec;
use trialock_core::secrets::EmbeddedKeys;

#[derive(Parser)]
#[command(version, about = "Activation key admin tool for Trialock", long_about = None)]
#[command(propagate_version = true)]
struct Opts {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Issue an activation key for a customer machine
    Generate {
        /// Customer hardware fingerprint (32 hex characters); prompted when omitted
        #[clap(long)]
        fingerprint: Option<String>,

        /// Number of days until the key's embedded expiry
        #[clap(long, default_value_t = 365)]
        days: i64,

        /// Emit the issued key as JSON instead of console output
        #[clap(long)]
        json: bool,
    },
    /// Decode and verify a key against this machine
    Validate { code: String },
    /// Print this machine's hardware fingerprint
    Fingerprint,
}

#[derive(Serialize)]
struct IssuedKey {
    fingerprint: String,
    expires_at: DateTime<Utc>,
    key: String,
}

fn main() {
    Builder::from_env(Env::default().default_filter_or("info")).init();

    println!();
    println!("{}", " =====================================".green().bold());
    println!("{}", " |        Trialock Admin App         |".green().bold());
    println!("{}", " =====================================".green().bold());
    println!();

    let opts = Opts::parse();
    let codec = KeyCodec::new(Arc::new(EmbeddedKeys));

    match opts.command {
        Commands::Generate { fingerprint, days, json } => generate(&codec, fingerprint, days, json),
        Commands::Validate { code } => validate(&codec, &code),
        Commands::Fingerprint => fingerprint(),
    }
}

fn generate(codec: &KeyCodec, fingerprint: Option<String>, days: i64, json: bool) {
    let input = fingerprint.unwrap_or_else(|| {
        Input::with_theme(&ColorfulTheme::default()).with_prompt("Enter customer fingerprint (32 hex chars)").interact_text().unwrap()
    });

    let Ok(target) = Fingerprint::parse(&input) else {
        error!("Not a fingerprint: {input:?}");
        process::exit(1);
    };

    let expires_at = Utc::now() + Duration::days(days);
    let key = codec.encode(&target, expires_at);

    if json {
        let issued = IssuedKey { fingerprint: target.to_string(), expires_at, key };
        println!("{}", serde_json::to_string_pretty(&issued).unwrap());
        return;
    }

    header("Issued Activation Key");
    info!("Fingerprint: {target}");
    info!("Expires: {expires_at}");
    info!("{}", key.bright_yellow());

    // A key for this machine can be checked end to end right away.
    if target == Fingerprint::current() {
        header("Testing Key Decode");
        match codec.verify(&key, &target) {
            Ok(verified) => info!("Key verifies locally, expires {verified}"),
            Err(e) => error!("Issued key failed local verification: {e}"),
        }
    }
}

fn validate(codec: &KeyCodec, code: &str) {
    info!("Validating Key: {code}");

    match codec.verify(code, &Fingerprint::current()) {
        Ok(expires_at) => println!("✅ Key is VALID for this machine until {expires_at}."),
        Err(e) => println!("❌ Key is INVALID: {e}."),
    }
}

fn fingerprint() {
    header("Hardware Fingerprint");
    info!("{}", Fingerprint::current().as_str().bright_yellow());
}

//////////////////////////////////////////////////

fn header(title: &str) {
    info!("\n{}", "-----------------------------------------------".white().on_blue());
    info!("        {}", title.white());
    info!("{}", "-----------------------------------------------".white().on_blue());
}
