//! Developer CLI for the PIN credential manager.
//!
//! Exercises the full PIN flow against a Firestore-style document API, using
//! a software keystore and a sealed credential file under the data
//! directory. Exit code reflects the boolean outcome of the operation.

mod keystore;

use std::{fs, path::PathBuf, process::ExitCode, sync::Arc};

use clap::{Parser, Subcommand};
use eyre::{Result, WrapErr};
use secrecy::SecretString;

use keystore::SoftwareKeystore;
use pinkit_core::{remote::FirestoreRemote, secure::SealedStore, PinCredentialManager};

#[derive(Parser)]
#[command(name = "pinkit", about = "Wallet PIN credential tooling", version)]
struct Cli {
    /// Base URL of the document API, e.g. the Firestore documents root
    /// `https://firestore.googleapis.com/v1/projects/{p}/databases/(default)/documents`.
    #[arg(long, env = "PINKIT_BASE_URL")]
    base_url: String,

    /// Bearer token attached to every request.
    #[arg(long, env = "PINKIT_TOKEN")]
    token: Option<String>,

    /// Directory holding the sealed credential store and keystore key.
    #[arg(long, env = "PINKIT_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Allow a plain-HTTP base URL (local emulators only).
    #[arg(long)]
    insecure: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Set or rotate the wallet PIN.
    Set {
        /// User identifier the record is keyed by.
        user: String,
        /// The new PIN.
        pin: String,
    },
    /// Check a candidate PIN.
    Verify {
        /// User identifier the record is keyed by.
        user: String,
        /// The candidate PIN.
        pin: String,
    },
    /// Remove the wallet PIN, tombstoning the remote record.
    Remove {
        /// User identifier the record is keyed by.
        user: String,
    },
    /// Report whether the account is PIN protected.
    Status {
        /// User identifier the record is keyed by.
        user: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let data_dir = cli.data_dir.unwrap_or_else(|| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pinkit")
    });
    fs::create_dir_all(&data_dir)
        .wrap_err_with(|| format!("failed to create {}", data_dir.display()))?;

    let keystore = Arc::new(SoftwareKeystore::open(&data_dir.join("keystore.key"))?);
    let secure = Arc::new(SealedStore::open(keystore, data_dir.join("credentials.bin"))?);

    let mut remote = if cli.insecure {
        FirestoreRemote::insecure(&cli.base_url)
    } else {
        FirestoreRemote::new(&cli.base_url)?
    };
    if let Some(token) = &cli.token {
        remote = remote.with_bearer_token(token);
    }

    let manager = PinCredentialManager::new(secure, Arc::new(remote));

    let ok = match cli.command {
        Command::Set { user, pin } => {
            let ok = manager.set_pin(&user, &SecretString::from(pin)).await;
            println!("{}", if ok { "pin set" } else { "pin not set" });
            ok
        }
        Command::Verify { user, pin } => {
            let ok = manager.verify_pin(&user, &SecretString::from(pin)).await;
            println!("{}", if ok { "pin ok" } else { "pin rejected" });
            ok
        }
        Command::Remove { user } => {
            let ok = manager.remove_pin(&user).await;
            println!("{}", if ok { "pin removed" } else { "pin not removed" });
            ok
        }
        Command::Status { user } => {
            let protected = manager.is_pin_protected(&user).await;
            println!("{}", if protected { "protected" } else { "not protected" });
            protected
        }
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
