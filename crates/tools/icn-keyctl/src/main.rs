use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

use icn_identity::{Device, DeviceKind};
use icn_keyctl::{Issued, Keyctl, KeyctlConfig, Listing, SledStorage};
use icn_types::TracingNotifier;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Path to the keyctl configuration file.
    #[clap(short, long, value_parser, default_value = "config/keyctl.toml")]
    config: PathBuf,

    /// Passphrase protecting the keys with local key security.
    #[clap(long, env = "ICN_KEYCHAIN_PASSPHRASE", hide_env_values = true, global = true)]
    passphrase: Option<String>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an identity and publish its eldest key.
    Init { name: String },
    /// Issue a new key for a device, signed by the eldest key.
    AddKey {
        name: String,
        /// Device name the key is provisioned for.
        #[clap(long)]
        device: String,
        #[clap(long, value_enum, default_value_t = KindArg::Desktop)]
        kind: KindArg,
        /// Delegate a subkey instead of a sibkey.
        #[clap(long)]
        subkey: bool,
    },
    /// Show an identity's keys and chain.
    List { name: String },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum KindArg {
    Desktop,
    Mobile,
    Paper,
    Backup,
}

impl From<KindArg> for DeviceKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Desktop => DeviceKind::Desktop,
            KindArg::Mobile => DeviceKind::Mobile,
            KindArg::Paper => DeviceKind::Paper,
            KindArg::Backup => DeviceKind::Backup,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = KeyctlConfig::load(&args.config)?;

    let log_level_str = config.log_level.as_deref().unwrap_or("info");
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level_str))
        .unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("Loaded configuration from: {:?}", args.config);
    info!("Storage Path: {:?}", config.storage_path);

    let storage = Arc::new(
        SledStorage::open(&config.storage_path).context("Failed to initialize SledStorage")?,
    );
    let keyctl = Keyctl::new(storage, config, Arc::new(TracingNotifier));
    let passphrase = args.passphrase.as_deref();

    match args.command {
        Commands::Init { name } => {
            let issued = keyctl
                .init(&name, passphrase)
                .await
                .with_context(|| format!("Failed to initialize identity {}", name))?;
            print_issued(&name, "eldest", &issued);
        }
        Commands::AddKey {
            name,
            device,
            kind,
            subkey,
        } => {
            let device = Device::new(device, kind.into());
            let issued = keyctl
                .add_key(&name, device, !subkey, passphrase)
                .await
                .with_context(|| format!("Failed to add a key to {}", name))?;
            print_issued(&name, if subkey { "subkey" } else { "sibkey" }, &issued);
        }
        Commands::List { name } => {
            let listing = keyctl.list(&name).await?;
            print_listing(&listing);
        }
    }

    Ok(())
}

fn print_issued(name: &str, kind: &str, issued: &Issued) {
    println!(
        "{} {} key {} for {}",
        "Published".green(),
        kind,
        issued.kid,
        name
    );
    println!("  seqno:  {}", issued.receipt.seqno);
    println!("  link:   {}", issued.receipt.link_id);
    println!("  sig id: {}", issued.receipt.sig_id);
}

fn print_listing(listing: &Listing) {
    let identity = &listing.identity;
    println!("Identity: {} ({})", identity.name.bold(), identity.uid);
    match &identity.chain_tail {
        Some(tail) => println!("Chain head: {} at seqno {}", tail.link_id, tail.seqno),
        None => println!("Chain head: {}", "empty".yellow()),
    }

    println!("\nKeys in local keyring:");
    for key in &listing.keys {
        let protection = if key.is_lks_protected() {
            "lks".green()
        } else {
            "plain".yellow()
        };
        println!("  {} [{}] created {}", key.kid, protection, key.ctime.to_rfc3339());
    }

    println!("\nChain:");
    for link in &listing.links {
        let device = link
            .device
            .as_ref()
            .map(|d| format!(" device={} ({})", d.name, d.kind))
            .unwrap_or_default();
        println!(
            "  #{} {:?} {} signed by {}{}",
            link.seqno, link.kind, link.delegated_kid, link.signing_kid, device
        );
    }
}
