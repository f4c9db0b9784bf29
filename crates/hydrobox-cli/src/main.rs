//! hydrobox: secretbox command-line interface
//!
//! Commands:
//!   init                               - seed the process CSPRNG
//!   random u32|uniform <N>|bytes <LEN> - draw random values
//!   keygen [--out FILE [--force]]      - generate a hex-encoded secretbox key
//!   sizes                              - print key/context/header/probe sizes
//!   encrypt <MESSAGE> --msg-id N       - encrypt a message
//!   decrypt <CIPHERTEXT> --msg-id N    - decrypt and print a message
//!   probe create <CIPHERTEXT>          - create a detached probe
//!   probe verify <PROBE> <CIPHERTEXT>  - verify a probe without decrypting
//!   config show                        - display the active configuration
//!
//! Binary values (ciphertexts, probes, random bytes) are read and written in
//! the configured encoding (hex by default). Keys are always hex, taken from
//! `--key`, `--key-file`, `HYDROBOX_KEY`, or `secretbox.key_file`, in that order.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;
use zeroize::Zeroizing;

use hydrobox_core::config::expand_tilde;
use hydrobox_core::{Encoding, HydroboxConfig};
use hydrobox_crypto::{api, CryptoError};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "hydrobox",
    version,
    about = "Deterministic secretbox encryption and detached probes",
    long_about = "hydrobox: generate keys, encrypt and decrypt messages bound to a message id \
                  and context, and create or verify probes over ciphertexts"
)]
struct Cli {
    /// Path to hydrobox.toml configuration file
    #[arg(
        long,
        short = 'c',
        env = "HYDROBOX_CONFIG",
        default_value = "~/.config/hydrobox/config.toml"
    )]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config
    #[arg(long, env = "HYDROBOX_LOG")]
    log: Option<String>,

    /// Log format; overrides the config
    #[arg(long, env = "HYDROBOX_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Encoding for binary input and output (hex, base64); overrides the config
    #[arg(long, short = 'e')]
    encoding: Option<Encoding>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Debug, ValueEnum, PartialEq)]
enum LogFormat {
    Json,
    Text,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Seed the process CSPRNG (idempotent)
    Init,

    /// Draw values from the CSPRNG
    Random {
        #[command(subcommand)]
        action: RandomAction,
    },

    /// Generate a new secretbox key (hex)
    Keygen {
        /// Write the key to this file (mode 0600) instead of stdout
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
        /// Replace an existing key file
        #[arg(long, requires = "out")]
        force: bool,
    },

    /// Print the secretbox size constants
    Sizes,

    /// Encrypt a message
    Encrypt {
        /// Message text
        message: String,
        /// Message id; never reuse one for two messages under the same key and context
        #[arg(long)]
        msg_id: u64,
        #[command(flatten)]
        key: KeyArgs,
    },

    /// Decrypt a ciphertext and print the message
    Decrypt {
        /// Encoded ciphertext
        ciphertext: String,
        /// Message id used at encryption
        #[arg(long)]
        msg_id: u64,
        #[command(flatten)]
        key: KeyArgs,
    },

    /// Detached probes over ciphertexts
    Probe {
        #[command(subcommand)]
        action: ProbeAction,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum RandomAction {
    /// Uniform 32-bit values
    U32 {
        #[arg(long, short = 'n', default_value_t = 1)]
        count: usize,
    },
    /// Uniform values in [0, BOUND)
    Uniform {
        bound: u32,
        #[arg(long, short = 'n', default_value_t = 1)]
        count: usize,
    },
    /// LEN random bytes, encoded
    Bytes { len: usize },
}

#[derive(Subcommand, Debug)]
enum ProbeAction {
    /// Create a probe for a ciphertext
    Create {
        /// Encoded ciphertext
        ciphertext: String,
        #[command(flatten)]
        key: KeyArgs,
    },
    /// Verify a probe against a ciphertext
    Verify {
        /// Encoded probe
        probe: String,
        /// Encoded ciphertext
        ciphertext: String,
        #[command(flatten)]
        key: KeyArgs,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

#[derive(Args, Debug)]
struct KeyArgs {
    /// Hex-encoded key
    #[arg(long)]
    key: Option<String>,

    /// File holding a hex-encoded key (overrides HYDROBOX_KEY and config key_file)
    #[arg(long)]
    key_file: Option<PathBuf>,

    /// Domain-separation context, exactly 8 bytes (overrides config)
    #[arg(long)]
    context: Option<String>,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = expand_tilde(&cli.config);
    let config = HydroboxConfig::load(&config_path)
        .with_context(|| format!("loading config: {}", config_path.display()))?;

    let level = cli.log.clone().unwrap_or_else(|| config.log.level.clone());
    let format = cli.log_format.clone().unwrap_or(match config.log.format.as_str() {
        "json" => LogFormat::Json,
        _ => LogFormat::Text,
    });
    init_logging(&level, &format);

    debug!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_path.display(),
        "hydrobox starting"
    );

    let encoding = cli.encoding.unwrap_or(config.output.encoding);

    match cli.command {
        Commands::Init => {
            println!("{}", api::init());
            Ok(())
        }
        Commands::Random { action } => cmd_random(action, encoding),
        Commands::Keygen { out, force } => cmd_keygen(out.as_deref(), force),
        Commands::Sizes => {
            println!("key:     {}", api::KEY_BYTES);
            println!("context: {}", api::CONTEXT_BYTES);
            println!("header:  {}", api::HEADER_BYTES);
            println!("probe:   {}", api::PROBE_BYTES);
            Ok(())
        }
        Commands::Encrypt { message, msg_id, key } => {
            cmd_encrypt(&config, encoding, &message, msg_id, &key)
        }
        Commands::Decrypt { ciphertext, msg_id, key } => {
            cmd_decrypt(&config, encoding, &ciphertext, msg_id, &key)
        }
        Commands::Probe { action: ProbeAction::Create { ciphertext, key } } => {
            cmd_probe_create(&config, encoding, &ciphertext, &key)
        }
        Commands::Probe { action: ProbeAction::Verify { probe, ciphertext, key } } => {
            cmd_probe_verify(&config, encoding, &probe, &ciphertext, &key)
        }
        Commands::Config { action: ConfigAction::Show } => cmd_config_show(&config, &config_path),
    }
}

fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries command output, so logs go to stderr
    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

// ── Argument marshalling ──────────────────────────────────────────────────────

const KEY_ENV: &str = "HYDROBOX_KEY";

fn key_from_env() -> Option<Zeroizing<String>> {
    std::env::var(KEY_ENV).ok().map(Zeroizing::new)
}

fn read_key_file(path: &Path) -> Result<Zeroizing<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading key file: {}", path.display()))?;
    Ok(Zeroizing::new(text))
}

/// Resolve the key from `--key`, `--key-file`, `env_key`, then the config key_file.
fn resolve_key(
    args: &KeyArgs,
    env_key: Option<Zeroizing<String>>,
    config: &HydroboxConfig,
) -> Result<Zeroizing<Vec<u8>>> {
    let text = if let Some(hex) = &args.key {
        Zeroizing::new(hex.clone())
    } else if let Some(path) = &args.key_file {
        read_key_file(path)?
    } else if let Some(hex) = env_key {
        hex
    } else if let Some(path) = config.key_file() {
        read_key_file(&path)?
    } else {
        anyhow::bail!(
            "no key given\n\
             Pass --key or --key-file, set HYDROBOX_KEY, or set secretbox.key_file in the config.\n\
             Generate one with: hydrobox keygen --out ~/.config/hydrobox/key"
        );
    };

    let key = Encoding::Hex.decode(&text).context("decoding key")?;
    Ok(Zeroizing::new(key))
}

fn resolve_context(args: &KeyArgs, config: &HydroboxConfig) -> Vec<u8> {
    args.context
        .as_deref()
        .unwrap_or(&config.secretbox.context)
        .as_bytes()
        .to_vec()
}

/// Caller errors pass through with their detail; authentication failures
/// become the single opaque `message`.
fn surface(err: CryptoError, message: &'static str) -> anyhow::Error {
    if err.is_authentication_failure() {
        anyhow::anyhow!(message)
    } else {
        anyhow::Error::new(err)
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn cmd_random(action: RandomAction, encoding: Encoding) -> Result<()> {
    match action {
        RandomAction::U32 { count } => {
            for _ in 0..count {
                println!("{}", api::random_u32());
            }
        }
        RandomAction::Uniform { bound, count } => {
            for _ in 0..count {
                println!("{}", api::random_uniform(bound)?);
            }
        }
        RandomAction::Bytes { len } => {
            let mut buf = vec![0u8; len];
            hydrobox_crypto::random_buf(&mut buf);
            println!("{}", encoding.encode(&buf));
        }
    }
    Ok(())
}

fn cmd_keygen(out: Option<&Path>, force: bool) -> Result<()> {
    let key = Zeroizing::new(api::secretbox_keygen());
    let hex = Zeroizing::new(Encoding::Hex.encode(&key));

    let Some(path) = out else {
        println!("{}", hex.as_str());
        return Ok(());
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating dir: {}", parent.display()))?;
    }

    let mut options = std::fs::OpenOptions::new();
    options.write(true);
    if force {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::AlreadyExists {
            anyhow::anyhow!(
                "key file already exists: {}\n\
                 Ciphertexts made under it cannot be decrypted without it. \
                 Pass --force to replace it.",
                path.display()
            )
        } else {
            anyhow::Error::new(e).context(format!("creating key file: {}", path.display()))
        }
    })?;

    // open() only applies the mode to new files
    #[cfg(unix)]
    {
        if force {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("restricting key file mode: {}", path.display()))?;
        }
    }

    file.write_all(hex.as_bytes())
        .and_then(|()| file.write_all(b"\n"))
        .with_context(|| format!("writing key file: {}", path.display()))?;

    tracing::info!("key written: {}", path.display());
    Ok(())
}

fn cmd_encrypt(
    config: &HydroboxConfig,
    encoding: Encoding,
    message: &str,
    msg_id: u64,
    args: &KeyArgs,
) -> Result<()> {
    let key = resolve_key(args, key_from_env(), config)?;
    let context = resolve_context(args, config);

    let ciphertext = api::secretbox_encrypt(message.as_bytes(), &key, msg_id, &context)
        .map_err(|e| surface(e, "encryption failed"))?;

    println!("{}", encoding.encode(&ciphertext));
    Ok(())
}

fn cmd_decrypt(
    config: &HydroboxConfig,
    encoding: Encoding,
    ciphertext: &str,
    msg_id: u64,
    args: &KeyArgs,
) -> Result<()> {
    let key = resolve_key(args, key_from_env(), config)?;
    let context = resolve_context(args, config);
    let ciphertext = encoding.decode(ciphertext).context("decoding ciphertext")?;

    let plaintext = api::secretbox_decrypt(&ciphertext, &key, msg_id, &context)
        .map_err(|e| surface(e, "message forged"))?;

    println!("{}", String::from_utf8_lossy(&plaintext));
    Ok(())
}

fn cmd_probe_create(
    config: &HydroboxConfig,
    encoding: Encoding,
    ciphertext: &str,
    args: &KeyArgs,
) -> Result<()> {
    let key = resolve_key(args, key_from_env(), config)?;
    let context = resolve_context(args, config);
    let ciphertext = encoding.decode(ciphertext).context("decoding ciphertext")?;

    let probe = api::secretbox_probe_create(&ciphertext, &context, &key)
        .map_err(|e| surface(e, "probe create failed"))?;

    println!("{}", encoding.encode(&probe));
    Ok(())
}

fn cmd_probe_verify(
    config: &HydroboxConfig,
    encoding: Encoding,
    probe: &str,
    ciphertext: &str,
    args: &KeyArgs,
) -> Result<()> {
    let key = resolve_key(args, key_from_env(), config)?;
    let context = resolve_context(args, config);
    let probe = encoding.decode(probe).context("decoding probe")?;
    let ciphertext = encoding.decode(ciphertext).context("decoding ciphertext")?;

    api::secretbox_probe_verify(&probe, &ciphertext, &context, &key)
        .map_err(|e| surface(e, "probe verify failed"))?;

    println!("ok");
    Ok(())
}

fn cmd_config_show(config: &HydroboxConfig, path: &Path) -> Result<()> {
    println!("# config: {}", path.display());
    let rendered = toml::to_string_pretty(config).context("serializing config")?;
    print!("{rendered}");
    Ok(())
}
