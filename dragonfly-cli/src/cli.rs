//! Subcommands recognized by the driver: `encrypt`, `decrypt`,
//! `dump-header`. Exit 0 on success; on failure, a single-line message
//! on stderr and a non-zero exit code.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};

use dragonfly_crypto::envelope::{cbc_v2, dragonfly_v1};
use dragonfly_crypto::io::EntropySource;
use crate::entropy::OsEntropy;
use crate::filemap::FileMap;
use crate::lock::OsLock;
use crate::password::TerminalPassword;

#[derive(Parser, Debug)]
#[command(name = "dragonfly")]
#[command(about = "Threefish/Skein/Catena file encryption", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Envelope {
    Dragonfly,
    CbcV2,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encrypt a file
    Encrypt(EncryptArgs),
    /// Decrypt a file
    Decrypt(DecryptArgs),
    /// Print a file's header fields without decrypting
    DumpHeader(DumpHeaderArgs),
}

#[derive(Parser, Debug)]
struct EncryptArgs {
    #[arg(long, value_enum, default_value_t = Envelope::Dragonfly)]
    envelope: Envelope,

    #[arg(long)]
    input: PathBuf,

    #[arg(long)]
    output: PathBuf,

    /// Lower garlic bound (Dragonfly_V1 only)
    #[arg(long, default_value_t = 16)]
    g_low: u8,

    /// Upper garlic bound (Dragonfly_V1 only)
    #[arg(long, default_value_t = 20)]
    g_high: u8,

    /// Number of bit-reversal-graph shuffle passes (Dragonfly_V1 only)
    #[arg(long, default_value_t = 4)]
    lambda: u8,

    /// Use the Strong Catena variant (adds a sequential phi pass)
    #[arg(long)]
    phi: bool,

    /// Bytes of filler ciphertext between the ciphertext header and the
    /// payload (Dragonfly_V1 only)
    #[arg(long, default_value_t = 0)]
    padding_bytes: usize,

    /// SSPKDF iteration count (CBC_V2 only)
    #[arg(long, default_value_t = 1 << 20)]
    iterations: u32,

    /// SSPKDF concatenation count (CBC_V2 only)
    #[arg(long, default_value_t = 1000)]
    concatenations: u32,

    /// Supplement the CSPRNG seed with a second draw of OS entropy
    #[arg(long)]
    supplement_entropy: bool,
}

#[derive(Parser, Debug)]
struct DecryptArgs {
    #[arg(long)]
    input: PathBuf,

    #[arg(long)]
    output: PathBuf,
}

#[derive(Parser, Debug)]
struct DumpHeaderArgs {
    #[arg(long)]
    input: PathBuf,
}

pub fn dispatch() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Encrypt(args) => cmd_encrypt(args),
        Commands::Decrypt(args) => cmd_decrypt(args),
        Commands::DumpHeader(args) => cmd_dump_header(args),
    }
}

fn progress_bar() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}").unwrap());
    pb
}

fn cmd_encrypt(args: EncryptArgs) -> Result<()> {
    let plaintext = std::fs::read(&args.input).with_context(|| format!("reading {}", args.input.display()))?;

    let out_file = std::fs::File::create(&args.output).with_context(|| format!("creating {}", args.output.display()))?;
    let mut out = FileMap::create(out_file);

    let pb = progress_bar();
    pb.set_message(format!("encrypting {}", args.input.display()));

    let result = match args.envelope {
        Envelope::Dragonfly => {
            let mut entropy = OsEntropy;
            dragonfly_v1::encrypt(
                &plaintext,
                &mut out,
                &mut TerminalPassword,
                &mut entropy,
                &OsLock,
                args.g_low,
                args.g_high,
                args.lambda,
                args.phi,
                args.padding_bytes,
                args.supplement_entropy,
            )
            .map_err(Into::into)
        }
        Envelope::CbcV2 => {
            let mut entropy = OsEntropy;
            let mut tweak = [0u8; 16];
            let mut sspkdf_salt = [0u8; 16];
            let mut cbc_iv = [0u8; 64];
            entropy.fill(&mut tweak);
            entropy.fill(&mut sspkdf_salt);
            entropy.fill(&mut cbc_iv);
            cbc_v2::encrypt(
                &plaintext,
                &mut out,
                &mut TerminalPassword,
                &OsLock,
                tweak,
                sspkdf_salt,
                cbc_iv,
                args.iterations,
                args.concatenations,
            )
            .map_err(Into::into)
        }
    };

    if result.is_err() {
        drop(out);
        let _ = std::fs::remove_file(&args.output);
    }
    pb.finish_and_clear();
    result
}

fn cmd_decrypt(args: DecryptArgs) -> Result<()> {
    let data = std::fs::read(&args.input).with_context(|| format!("reading {}", args.input.display()))?;

    let out_file = std::fs::File::create(&args.output).with_context(|| format!("creating {}", args.output.display()))?;
    let mut out = FileMap::create(out_file);

    let pb = progress_bar();
    pb.set_message(format!("decrypting {}", args.input.display()));

    let result = if data.len() >= 17 && &data[..17] == dragonfly_v1::ID.as_slice() {
        dragonfly_v1::decrypt(&data, &mut out, &mut TerminalPassword, &OsLock).map_err(Into::into)
    } else if data.len() >= 14 && &data[..14] == cbc_v2::ID.as_slice() {
        cbc_v2::decrypt(&data, &mut out, &mut TerminalPassword, &OsLock).map_err(Into::into)
    } else {
        Err(anyhow!("unrecognized file header"))
    };

    if result.is_err() {
        drop(out);
        let _ = std::fs::remove_file(&args.output);
    }
    pb.finish_and_clear();
    result
}

fn cmd_dump_header(args: DumpHeaderArgs) -> Result<()> {
    let data = std::fs::read(&args.input).with_context(|| format!("reading {}", args.input.display()))?;

    if data.len() >= 17 && &data[..17] == dragonfly_v1::ID.as_slice() {
        let dump = dragonfly_v1::dump_header(&data)?;
        println!("{dump}");
    } else if data.len() >= 14 && &data[..14] == cbc_v2::ID.as_slice() {
        let dump = cbc_v2::dump_header(&data)?;
        println!("{dump}");
    } else {
        return Err(anyhow!("unrecognized file header"));
    }
    Ok(())
}
