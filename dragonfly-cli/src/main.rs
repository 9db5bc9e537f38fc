//! Command-line driver for the Dragonfly_V1 / CBC_V2 file-encryption
//! engine.

mod cli;
mod entropy;
mod filemap;
mod lock;
mod password;

fn main() {
    if let Err(err) = cli::dispatch() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
