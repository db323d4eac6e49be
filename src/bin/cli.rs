//! RedoKV CLI Client
//!
//! Command-line interface for a running server, plus offline log inspection.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use redokv::network::Client;
use redokv::protocol::Reply;
use redokv::redo::{RedoReader, RedoRecovery};

/// RedoKV CLI
#[derive(Parser, Debug)]
#[command(name = "redokv-cli")]
#[command(about = "CLI for the RedoKV key-value cache")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:2081")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// Print the records of a redo log file
    Inspect {
        /// Path to redo.log
        path: PathBuf,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    let result = match &args.command {
        Commands::Get { key } => remote(&args.server, |client| client.get(key)),
        Commands::Set { key, value } => remote(&args.server, |client| client.set(key, value)),
        Commands::Del { key } => remote(&args.server, |client| client.del(key)),
        Commands::Inspect { path } => inspect(path),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Run one request against the server and print the reply
fn remote<F>(server: &str, request: F) -> redokv::Result<bool>
where
    F: FnOnce(&mut Client) -> redokv::Result<Reply>,
{
    let mut client = Client::connect(server)?;
    let reply = request(&mut client)?;
    client.quit()?;

    println!("{}", reply);
    Ok(reply.is_ok())
}

fn inspect(path: &Path) -> redokv::Result<bool> {
    for record in RedoReader::open(path)?.records() {
        match record {
            Ok(record) => match &record.value {
                Some(value) => println!(
                    "{:>8}  {:?}  {} = {}",
                    record.serial, record.operation, record.key, value
                ),
                None => println!("{:>8}  {:?}  {}", record.serial, record.operation, record.key),
            },
            Err(e) => {
                println!("-- stopped: {}", e);
                break;
            }
        }
    }

    let report = RedoRecovery::verify(path)?;
    println!(
        "-- {} records, last serial {}, {} valid bytes, {} discarded bytes",
        report.records_recovered,
        report
            .last_serial
            .map_or_else(|| "none".to_string(), |serial| serial.to_string()),
        report.valid_bytes,
        report.discarded_bytes
    );
    if report.interior_damage {
        println!("-- damage is followed by complete records; the server will not start on this log");
    }

    Ok(!report.was_truncated)
}
