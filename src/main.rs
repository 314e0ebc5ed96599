use std::path::PathBuf;
use std::process::ExitCode;

use cert_check::{check, save_record, CertificateSchema, Error, Result};
use clap::Parser;
use env_logger::Env;
use log::debug;

const EXIT_INVALID: u8 = 1;
const EXIT_UNDECODABLE: u8 = 3;
const EXIT_FAILURE: u8 = 4;

/// Validate certificate against a JSON schema.
#[derive(Debug, Parser)]
#[command(name = "cert-check", version, about)]
struct Cli {
    /// Path to the certificate file (PEM or DER)
    #[arg(value_name = "CERTFILE")]
    certfile: PathBuf,

    /// Save the JSON representation of the certificate here if it is valid
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// JSON schema to use instead of the packaged one
    #[arg(long, value_name = "PATH", env = "CERT_CHECK_SCHEMA")]
    schema: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    debug!("{:?}", cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(Error::Validation(e)) => {
            println!("Validation error: {}", e.message);
            ExitCode::from(EXIT_INVALID)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let schema = match &cli.schema {
        Some(path) => CertificateSchema::from_path(path)?,
        None => CertificateSchema::embedded()?,
    };

    let record = check(&cli.certfile, &schema)?;
    println!("Certificate is valid according to the JSON schema.");

    if let Some(output) = &cli.output {
        save_record(&record, output)?;
        println!(
            "Certificate JSON representation saved to {}",
            output.display()
        );
    }
    Ok(())
}

fn exit_code(e: &Error) -> u8 {
    match e {
        Error::Validation(_) => EXIT_INVALID,
        Error::Decode(_) => EXIT_UNDECODABLE,
        Error::Schema(_) | Error::Io { .. } | Error::Json(_) => EXIT_FAILURE,
    }
}
