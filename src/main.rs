use std::{path::PathBuf, process::exit};

use clap::{Args, Parser, Subcommand};
use rustrument::{
    config::{ConnectionConfig, Transport},
    Error, Model, Result, Scpi,
};

/// Any instrument that speaks SCPI with newline terminated messages.
#[derive(Debug, Default)]
struct Generic;

impl Model for Generic {
    const DESCRIPTION: &'static str = "SCPI instrument";
}

#[derive(Parser)]
#[command(name = "scpi-cli", version)]
#[command(about = "Send SCPI commands to an instrument", long_about = None)]
struct Cli {
    #[command(flatten)]
    target: Target,

    /// Read timeout in ms
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Target {
    /// TOML file describing the connection
    #[arg(long, conflicts_with_all = ["tcp", "serial"])]
    config: Option<PathBuf>,

    /// Raw socket address, e.g. 192.168.1.20:5025
    #[arg(long, conflicts_with = "serial")]
    tcp: Option<String>,

    /// Serial port, e.g. /dev/ttyUSB0
    #[arg(long)]
    serial: Option<String>,

    /// Baud rate of the serial port
    #[arg(long, requires = "serial")]
    baud: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the *IDN? fields
    Idn,
    /// Send a command without reading a reply
    Write { command: String },
    /// Send a query and print the reply
    Query { command: String },
    /// Send a query and print the reply as a list of numbers
    Values { command: String },
}

impl Target {
    fn connection(&self, timeout_ms: Option<u64>) -> Result<ConnectionConfig> {
        let mut config = match (&self.config, &self.tcp, &self.serial) {
            (Some(path), _, _) => ConnectionConfig::load(path)?,
            (None, Some(address), _) => ConnectionConfig {
                transport: Transport::Tcp,
                address: address.clone(),
                baud_rate: None,
                timeout_ms: None,
            },
            (None, None, Some(port)) => ConnectionConfig {
                transport: Transport::Serial,
                address: port.clone(),
                baud_rate: self.baud,
                timeout_ms: None,
            },
            (None, None, None) => return Err(Error::from("no instrument given, use --config, --tcp or --serial")),
        };
        if timeout_ms.is_some() {
            config.timeout_ms = timeout_ms;
        }
        Ok(config)
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = cli.target.connection(cli.timeout_ms)?;
    let mut instrument = config.connect(Generic)?;
    match cli.command {
        Commands::Idn => println!("{}", instrument.identify()?),
        Commands::Write { command } => instrument.write(command)?,
        Commands::Query { command } => println!("{}", instrument.ask(command)?),
        Commands::Values { command } => {
            for value in instrument.values(command)? {
                println!("{}", value);
            }
        }
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        log::error!("{:?}", e);
        eprintln!("{}", e);
        exit(1);
    }
}
