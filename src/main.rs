use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use mdadm_jbod::{
    config::{Backend, Config},
    disk::{FileDisk, Jbod, JbodExecutor},
    mdadm::Mdadm,
    net::{JbodClient, JbodServer},
};
use tracing_subscriber::{prelude::*, EnvFilter};

use crate::shell::start_shell;

mod shell;

#[derive(Parser)]
#[command(name = "mdadm")]
#[command(about = "JBOD array controller with an LRU block cache and a remote device protocol")]
struct Cli {
    /// YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where block operations are executed
    #[arg(short, long, value_enum)]
    backend: Option<Backend>,

    /// Disk image for the file backend
    #[arg(long)]
    image: Option<PathBuf>,

    /// Server host (remote backend) or bind address (serve)
    #[arg(long)]
    host: Option<String>,

    #[arg(short, long)]
    port: Option<u16>,

    /// Block cache entries, 2..=4096
    #[arg(long, conflicts_with = "no_cache")]
    cache: Option<usize>,

    /// Run without a block cache
    #[arg(long)]
    no_cache: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive shell driving the array (default)
    Shell,
    /// Serve a JBOD over the network protocol
    Serve,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(backend) = self.backend {
            config.device.backend = backend;
        }
        if let Some(image) = &self.image {
            config.device.image = image.clone();
        }
        if let Some(host) = &self.host {
            config.device.host = host.clone();
        }
        if let Some(port) = self.port {
            config.device.port = port;
        }
        if self.cache.is_some() {
            config.cache.capacity = self.cache;
        }
        if self.no_cache {
            config.cache.capacity = None;
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Shell => shell(&config),
        Commands::Serve => serve(&config),
    }
}

fn shell(config: &Config) -> Result<()> {
    let device = &config.device;
    let (executor, label): (Box<dyn JbodExecutor>, String) = match device.backend {
        Backend::Memory => (Box::new(Jbod::in_memory()), "memory".to_string()),
        Backend::File => {
            let disk = FileDisk::open(&device.image)
                .with_context(|| format!("opening disk image {}", device.image.display()))?;
            (
                Box::new(Jbod::new(disk)),
                format!("file:{}", device.image.display()),
            )
        }
        Backend::Remote => {
            let client = JbodClient::connect(&device.host, device.port)?;
            let label = format!("remote:{}", client.peer());
            (Box::new(client), label)
        }
    };

    let array = match config.cache.capacity {
        Some(capacity) => Mdadm::with_cache(executor, capacity)?,
        None => Mdadm::new(executor),
    };
    start_shell(array, &label);
    Ok(())
}

fn serve(config: &Config) -> Result<()> {
    let device = &config.device;
    let addr = (device.host.as_str(), device.port);
    match device.backend {
        Backend::Memory => JbodServer::bind(addr, Jbod::in_memory())?.serve()?,
        Backend::File => {
            let disk = FileDisk::open(&device.image)
                .with_context(|| format!("opening disk image {}", device.image.display()))?;
            JbodServer::bind(addr, Jbod::new(disk))?.serve()?
        }
        Backend::Remote => bail!("the server needs a memory or file backend"),
    }
    Ok(())
}
