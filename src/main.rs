//! HIDBurner CLI
//!
//! Command-line front end for reading and writing the programmer's two
//! feature reports.

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use hidburner::{Burner, DEFAULT_LAYOUT};

mod cli;
use cli::{parse_hex_bytes, Cli, Commands};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let filter = cli.filter();
    let backend = cli.backend.unwrap_or_default();

    let mut burner = Burner::open_with(&filter, backend, DEFAULT_LAYOUT)
        .context("unable to open programmer")?;

    match cli.command {
        Commands::Info => {
            let info = burner.device_info();
            println!("device   {:04x}:{:04x}", info.vendor_id, info.product_id);
            println!("backend  {}", info.backend);
            println!("path     {}", info.device_path);
            if let Some(manufacturer) = &info.manufacturer {
                println!("vendor   {manufacturer}");
            }
            if let Some(product) = &info.product {
                println!("product  {product}");
            }
            if let Some(serial) = &info.serial {
                println!("serial   {serial}");
            }
        }
        Commands::ReadFirst => {
            let mut buf = vec![0u8; burner.layout().first.payload_len];
            burner
                .read_first(&mut buf)
                .context("unable to read data from programmer")?;
            print_hex(&buf);
        }
        Commands::ReadSecond => {
            let mut buf = vec![0u8; burner.layout().second.payload_len];
            burner
                .read_second(&mut buf)
                .context("unable to read data from programmer")?;
            print_hex(&buf);
        }
        Commands::Write { data } => {
            let payload = parse_hex_bytes(&data).map_err(anyhow::Error::msg)?;
            burner
                .write_bytes(&payload)
                .context("unable to send data to programmer")?;
            println!("sent {} bytes", payload.len());
        }
    }

    burner.close().context("error closing programmer")?;
    Ok(())
}

fn print_hex(data: &[u8]) {
    for (offset, chunk) in data.chunks(16).enumerate() {
        print!("{:04x}  ", offset * 16);
        for byte in chunk {
            print!("{byte:02x} ");
        }
        println!();
    }
}
