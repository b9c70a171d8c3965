use colored::*;
use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use mdadm_jbod::{
    disk::{JbodExecutor, MAX_IO_SIZE, TOTAL_CAPACITY},
    mdadm::Mdadm,
};
use std::{error::Error, io::stdout};

pub type Array = Mdadm<Box<dyn JbodExecutor>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Mount,
    Unmount,
    Read(u32, u32),
    Write(u32, String),
    Fill(u32, u32, u8),
    Zero,
    Cache(Option<usize>),
    Stats,
    Clear,
    Exit,
}

pub fn execute_command(cmd: &Command, array: &mut Array) -> Result<(), Box<dyn Error>> {
    match cmd {
        Command::Help => print_help(),
        Command::Mount => {
            array.mount()?;
            println!("✅ {}", "Array mounted".green());
        }
        Command::Unmount => {
            array.unmount()?;
            println!("✅ {}", "Array unmounted".green());
        }
        Command::Read(addr, len) => {
            let mut buf = vec![0u8; *len as usize];
            let n = array.read(*addr, *len, Some(&mut buf))?;
            print_hex_dump(*addr, &buf[..n]);
        }
        Command::Write(addr, text) => {
            let n = array.write(*addr, text.len() as u32, Some(text.as_bytes()))?;
            println!(
                "✏️  Wrote {} bytes at {}",
                n.to_string().cyan(),
                format!("{:#08x}", addr).cyan()
            );
        }
        Command::Fill(addr, len, byte) => {
            let data = vec![*byte; *len as usize];
            let n = array.write(*addr, *len, Some(&data))?;
            println!("✏️  Filled {} bytes with {:#04x}", n.to_string().cyan(), byte);
        }
        Command::Zero => zero_array(array)?,
        Command::Cache(capacity) => {
            let cache = array.cache_mut();
            match capacity {
                Some(capacity) => {
                    cache.recreate(*capacity)?;
                    println!("🗃️  Cache enabled with {} entries", capacity.to_string().cyan());
                }
                None => {
                    if cache.is_enabled() {
                        cache.destroy()?;
                    }
                    println!("🗃️  Cache disabled");
                }
            }
        }
        Command::Stats => {
            let state = if array.is_mounted() {
                "mounted".green()
            } else {
                "unmounted".yellow()
            };
            println!("{}", "📊 Array Info".bright_yellow().bold());
            println!("{}: {}", "State".blue(), state);
            println!("{}: {} bytes", "Capacity".blue(), TOTAL_CAPACITY);
            let cache = array.cache();
            if cache.is_enabled() {
                println!(
                    "{}: {}/{} entries",
                    "Cache".blue(),
                    cache.len(),
                    cache.capacity()
                );
                println!("{}", cache.hit_rate_report());
            } else {
                println!("{}: {}", "Cache".blue(), "disabled".bright_black());
            }
        }
        Command::Clear => execute!(stdout(), Clear(ClearType::All), cursor::MoveTo(0, 0))?,
        Command::Exit => println!("{}", "👋 Exiting mdadm shell...".yellow().bold()),
    }

    Ok(())
}

fn zero_array(array: &mut Array) -> Result<(), Box<dyn Error>> {
    let confirmed = Confirm::new()
        .with_prompt("Overwrite the whole array with zeros?")
        .default(false)
        .interact()?;
    if !confirmed {
        println!("{}", "Cancelled".bright_black());
        return Ok(());
    }

    let zeros = [0u8; MAX_IO_SIZE];
    let steps = (TOTAL_CAPACITY / MAX_IO_SIZE) as u64;
    let pb = ProgressBar::new(steps);
    pb.set_style(
        ProgressStyle::with_template("[{bar:40.green/black}] {pos:>4}/{len} {msg}")?
            .progress_chars("#>-"),
    );
    for step in 0..steps {
        let addr = (step as usize * MAX_IO_SIZE) as u32;
        if let Err(e) = array.write(addr, MAX_IO_SIZE as u32, Some(&zeros)) {
            pb.abandon_with_message("❌ aborted");
            return Err(e.into());
        }
        pb.inc(1);
    }
    pb.finish_with_message("✅ Array zeroed");
    Ok(())
}

fn print_hex_dump(base: u32, bytes: &[u8]) {
    for (i, line) in bytes.chunks(16).enumerate() {
        let addr = base as usize + i * 16;
        let hex: Vec<String> = line.iter().map(|b| format!("{:02x}", b)).collect();
        let ascii: String = line
            .iter()
            .map(|&b| {
                if b.is_ascii_graphic() || b == b' ' {
                    b as char
                } else {
                    '.'
                }
            })
            .collect();
        println!(
            "{}  {:<47}  {}",
            format!("{:#08x}", addr).blue(),
            hex.join(" "),
            ascii.bright_black()
        );
    }
}

fn print_help() {
    println!("{}", "📘 mdadm Commands".bright_cyan().bold());
    println!(
        "{}",
        "
  mount                     Mount the array
  unmount                   Unmount the array
  read <addr> <len>         Hex dump <len> bytes (max 1024) starting at <addr>
  write <addr> <text>       Write text at <addr>
  fill <addr> <len> <byte>  Write <len> copies of <byte> at <addr>
  zero                      Overwrite the whole array with zeros
  cache <n>|off             Recreate the block cache with <n> entries, or drop it
  stats                     Show mount state and cache hit rate
  clear                     Clear the screen
  help                      Show this help message
  exit                      Quit the shell

  Addresses and lengths accept decimal or 0x-prefixed hex.
"
        .bright_black()
    );
}
