//! Interactive full-trim front-end
//!
//! The consent-gathering half of the tool: privilege check, device table
//! with the system disk marked, selection, a red banner with a typed
//! confirmation, then one call into `fulltrim_core` with a rewriting
//! progress line. Exit code 0 for success or a cancelled run, 1 for any
//! failure.

mod admin;
mod console;
#[cfg(not(windows))]
mod fallback;
mod logger;

use std::io::{self, Write};
use std::process;

use anyhow::{bail, Result};
use clap::Parser;
use fulltrim_core::{list_devices, run_full_trim, DiskInfo, TrimReport};

use crate::console::Selection;

#[cfg(windows)]
use fulltrim_core::WindowsHost as Host;

#[cfg(not(windows))]
use crate::fallback::UnsupportedHost as Host;

#[derive(Parser)]
#[command(
    name = "fulltrim",
    about = "Deallocate every block of a USB-attached SSD via SCSI UNMAP",
    version
)]
struct Cli {
    /// Target device id (skips the selection prompt, not the confirmation)
    #[arg(long)]
    device: Option<u32>,

    /// List devices and exit
    #[arg(long)]
    list: bool,

    /// Debug logging on stderr
    #[arg(long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    logger::init(cli.verbose);
    console::init();

    let code = match run(&cli) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    if !cli.list {
        console::pause();
    }
    process::exit(code);
}

fn run(cli: &Cli) -> Result<i32> {
    let host = Host::default();

    if cli.list {
        let devices = list_devices(&host);
        if devices.is_empty() {
            println!("No devices found.");
        } else {
            print_table(&devices);
        }
        return Ok(0);
    }

    println!("=== USB SSD Full Trim ===");
    println!();

    if !admin::is_elevated() {
        bail!("administrator privileges are required; run from an elevated prompt");
    }

    let devices = list_devices(&host);
    if devices.is_empty() {
        println!("No devices found.");
        return Ok(1);
    }

    print_table(&devices);
    println!();

    let selected = match cli.device {
        Some(id) => match devices.iter().find(|d| d.device_id == id) {
            Some(disk) => disk,
            None => bail!("device {id} is not present"),
        },
        None => match prompt_selection(&devices)? {
            Some(disk) => disk,
            None => {
                println!("Operation cancelled.");
                return Ok(0);
            }
        },
    };

    if !confirm(selected)? {
        println!("Operation cancelled.");
        return Ok(0);
    }

    println!();
    println!("Executing full trim on device {}...", selected.device_id);

    let mut progressed = false;
    let report = run_full_trim(&host, selected.device_id, |p| {
        progressed = true;
        print!("  Progress: {:5.1}%\r", p.percent());
        let _ = io::stdout().flush();
    });
    if progressed {
        // Step past the \r progress line
        println!();
    }

    Ok(report_outcome(&report))
}

fn print_table(devices: &[DiskInfo]) {
    println!("Available devices:");
    for disk in devices {
        let line = format!(
            "  [{}] {} - {}",
            disk.device_id,
            disk.model,
            console::format_size(disk.size_bytes)
        );
        if disk.is_system {
            let marked = format!("{line} [SYSTEM DISK - Windows]");
            println!("{}", console::paint(console::YELLOW, &marked));
        } else {
            println!("{line}");
        }
    }
}

fn prompt_selection(devices: &[DiskInfo]) -> Result<Option<&DiskInfo>> {
    let input = console::read_line("Enter device number to trim (or 'q' to quit): ")?;
    match console::parse_selection(&input) {
        Selection::Quit => Ok(None),
        Selection::Device(id) => match devices.iter().find(|d| d.device_id == id) {
            Some(disk) => Ok(Some(disk)),
            None => bail!("device {id} is not in the list"),
        },
        Selection::Invalid => bail!("not a device number"),
    }
}

/// The last gate before data loss: banner, target line, typed `yes`
fn confirm(disk: &DiskInfo) -> Result<bool> {
    const BANNER_TEXT: &str = "  *** WARNING: ALL DATA ON THIS DEVICE WILL BE DESTROYED! ***  ";
    let blank = " ".repeat(BANNER_TEXT.len());

    println!();
    println!("{}", console::paint(console::BANNER, &blank));
    println!("{}", console::paint(console::BANNER, BANNER_TEXT));
    println!("{}", console::paint(console::BANNER, &blank));
    println!();

    let target = format!(
        "  Target: [{}] {} ({})",
        disk.device_id,
        disk.model,
        console::format_size(disk.size_bytes)
    );
    println!("{}", console::paint(console::RED, &target));
    if disk.is_system {
        println!(
            "{}",
            console::paint(
                console::RED,
                "  This is the SYSTEM disk. Windows will not survive the trim."
            )
        );
    }
    println!();
    println!("This operation sends a deallocation command covering the entire device.");
    println!(
        "{}",
        console::paint(
            console::RED,
            "Data recovery will be IMPOSSIBLE after this operation."
        )
    );
    println!();

    let input = console::read_line("Type 'yes' to confirm: ")?;
    Ok(console::confirms_destruction(&input))
}

fn report_outcome(report: &TrimReport) -> i32 {
    for warning in &report.warnings {
        println!("  Warning: {warning}");
    }
    match &report.result {
        Ok(()) => {
            let bytes = report
                .blocks_trimmed
                .saturating_mul(report.sector_size as u64);
            println!(
                "Trim completed: {} blocks ({}) deallocated.",
                report.blocks_trimmed,
                console::format_size(bytes)
            );
            0
        }
        Err(error) => {
            let line = format!("Trim failed: {error}");
            println!("{}", console::paint(console::RED, &line));
            1
        }
    }
}
