// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Headless machine runner: boots a Mac ROM against the null collaborators.

use mac68k::machine::{Bridges, Machine, MachineConfig};

use clap::Parser;
use log::info;

use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(version, about = "68040 Macintosh emulator", long_about = None)]
struct Args {
    /// ROM image path (raw 512K/1M/4M or CHRP wrapper).
    #[arg(short, long)]
    rom: PathBuf,

    /// RAM size in MiB.
    #[arg(long, default_value_t = 8)]
    ram: u32,

    /// XPRAM backing file.
    #[arg(long)]
    xpram: Option<PathBuf>,

    /// Gestalt model ID to report.
    #[arg(long, default_value_t = 5)]
    model_id: u8,

    /// Report an FPU to the guest.
    #[arg(long, default_value_t = false)]
    fpu: bool,

    /// Skip the CD-ROM driver.
    #[arg(long, default_value_t = false)]
    nocdrom: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let config = MachineConfig {
        ram_size: args.ram * 1024 * 1024,
        model_id: args.model_id,
        fpu: args.fpu,
        nocdrom: args.nocdrom,
        xpram_path: args.xpram,
        ..MachineConfig::default()
    };

    let rom = match std::fs::read(&args.rom) {
        Ok(rom) => rom,
        Err(e) => {
            eprintln!("reading {}: {e}", args.rom.display());
            return ExitCode::from(1);
        },
    };

    let mut machine = match Machine::new(config, Bridges::default()) {
        Ok(machine) => machine,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(e.exit_code() as u8);
        },
    };

    if let Err(e) = machine.load_rom(&rom) {
        eprintln!("{e}");
        return ExitCode::from(e.exit_code() as u8);
    }

    machine.power_on();
    machine.spawn_producers();
    info!("machine running");

    match machine.run() {
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(e.exit_code() as u8)
        },
    }
}
