// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Headless PlayStation emulation core runner
//!
//! Boots a BIOS (and optionally a disc image), executes a fixed number of
//! instructions and reports progress. Settings come from, in increasing
//! priority: built-in defaults, `--config`, `.env`/environment
//! (`PSX_BIOS_PATH`, `PSX_DISC_PATH`, `RUST_LOG`) and the flags below.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};
use psx_engine::core::config::EmulatorConfig;
use psx_engine::core::error::Result;
use psx_engine::core::system::System;

/// PlayStation (PSX) emulation core
#[derive(Parser)]
#[command(name = "psx-engine")]
#[command(about = "Headless PlayStation emulation core", long_about = None)]
struct Args {
    /// Path to PlayStation BIOS file (e.g., SCPH1001.BIN)
    bios_file: Option<PathBuf>,

    /// Raw 2352-byte-sector disc image
    #[arg(short = 'd', long)]
    disc: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Number of instructions to execute
    #[arg(short = 'n', long, default_value = "100000")]
    instructions: u64,

    /// Write the final machine state as JSON
    #[arg(long)]
    dump_state: Option<PathBuf>,
}

fn main() -> ExitCode {
    // .env is optional; a missing file is not worth a warning
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.as_str()),
    )
    .init();

    info!("psx-engine v{}", env!("CARGO_PKG_VERSION"));

    match run(&args, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Defaults, then the config file, then the environment, then flags
fn load_config(args: &Args) -> Result<EmulatorConfig> {
    let mut config = match &args.config {
        Some(path) => EmulatorConfig::load(path)?,
        None => EmulatorConfig::default(),
    };
    config.apply_env();

    if let Some(bios) = &args.bios_file {
        config.bios = bios.clone();
    }
    if let Some(disc) = &args.disc {
        config.disc = Some(disc.clone());
    }
    Ok(config)
}

fn run(args: &Args, config: &EmulatorConfig) -> Result<()> {
    info!("Loading BIOS from: {}", config.bios.display());
    if let Some(disc) = &config.disc {
        info!("Loading disc from: {}", disc.display());
    }
    let mut system = System::boot(config)?;

    info!("Starting emulation...");
    let total = args.instructions;
    let log_interval = (total / 10).max(1);

    for i in 0..total {
        if i % log_interval == 0 && i > 0 {
            info!(
                "Progress: {}/{} instructions | PC: 0x{:08X} | Cycles: {}",
                i,
                total,
                system.pc(),
                system.cycles()
            );
        }

        if let Err(e) = system.step() {
            error!("Error at PC=0x{:08X}: {}", system.cpu().current_pc(), e);
            error!("Instruction count: {}", i);
            error!("Registers:\n{}", system.cpu().dump_registers());
            return Err(e);
        }
    }

    info!("Emulation completed");
    info!("Total instructions: {}", system.instructions());
    info!("Total cycles: {}", system.cycles());
    info!("Final PC: 0x{:08X}", system.pc());

    if let Some(path) = &args.dump_state {
        system.snapshot().save_json(path)?;
        info!("State written to {}", path.display());
    }

    Ok(())
}
