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

//! Emulator configuration
//!
//! Loaded from a TOML file. Every field has a default, so an empty file (or
//! no file at all) yields a runnable configuration:
//!
//! ```toml
//! bios = "bios/SCPH1001.BIN"
//! disc = "games/demo.bin"
//! log_level = "debug"
//!
//! [timing]
//! vblank_interval = 564480
//! cdrom_ack_delay = 50000
//! ```
//!
//! The binary layers sources as defaults, then the file, then the
//! environment ([`EmulatorConfig::apply_env`]), then command-line flags.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::cdrom::{DEFAULT_ACK_DELAY, DEFAULT_SECTOR_CYCLES};
use crate::core::error::{EmulatorError, Result};
use crate::core::scheduler::Clock;

/// Environment variable naming the BIOS image
pub const ENV_BIOS_PATH: &str = "PSX_BIOS_PATH";

/// Environment variable naming the disc image
pub const ENV_DISC_PATH: &str = "PSX_DISC_PATH";

/// CPU clock divided by 60 frames per second
pub const DEFAULT_VBLANK_INTERVAL: Clock = 33_868_800 / 60;

/// Upper bound for [`TimingConfig::dma_irq_delay_per_word`]
pub const MAX_DMA_IRQ_DELAY_PER_WORD: Clock = 1024;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmulatorConfig {
    /// BIOS image (must be 512KB)
    pub bios: PathBuf,

    /// Raw 2352-byte-sector disc image
    pub disc: Option<PathBuf>,

    pub timing: TimingConfig,

    /// Default `env_logger` filter when `RUST_LOG` is unset
    pub log_level: String,
}

/// Clock rates, all in CPU cycles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimingConfig {
    /// Multiplier applied to each instruction's cycle cost
    pub cpu_cycles_per_instruction: Clock,

    /// Period of the vertical blank event
    pub vblank_interval: Clock,

    /// Command to first response latency
    pub cdrom_ack_delay: Clock,

    /// Single-speed sector period
    pub cdrom_sector_cycles: Clock,

    /// DMA completion interrupt latency per transferred word; 0 raises it
    /// on the completing store
    pub dma_irq_delay_per_word: Clock,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            bios: PathBuf::from("SCPH1001.BIN"),
            disc: None,
            timing: TimingConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            cpu_cycles_per_instruction: 1,
            vblank_interval: DEFAULT_VBLANK_INTERVAL,
            cdrom_ack_delay: DEFAULT_ACK_DELAY,
            cdrom_sector_cycles: DEFAULT_SECTOR_CYCLES,
            dma_irq_delay_per_word: 0,
        }
    }
}

impl EmulatorConfig {
    /// Read and validate a TOML file
    ///
    /// # Errors
    ///
    /// - `Io` if the file cannot be read
    /// - `Config` on a parse error or an invalid value
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        log::debug!("Config loaded from {}", path.display());
        Ok(config)
    }

    /// Parse and validate TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| EmulatorError::Config(e.to_string()))
    }

    /// Reject values the scheduler cannot run with
    pub fn validate(&self) -> Result<()> {
        let timing = &self.timing;
        let intervals = [
            ("cpu_cycles_per_instruction", timing.cpu_cycles_per_instruction),
            ("vblank_interval", timing.vblank_interval),
            ("cdrom_ack_delay", timing.cdrom_ack_delay),
            ("cdrom_sector_cycles", timing.cdrom_sector_cycles),
        ];
        for (name, value) in intervals {
            if value == 0 {
                return Err(EmulatorError::Config(format!(
                    "timing.{} must be non-zero",
                    name
                )));
            }
        }
        if timing.dma_irq_delay_per_word > MAX_DMA_IRQ_DELAY_PER_WORD {
            return Err(EmulatorError::Config(format!(
                "timing.dma_irq_delay_per_word must be at most {} (got {})",
                MAX_DMA_IRQ_DELAY_PER_WORD, timing.dma_irq_delay_per_word
            )));
        }
        if self.log_level.parse::<log::LevelFilter>().is_err() {
            return Err(EmulatorError::Config(format!(
                "unknown log level '{}'",
                self.log_level
            )));
        }
        Ok(())
    }

    /// Override paths from the process environment
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    /// Override paths from a variable lookup
    ///
    /// Empty values are ignored.
    pub fn apply_vars<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bios) = lookup(ENV_BIOS_PATH).filter(|v| !v.is_empty()) {
            self.bios = PathBuf::from(bios);
        }
        if let Some(disc) = lookup(ENV_DISC_PATH).filter(|v| !v.is_empty()) {
            self.disc = Some(PathBuf::from(disc));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_file_is_default() {
        let config = EmulatorConfig::from_toml_str("").unwrap();
        assert_eq!(config, EmulatorConfig::default());
        assert_eq!(config.timing.vblank_interval, 564_480);
    }

    #[test]
    fn test_partial_timing_table() {
        let config = EmulatorConfig::from_toml_str(
            r#"
            bios = "roms/scph5501.bin"
            disc = "game.bin"

            [timing]
            cdrom_ack_delay = 1000
            "#,
        )
        .unwrap();

        assert_eq!(config.bios, PathBuf::from("roms/scph5501.bin"));
        assert_eq!(config.disc, Some(PathBuf::from("game.bin")));
        assert_eq!(config.timing.cdrom_ack_delay, 1000);
        assert_eq!(config.timing.cdrom_sector_cycles, DEFAULT_SECTOR_CYCLES);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = EmulatorConfig::from_toml_str("[timing]\nvblank_interval = 0\n").unwrap_err();
        match err {
            EmulatorError::Config(msg) => assert!(msg.contains("vblank_interval")),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_dma_irq_delay_bounds() {
        let config =
            EmulatorConfig::from_toml_str("[timing]\ndma_irq_delay_per_word = 0\n").unwrap();
        assert_eq!(config.timing.dma_irq_delay_per_word, 0);

        let config =
            EmulatorConfig::from_toml_str("[timing]\ndma_irq_delay_per_word = 4\n").unwrap();
        assert_eq!(config.timing.dma_irq_delay_per_word, 4);

        let err = EmulatorConfig::from_toml_str("[timing]\ndma_irq_delay_per_word = 5000\n")
            .unwrap_err();
        match err {
            EmulatorError::Config(msg) => assert!(msg.contains("dma_irq_delay_per_word")),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_bad_log_level_rejected() {
        let err = EmulatorConfig::from_toml_str("log_level = \"loud\"").unwrap_err();
        assert!(matches!(err, EmulatorError::Config(_)));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = EmulatorConfig::from_toml_str("bois = \"x.bin\"").unwrap_err();
        assert!(matches!(err, EmulatorError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "log_level = \"trace\"").unwrap();
        writeln!(file, "[timing]").unwrap();
        writeln!(file, "cpu_cycles_per_instruction = 2").unwrap();

        let config = EmulatorConfig::load(file.path()).unwrap();
        assert_eq!(config.log_level, "trace");
        assert_eq!(config.timing.cpu_cycles_per_instruction, 2);
    }

    #[test]
    fn test_load_missing_file() {
        let err = EmulatorConfig::load("/nonexistent/psx.toml").unwrap_err();
        assert!(matches!(err, EmulatorError::Io(_)));
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = EmulatorConfig::default();
        config.disc = Some(PathBuf::from("disc.bin"));
        config.timing.cdrom_ack_delay = 777;

        let text = config.to_toml_string().unwrap();
        assert_eq!(EmulatorConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_environment_overrides_paths() {
        let mut config = EmulatorConfig::default();
        config.apply_vars(|key| match key {
            ENV_BIOS_PATH => Some("/bios/scph1001.bin".to_string()),
            ENV_DISC_PATH => Some(String::new()),
            _ => None,
        });

        assert_eq!(config.bios, PathBuf::from("/bios/scph1001.bin"));
        assert_eq!(config.disc, None);
    }
}
