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

//! Core emulation components
//!
//! - [`memory`]: bus/device fabric, RAM, BIOS ROM and open-bus windows
//! - [`scheduler`]: the global event queue that drives time
//! - [`cpu`]: MIPS R3000A pipeline with COP0
//! - [`gte`]: geometry coprocessor (COP2)
//! - [`dma`]: seven-channel DMA engine
//! - [`cdrom`]: disc controller command/response protocol
//! - [`interrupt`]: I_STAT/I_MASK controller
//! - [`video`]: GP0/GP1 display port
//! - [`system`]: wiring and the event handlers
//! - [`config`], [`snapshot`]: configuration and state capture

pub mod cdrom;
pub mod config;
pub mod cpu;
pub mod dma;
pub mod error;
pub mod gte;
pub mod interrupt;
pub mod memory;
pub mod scheduler;
pub mod snapshot;
pub mod system;
pub mod video;

// Re-export commonly used types
pub use cdrom::CDROM;
pub use config::EmulatorConfig;
pub use cpu::CPU;
pub use dma::DMA;
pub use error::{CdRomError, EmulatorError, Result};
pub use gte::GTE;
pub use interrupt::InterruptController;
pub use memory::Bus;
pub use scheduler::Scheduler;
pub use snapshot::MachineSnapshot;
pub use system::System;
pub use video::VideoPort;
