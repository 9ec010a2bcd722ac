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

//! PlayStation hardware emulation engine
//!
//! Bus/device dispatch, the global event scheduler, the R3000A CPU with its
//! geometry coprocessor, DMA, the CD-ROM controller and the interrupt
//! controller, wired together by [`core::System`].
//!
//! # Example
//!
//! ```
//! use psx_engine::core::{EmulatorConfig, System};
//!
//! let mut system = System::new(&EmulatorConfig::default());
//!
//! // Execute one instruction from the (empty) BIOS
//! let cycles = system.step().unwrap();
//! assert_eq!(cycles, 1);
//! assert_eq!(system.pc(), 0xBFC0_0004);
//! ```

pub mod core;
