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

use super::super::decode::Instruction;
use super::super::{ExceptionCause, CPU};

impl CPU {
    // === Trap Instructions ===

    /// SYSCALL: raise a Syscall exception
    pub(in crate::core::cpu) fn op_syscall(&mut self) {
        self.exception(ExceptionCause::Syscall);
    }

    /// BREAK: raise a Breakpoint exception
    pub(in crate::core::cpu) fn op_break(&mut self) {
        self.exception(ExceptionCause::Breakpoint);
    }

    /// COP1/COP3 and LWCz/SWCz for absent coprocessors
    pub(in crate::core::cpu) fn op_cop_unusable(&mut self, instr: Instruction) {
        log::debug!(
            "CPU: coprocessor {} unusable (0x{:08X})",
            instr.cop(),
            instr.0
        );
        self.coprocessor_unusable(instr.cop());
    }
}
