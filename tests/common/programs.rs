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

//! Small hand-assembled test programs

/// Register arithmetic
pub fn basic_arithmetic() -> Vec<u32> {
    vec![
        0x24010001, // ADDIU $1, $0, 1      ; $1 = 1
        0x24020002, // ADDIU $2, $0, 2      ; $2 = 2
        0x00221820, // ADD   $3, $1, $2     ; $3 = 3
        0x00000000, // NOP
    ]
}

/// Scratchpad store and load
pub fn load_store() -> Vec<u32> {
    vec![
        0x3C011F80, // LUI   $1, 0x1F80     ; $1 = 0x1F800000
        0x240200AA, // ADDIU $2, $0, 0xAA   ; $2 = 0xAA
        0xAC220000, // SW    $2, 0($1)      ; Store to 0x1F800000
        0x8C230000, // LW    $3, 0($1)      ; Load from 0x1F800000
        0x00000000, // NOP (load delay)
        0x00000000, // NOP
    ]
}

/// Taken branch with delay slot
pub fn branch() -> Vec<u32> {
    vec![
        0x24010001, // ADDIU $1, $0, 1      ; $1 = 1
        0x24020001, // ADDIU $2, $0, 1      ; $2 = 1
        0x10220002, // BEQ   $1, $2, +2     ; Taken
        0x24050007, // ADDIU $5, $0, 7      ; Delay slot, runs
        0x24030042, // ADDIU $3, $0, 0x42   ; Skipped
        0x24040099, // ADDIU $4, $0, 0x99   ; Branch target
    ]
}

/// Arithmetic, a scratchpad round trip and a multiply, then a tight loop
///
/// The golden snapshot in `tests/golden/` is taken after 20 instructions.
pub fn golden() -> Vec<u32> {
    vec![
        0x24010001, // ADDIU $1, $0, 1
        0x24020002, // ADDIU $2, $0, 2
        0x00221820, // ADD   $3, $1, $2
        0x3C041F80, // LUI   $4, 0x1F80
        0x240500AA, // ADDIU $5, $0, 0xAA
        0xAC850000, // SW    $5, 0($4)
        0x8C860000, // LW    $6, 0($4)
        0x00000000, // NOP (load delay)
        0x00C20019, // MULTU $6, $2
        0x00003812, // MFLO  $7
        0x1000FFFF, // BEQ   $0, $0, -1     ; loop here forever
        0x00000000, // NOP (delay slot)
    ]
}
