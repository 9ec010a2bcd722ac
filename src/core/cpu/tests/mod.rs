// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! CPU test modules
//!
//! - `basic`: initialization, reset, register access, stepping
//! - `decode`: field extraction and operation classification
//! - `load_delay`: load delay slot behavior, LWL/LWR merging
//! - `exceptions`: exception entry, delay slots, interrupts
//! - `cop0`: MFC0/MTC0/RFE and cache isolation
//! - `instructions`: ALU, multiply/divide, branches, memory access
//! - `cop2`: GTE transfers and command cycles

mod helpers;

mod cop2;
mod exceptions;
