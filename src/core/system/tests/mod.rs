// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! System wiring and event-loop tests

mod execution;
mod helpers;
