// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Unit tests for the interrupt controller organized by category

mod delayed;
