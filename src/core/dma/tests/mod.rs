// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Unit tests for DMA controller organized by category

mod helpers;
mod transfers;
