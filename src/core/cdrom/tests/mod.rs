// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Unit tests for the CD-ROM controller organized by category

mod helpers;
