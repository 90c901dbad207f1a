// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Custom resource types served by the operator.

pub mod olsconfig;

pub use olsconfig::OLSConfig;
