// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Converge one live object onto its desired state.

pub mod merge;
pub mod objects;

pub use objects::{sync_object, ManagedObject, ObjectKind, SyncOutcome};
