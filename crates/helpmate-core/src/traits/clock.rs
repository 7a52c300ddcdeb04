// SPDX-FileCopyrightText: 2026 Helpmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Injectable wall clock.

use chrono::{DateTime, Utc};

/// Source of the current time for timestamps and the edit window check.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
