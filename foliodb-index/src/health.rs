// SPDX-License-Identifier: AGPL-3.0-or-later
// FolioDB - Filesystem-Backed JSON Document Database
// Copyright (C) 2026 Sushanth Reddy Vanagala (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Index health reporting

use crate::engine::{IndexDiskState, IndexEngine};

/// Expected vs. observed condition of a collection's declared indices.
#[derive(Debug, Clone, Default)]
pub struct IndexHealthReport {
    /// Every index the schema declares.
    pub expected: Vec<String>,
    /// Indices with shard files on disk that all parse.
    pub present: Vec<String>,
    /// Declared indices with no shard file on disk.
    pub missing: Vec<String>,
    /// Indices with at least one unparseable shard file.
    pub corrupted: Vec<String>,
}

impl IndexHealthReport {
    /// Probe a set of engines and classify each by on-disk state.
    pub fn check<'a, I>(engines: I) -> Self
    where
        I: IntoIterator<Item = &'a IndexEngine>,
    {
        let mut report = Self::default();
        for engine in engines {
            let name = engine.name().to_string();
            report.expected.push(name.clone());
            match engine.disk_state() {
                IndexDiskState::Present => report.present.push(name),
                IndexDiskState::Missing => report.missing.push(name),
                IndexDiskState::Corrupted => report.corrupted.push(name),
            }
        }
        report.expected.sort();
        report.present.sort();
        report.missing.sort();
        report.corrupted.sort();
        report
    }

    /// All expected indices are present and parse cleanly.
    pub fn is_healthy(&self) -> bool {
        self.missing.is_empty() && self.corrupted.is_empty()
    }
}
