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

//! FolioDB Index Engine
//!
//! On-disk secondary indices over JSON documents:
//!
//! - **Composite keys**: normalized values joined by a reserved separator
//! - **Sharded postings**: `md5(key) mod shard_count` routing to JSON
//!   shard files rewritten atomically on every mutation
//! - **Residency cache**: a small FIFO set of parsed shards per engine
//! - **Lookups**: exact (one shard), whole-segment prefix and numeric
//!   range (all shards), plus full rebuild from a document stream

pub mod cache;
pub mod engine;
pub mod health;
pub mod key;
pub mod shard;

pub use cache::{CacheStats, ShardCache, DEFAULT_CACHE_CAPACITY};
pub use engine::{IndexDiskState, IndexEngine, DEFAULT_SHARD_COUNT, INDEX_DIR};
pub use health::IndexHealthReport;
pub use shard::{shard_file_name, Postings, Shard, ShardMap};
