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

//! Error types for FolioDB

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FolioDbError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Relation error: {0}")]
    Relation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("No database at {0}: metadata file is missing")]
    MissingDatabase(String),

    #[error("Refusing to create database in non-empty directory: {0}")]
    NotEmptyDatabase(String),

    #[error("Planner error: {0}")]
    Planner(String),

    #[error("Backup error: {0}")]
    Backup(String),
}

impl From<serde_json::Error> for FolioDbError {
    fn from(err: serde_json::Error) -> Self {
        FolioDbError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FolioDbError>;
