// Copyright 2025 Eric Jingryd (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Where the reloader reads configuration documents from

use std::{
    fs, io,
    path::{Path, PathBuf},
    time::SystemTime,
};

/// Readable configuration document with a modification time
pub trait ConfigSource {
    /// Last modification time of the document
    fn modified(&self) -> io::Result<SystemTime>;

    /// Full document text
    fn read(&self) -> io::Result<String>;
}

/// Configuration file on disk
#[derive(Clone, Debug)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for FileSource {
    fn modified(&self) -> io::Result<SystemTime> {
        fs::metadata(&self.path)?.modified()
    }

    fn read(&self) -> io::Result<String> {
        fs::read_to_string(&self.path)
    }
}

/// Whether an IO error means another process holds the file right now
///
/// Such reads are retried; every other IO error is reported.
pub fn is_transient_lock(error: &io::Error) -> bool {
    if matches!(
        error.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::ResourceBusy
    ) {
        return true;
    }

    // ERROR_SHARING_VIOLATION, ERROR_LOCK_VIOLATION
    cfg!(windows) && matches!(error.raw_os_error(), Some(32) | Some(33))
}
