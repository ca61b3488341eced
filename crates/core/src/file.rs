// SPDX-License-Identifier: MIT

//! Per-file observation records and their wire rendering.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::clock::clock_id_string;

/// A tick + wall-clock pair stamped on a file observation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockStamp {
    pub ticks: u32,
    pub seconds: i64,
}

/// Stat-shaped metadata carried for each tracked file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMeta {
    pub size: u64,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub mtime: i64,
    pub ctime: i64,
    pub ino: u64,
    pub dev: u64,
    pub nlink: u64,
}

/// A tracked file: latest metadata plus observation stamps.
///
/// `otime` is the most recent observation; `created` is the first one.
/// Removed files stay in the table with `exists: false` so that "since"
/// queries can report the deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub exists: bool,
    pub meta: FileMeta,
    pub otime: ClockStamp,
    pub created: ClockStamp,
}

/// A query match ready for wire rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileResult {
    pub name: String,
    pub entry: FileEntry,
    pub is_new: bool,
}

/// Render match results as the wire `files` array.
///
/// Stat fields are reported only for files believed to exist; stale
/// metadata on a deleted file is useless to the client.
pub fn render_file_results(results: &[FileResult]) -> Value {
    let mut files = Vec::with_capacity(results.len());

    for r in results {
        let mut record = serde_json::Map::new();
        record.insert("name".into(), Value::from(r.name.clone()));
        record.insert("exists".into(), Value::from(r.entry.exists));

        if r.entry.exists {
            let m = &r.entry.meta;
            record.insert("size".into(), Value::from(m.size));
            record.insert("mode".into(), Value::from(m.mode));
            record.insert("uid".into(), Value::from(m.uid));
            record.insert("gid".into(), Value::from(m.gid));
            record.insert("mtime".into(), Value::from(m.mtime));
            record.insert("ctime".into(), Value::from(m.ctime));
            record.insert("ino".into(), Value::from(m.ino));
            record.insert("dev".into(), Value::from(m.dev));
            record.insert("nlink".into(), Value::from(m.nlink));

            if r.is_new {
                record.insert("new".into(), Value::from(true));
            }

            record.insert(
                "cclock".into(),
                Value::from(clock_id_string(r.entry.created.ticks)),
            );
        }

        record.insert(
            "oclock".into(),
            Value::from(clock_id_string(r.entry.otime.ticks)),
        );

        files.push(Value::Object(record));
    }

    Value::Array(files)
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
