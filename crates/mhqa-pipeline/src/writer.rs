//! Trajectory sinks. Each finished trajectory is written as one unit, so an
//! interrupted run never leaves a half-written record behind.

use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use mhqa_core::error::Result;
use mhqa_core::traits::TrajectoryWriter;
use mhqa_core::trajectory::Trajectory;

/// Only the resume key is read back from persisted records.
#[derive(Deserialize)]
struct RecordKey {
    question_id: String,
}

/// Appends one JSON object per line.
pub struct JsonlWriter {
    path: PathBuf,
    file: File,
}

impl JsonlWriter {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).read(true).append(true).open(&path)?;
        // A crash mid-line leaves no trailing newline; start the next record on a fresh line.
        if file.metadata()?.len() > 0 {
            let mut last = [0u8; 1];
            file.seek(SeekFrom::End(-1))?;
            file.read_exact(&mut last)?;
            if last[0] != b'\n' {
                file.write_all(b"\n")?;
            }
        }
        Ok(Self { path, file })
    }
}

impl TrajectoryWriter for JsonlWriter {
    fn write(&mut self, trajectory: &Trajectory) -> Result<()> {
        let mut line = serde_json::to_vec(trajectory)?;
        line.push(b'\n');
        self.file.write_all(&line)?;
        self.file.flush()?;
        Ok(())
    }

    fn existing_ids(&self) -> Result<HashSet<String>> {
        // Raw bytes: a torn record may end inside a multibyte character.
        let reader = BufReader::new(File::open(&self.path)?);
        let mut ids = HashSet::new();
        for (n, line) in reader.split(b'\n').enumerate() {
            let line = line?;
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            match serde_json::from_slice::<RecordKey>(&line) {
                Ok(k) => {
                    ids.insert(k.question_id);
                }
                Err(e) => warn!(path = %self.path.display(), line = n + 1, error = %e, "skipping unreadable record"),
            }
        }
        Ok(ids)
    }
}

/// Writes `mhqa_<question id>.json` per trajectory into a directory.
pub struct DirWriter {
    dir: PathBuf,
}

impl DirWriter {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// `mhqa_<id>.json`. Ids that need sanitizing get a short hash of the raw
    /// id appended, so distinct ids never share a file.
    pub fn file_for(&self, question_id: &str) -> PathBuf {
        let safe = sanitize(question_id);
        if safe == question_id {
            self.dir.join(format!("mhqa_{safe}.json"))
        } else {
            let hash = blake3::hash(question_id.as_bytes()).to_hex();
            self.dir.join(format!("mhqa_{safe}-{}.json", &hash[..12]))
        }
    }
}

impl TrajectoryWriter for DirWriter {
    fn write(&mut self, trajectory: &Trajectory) -> Result<()> {
        write_json_file(&self.file_for(trajectory.question_id()), trajectory)
    }

    fn existing_ids(&self) -> Result<HashSet<String>> {
        let mut ids = HashSet::new();
        for entry in walkdir::WalkDir::new(&self.dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let name = entry.file_name().to_string_lossy();
            if !(name.starts_with("mhqa_") && name.ends_with(".json")) {
                continue;
            }
            let parsed = fs::read(entry.path())
                .map_err(mhqa_core::error::Error::from)
                .and_then(|bytes| serde_json::from_slice::<RecordKey>(&bytes).map_err(Into::into));
            match parsed {
                Ok(k) => {
                    ids.insert(k.question_id);
                }
                Err(e) => warn!(path = %entry.path().display(), error = %e, "skipping unreadable trajectory file"),
            }
        }
        Ok(ids)
    }
}

/// Pretty-print one trajectory to `path`, replacing it atomically.
pub fn write_json_file(path: &Path, trajectory: &Trajectory) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut tmp, trajectory)?;
    tmp.write_all(b"\n")?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
