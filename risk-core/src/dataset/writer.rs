use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use parking_lot::Mutex;
use serde::Serialize;

use crate::error::RiskResult;
use crate::features::TelemetryRecord;

const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10 MB
const FILE_PREFIX: &str = "telemetry-";
const FILE_EXTENSION: &str = "jsonl";

/// Append-only JSONL log of raw telemetry
pub struct TelemetryLog {
    file: Mutex<Option<File>>,
    base_dir: PathBuf,
    max_file_size: u64,
    written: AtomicU64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TelemetryLogStats {
    pub total_files: usize,
    pub total_size_mb: f32,
    pub current_file: Option<String>,
    /// Records appended by this process
    pub records_written: u64,
}

impl TelemetryLog {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self::with_max_file_size(base_dir, MAX_FILE_SIZE)
    }

    pub fn with_max_file_size(base_dir: impl Into<PathBuf>, max_file_size: u64) -> Self {
        Self {
            file: Mutex::new(None),
            base_dir: base_dir.into(),
            max_file_size,
            written: AtomicU64::new(0),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.base_dir
    }

    /// Append one record, filling a missing timestamp with the current time.
    /// Rotates to a new file once the current one reaches the size limit.
    pub fn append(&self, record: &TelemetryRecord) -> RiskResult<()> {
        let line = if record.ts.is_some() {
            serde_json::to_string(record)?
        } else {
            let mut stamped = record.clone();
            stamped.ts = Some(Utc::now());
            serde_json::to_string(&stamped)?
        };

        let mut guard = self.file.lock();

        if guard.is_none() {
            fs::create_dir_all(&self.base_dir)?;
            *guard = Some(match self.log_files()?.pop() {
                Some(path) => OpenOptions::new().create(true).append(true).open(path)?,
                None => self.create_new_file()?,
            });
        }

        let should_rotate = match guard.as_ref() {
            Some(f) => f.metadata()?.len() >= self.max_file_size,
            None => false,
        };
        if should_rotate {
            *guard = Some(self.create_new_file()?);
        }

        if let Some(file) = guard.as_mut() {
            writeln!(file, "{}", line)?;
            self.written.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }

    /// Every readable record, oldest file first. Unparsable lines are skipped.
    pub fn load_pool(&self) -> RiskResult<Vec<TelemetryRecord>> {
        let mut pool = Vec::new();

        for path in self.log_files()? {
            let reader = BufReader::new(File::open(&path)?);
            for (n, line) in reader.lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<TelemetryRecord>(&line) {
                    Ok(record) => pool.push(record),
                    Err(e) => log::warn!("Skipping {}:{}: {}", path.display(), n + 1, e),
                }
            }
        }

        log::debug!("Loaded {} telemetry records from {}", pool.len(), self.base_dir.display());
        Ok(pool)
    }

    pub fn stats(&self) -> RiskResult<TelemetryLogStats> {
        let files = self.log_files()?;
        let mut size = 0u64;
        for path in &files {
            size += fs::metadata(path)?.len();
        }

        Ok(TelemetryLogStats {
            total_files: files.len(),
            total_size_mb: size as f32 / 1024.0 / 1024.0,
            current_file: files
                .last()
                .and_then(|p| p.file_name())
                .and_then(|n| n.to_str())
                .map(str::to_string),
            records_written: self.written.load(Ordering::Relaxed),
        })
    }

    fn create_new_file(&self) -> RiskResult<File> {
        let next = self
            .log_files()?
            .last()
            .and_then(|p| sequence_of(p))
            .map_or(0, |seq| seq + 1);

        // Zero-padded sequence first so name order is write order
        let filename = format!(
            "{}{:06}-{}.{}",
            FILE_PREFIX,
            next,
            Utc::now().format("%Y-%m-%d-%H%M%S"),
            FILE_EXTENSION
        );
        let path = self.base_dir.join(filename);
        log::info!("Opening telemetry log {}", path.display());

        Ok(OpenOptions::new().create(true).append(true).open(path)?)
    }

    /// Log files sorted oldest first; empty if the directory is absent
    fn log_files(&self) -> RiskResult<Vec<PathBuf>> {
        let entries = match fs::read_dir(&self.base_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(|res| res.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().map_or(false, |ext| ext == FILE_EXTENSION))
            .filter(|p| sequence_of(p).is_some())
            .collect();

        files.sort();
        Ok(files)
    }
}

fn sequence_of(path: &Path) -> Option<u64> {
    path.file_name()?
        .to_str()?
        .strip_prefix(FILE_PREFIX)?
        .split('-')
        .next()?
        .parse()
        .ok()
}
