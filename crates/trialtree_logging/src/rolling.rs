//! Size-based rotating log file shared across tracing writers.
//!
//! `<name>.log` is the live file; rotations are `<name>.log.1` (newest)
//! through `<name>.log.<max_files - 1>`.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

struct RollingFile {
    dir: PathBuf,
    base_name: String,
    max_files: usize,
    max_size: u64,
    file: Option<File>,
    current_size: u64,
}

impl RollingFile {
    fn open(dir: PathBuf, base_name: &str, max_files: usize, max_size: u64) -> io::Result<Self> {
        fs::create_dir_all(&dir)?;
        let mut rolling = Self {
            dir,
            base_name: sanitize_name(base_name),
            max_files: max_files.max(1),
            max_size,
            file: None,
            current_size: 0,
        };
        rolling.reopen()?;
        if rolling.current_size > rolling.max_size {
            rolling.rotate()?;
        }
        Ok(rolling)
    }

    fn live_path(&self) -> PathBuf {
        self.dir.join(format!("{}.log", self.base_name))
    }

    fn rotated_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("{}.log.{}", self.base_name, index))
    }

    fn reopen(&mut self) -> io::Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.live_path())?;
        self.current_size = file.metadata()?.len();
        self.file = Some(file);
        Ok(())
    }

    fn rotate(&mut self) -> io::Result<()> {
        if let Some(mut file) = self.file.take() {
            let _ = file.flush();
        }

        let last = self.max_files - 1;
        if last == 0 {
            // No history kept: start the live file over.
            fs::remove_file(self.live_path()).or_else(ignore_missing)?;
            return self.reopen();
        }

        fs::remove_file(self.rotated_path(last)).or_else(ignore_missing)?;
        for index in (1..last).rev() {
            let src = self.rotated_path(index);
            if src.exists() {
                fs::rename(&src, self.rotated_path(index + 1))?;
            }
        }
        let live = self.live_path();
        if live.exists() {
            fs::rename(live, self.rotated_path(1))?;
        }
        self.reopen()
    }
}

fn ignore_missing(e: io::Error) -> io::Result<()> {
    if e.kind() == io::ErrorKind::NotFound {
        Ok(())
    } else {
        Err(e)
    }
}

impl Write for RollingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.current_size > 0 && self.current_size + buf.len() as u64 > self.max_size {
            self.rotate()?;
        }
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "log file unavailable"))?;
        let written = file.write(buf)?;
        self.current_size += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

/// `MakeWriter` handing out guards onto one shared rolling file.
#[derive(Clone)]
pub(crate) struct SharedRollingWriter {
    inner: Arc<Mutex<RollingFile>>,
}

impl SharedRollingWriter {
    pub(crate) fn new(
        dir: PathBuf,
        base_name: &str,
        max_files: usize,
        max_size: u64,
    ) -> io::Result<Self> {
        let rolling = RollingFile::open(dir, base_name, max_files, max_size)?;
        Ok(Self {
            inner: Arc::new(Mutex::new(rolling)),
        })
    }
}

pub(crate) struct RollingGuard {
    inner: Arc<Mutex<RollingFile>>,
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SharedRollingWriter {
    type Writer = RollingGuard;

    fn make_writer(&'a self) -> Self::Writer {
        RollingGuard {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Write for RollingGuard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer lock poisoned"))?
            .write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer lock poisoned"))?
            .flush()
    }
}

/// Keep file names to `[A-Za-z0-9_-]`.
fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tracing_subscriber::fmt::MakeWriter;

    #[test]
    fn rotates_when_size_exceeded() {
        let temp = TempDir::new().unwrap();
        let writer = SharedRollingWriter::new(temp.path().to_path_buf(), "tt cli", 3, 10).unwrap();
        for line in ["aaaaaaaa\n", "bbbbbbbb\n", "cccccccc\n", "dddddddd\n"] {
            writer.make_writer().write_all(line.as_bytes()).unwrap();
        }

        let read = |name: &str| fs::read_to_string(temp.path().join(name)).unwrap();
        assert_eq!(read("tt_cli.log"), "dddddddd\n");
        assert_eq!(read("tt_cli.log.1"), "cccccccc\n");
        assert_eq!(read("tt_cli.log.2"), "bbbbbbbb\n");
        assert!(!temp.path().join("tt_cli.log.3").exists());
    }

    #[test]
    fn appends_to_existing_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("app.log"), "old\n").unwrap();
        let writer = SharedRollingWriter::new(temp.path().to_path_buf(), "app", 2, 1024).unwrap();
        writer.make_writer().write_all(b"new\n").unwrap();
        assert_eq!(
            fs::read_to_string(temp.path().join("app.log")).unwrap(),
            "old\nnew\n"
        );
    }

    #[test]
    fn single_file_mode_truncates() {
        let temp = TempDir::new().unwrap();
        let writer = SharedRollingWriter::new(temp.path().to_path_buf(), "app", 1, 4).unwrap();
        writer.make_writer().write_all(b"abc\n").unwrap();
        writer.make_writer().write_all(b"xyz\n").unwrap();
        assert_eq!(fs::read_to_string(temp.path().join("app.log")).unwrap(), "xyz\n");
        assert!(!temp.path().join("app.log.1").exists());
    }
}
