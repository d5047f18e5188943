use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};

use pyv_core::{EngineError, PrefixLayout};

/// Exclusive lock over the managed prefix, held for the duration of one
/// mutating operation and released on drop. Concurrent invocations
/// against the same prefix fail fast instead of racing on the directory
/// tree and symlink swap.
pub struct PrefixLock {
    _file: File,
}

impl PrefixLock {
    /// # Errors
    /// Returns `PrefixLocked` when another process holds the lock, or an
    /// IO error when the lock file cannot be created or written.
    pub fn acquire(layout: &PrefixLayout) -> Result<Self, EngineError> {
        layout
            .ensure_dirs()
            .map_err(|error| EngineError::io("failed to create managed directories", error))?;

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(layout.lock_file())
            .map_err(|error| EngineError::io("failed to open prefix lock file", error))?;

        match file.try_lock_exclusive() {
            Ok(()) => {}
            Err(error) if error.kind() == std::io::ErrorKind::WouldBlock => {
                return Err(EngineError::PrefixLocked);
            }
            Err(error) => {
                return Err(EngineError::io("failed to acquire prefix lock", error));
            }
        }

        file.set_len(0)
            .and_then(|()| file.seek(SeekFrom::Start(0)).map(|_| ()))
            .and_then(|()| writeln!(file, "{}", std::process::id()))
            .map_err(|error| EngineError::io("failed to write prefix lock metadata", error))?;

        Ok(Self { _file: file })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyv_core::Config;

    fn layout_in(temp: &tempfile::TempDir) -> PrefixLayout {
        PrefixLayout::new(&Config {
            prefix: temp.path().to_path_buf(),
            mirror: String::new(),
        })
    }

    #[test]
    fn second_acquire_fails_while_lock_is_held() {
        let temp = tempfile::tempdir().unwrap();
        let layout = layout_in(&temp);

        let _held = PrefixLock::acquire(&layout).expect("first acquire should succeed");
        assert!(matches!(
            PrefixLock::acquire(&layout),
            Err(EngineError::PrefixLocked)
        ));
    }

    #[test]
    fn lock_is_released_on_drop() {
        let temp = tempfile::tempdir().unwrap();
        let layout = layout_in(&temp);

        drop(PrefixLock::acquire(&layout).expect("first acquire should succeed"));
        assert!(PrefixLock::acquire(&layout).is_ok());
    }
}
