//! Autosave sinks.
//!
//! The scheduler calls [`WorldSaver::save`] from inside a tick, so a saver
//! must not block on disk. [`JsonFileSaver`] serializes the snapshot in place
//! and hands the bytes to a writer thread that replaces the target file
//! atomically (temp file, then rename).

use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread::JoinHandle;

use super::World;

pub trait WorldSaver: Send {
    fn save(&mut self, world: &World) -> Result<()>;

    /// Wait for outstanding writes. Called once at shutdown.
    fn finish(&mut self) {}
}

/// Saver that keeps nothing. Used when autosave is disabled.
#[derive(Debug, Default)]
pub struct NullSaver;

impl WorldSaver for NullSaver {
    fn save(&mut self, _world: &World) -> Result<()> {
        Ok(())
    }
}

pub struct JsonFileSaver {
    path: PathBuf,
    tx: Option<mpsc::Sender<Vec<u8>>>,
    writer: Option<JoinHandle<()>>,
}

impl JsonFileSaver {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating autosave directory {}", parent.display()))?;
        }
        let (tx, rx) = mpsc::channel::<Vec<u8>>();
        let target = path.clone();
        let writer = std::thread::Builder::new()
            .name("autosave-writer".into())
            .spawn(move || {
                for bytes in rx {
                    if let Err(e) = write_atomic(&target, &bytes) {
                        warn!("autosave write to {} failed: {:#}", target.display(), e);
                    } else {
                        debug!("autosave wrote {} bytes to {}", bytes.len(), target.display());
                    }
                }
            })
            .context("spawning autosave writer")?;
        Ok(Self {
            path,
            tx: Some(tx),
            writer: Some(writer),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn write_atomic(target: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = target.with_extension("json.tmp");
    fs::write(&tmp, bytes).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, target).with_context(|| format!("renaming into {}", target.display()))?;
    Ok(())
}

/// Read a snapshot written by [`JsonFileSaver`].
pub fn load_snapshot<P: AsRef<Path>>(path: P) -> Result<World> {
    let path = path.as_ref();
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&data).with_context(|| format!("parsing {}", path.display()))
}

impl WorldSaver for JsonFileSaver {
    fn save(&mut self, world: &World) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(world).context("serializing world")?;
        let tx = self
            .tx
            .as_ref()
            .context("autosave writer already finished")?;
        tx.send(bytes)
            .map_err(|_| anyhow::anyhow!("autosave writer thread has exited"))
    }

    fn finish(&mut self) {
        // Dropping the sender ends the writer loop once the backlog is written.
        self.tx.take();
        if let Some(handle) = self.writer.take() {
            if handle.join().is_err() {
                warn!("autosave writer thread panicked");
            }
        }
    }
}

impl Drop for JsonFileSaver {
    fn drop(&mut self) {
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::seed::starter_world;
    use tempfile::TempDir;

    #[test]
    fn writes_and_reloads_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("world.json");
        let mut saver = JsonFileSaver::new(&path).unwrap();
        let world = starter_world();
        saver.save(&world).unwrap();
        saver.finish();

        let back = load_snapshot(&path).unwrap();
        assert_eq!(back.users.len(), world.users.len());
        assert_eq!(back.mobs[&1].trades, world.mobs[&1].trades);
        assert!(!path.with_extension("json.tmp").exists());
        assert!(saver.save(&world).is_err());
    }
}
