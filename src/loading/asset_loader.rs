use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, channel};

use anyhow::Context;

use crate::loading::progress::LoadProgress;

pub type DecodeFn<T> = fn(&Path) -> anyhow::Result<T>;

#[derive(Debug)]
pub enum LoadEvent<T> {
    Loaded { key: String, asset: T },
    Failed { key: String, error: anyhow::Error },
    Progress { loaded: u64, total: u64 },
    AllLoaded,
}

struct Completion<T> {
    key: String,
    bytes: u64,
    result: anyhow::Result<T>,
}

// Decodes files on a tokio blocking pool and hands the results back to the caller's thread.
pub struct AssetLoader<T> {
    runtime: tokio::runtime::Runtime,
    decode: DecodeFn<T>,
    sender: mpsc::Sender<Completion<T>>,
    receiver: mpsc::Receiver<Completion<T>>,
    progress: LoadProgress,
}

impl<T: Send + 'static> AssetLoader<T> {
    pub fn new(decode: DecodeFn<T>) -> anyhow::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("asset-loader")
            .build()
            .context("Failed to create asset loader runtime")?;

        let (sender, receiver) = channel();

        Ok(Self {
            runtime,
            decode,
            sender,
            receiver,
            progress: LoadProgress::new(),
        })
    }

    pub fn progress(&self) -> &LoadProgress {
        &self.progress
    }

    pub fn request(&mut self, key: impl Into<String>, path: impl Into<PathBuf>) {
        let key = key.into();
        let path = path.into();

        let bytes = match std::fs::metadata(&path) {
            Ok(metadata) => metadata.len(),
            Err(e) => {
                log::debug!("Unknown size for {}: {}", path.display(), e);
                0
            }
        };

        self.progress.add_request(bytes);
        log::debug!("Requested {} from {} ({} bytes)", key, path.display(), bytes);

        let sender = self.sender.clone();
        let decode = self.decode;

        self.runtime.spawn_blocking(move || {
            let result = decode(path.as_path())
                .with_context(|| format!("Failed to load {}", path.display()));

            if sender.send(Completion { key, bytes, result }).is_err() {
                log::debug!("Asset loader dropped before {} finished", path.display());
            }
        });
    }

    /// Drains finished loads without blocking.
    pub fn poll(&mut self) -> Vec<LoadEvent<T>> {
        let mut events = Vec::new();

        while let Ok(completion) = self.receiver.try_recv() {
            let Completion { key, bytes, result } = completion;

            match result {
                Ok(asset) => {
                    log::info!("Loaded {}", key);
                    events.push(LoadEvent::Loaded { key, asset });
                }
                Err(error) => events.push(LoadEvent::Failed { key, error }),
            }

            let completed_all = self.progress.settle(bytes);

            events.push(LoadEvent::Progress {
                loaded: self.progress.loaded_bytes(),
                total: self.progress.total_bytes(),
            });

            if completed_all {
                log::info!("All {} assets settled", self.progress.requested());
                events.push(LoadEvent::AllLoaded);
            }
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;

    fn read_bytes(path: &Path) -> anyhow::Result<Vec<u8>> {
        Ok(std::fs::read(path)?)
    }

    fn temp_folder(name: &str) -> PathBuf {
        let folder = std::env::temp_dir().join(format!(
            "island-diorama-{}-{}",
            std::process::id(),
            name
        ));
        std::fs::create_dir_all(&folder).unwrap();
        folder
    }

    fn poll_until_all_loaded<T: Send + 'static>(loader: &mut AssetLoader<T>) -> Vec<LoadEvent<T>> {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut events = Vec::new();

        while Instant::now() < deadline {
            events.extend(loader.poll());
            if events.iter().any(|event| matches!(event, LoadEvent::AllLoaded)) {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }

        // Anything arriving after AllLoaded would be a bug
        std::thread::sleep(Duration::from_millis(20));
        events.extend(loader.poll());
        events
    }

    #[test]
    fn reports_byte_progress_and_all_loaded_once() {
        let folder = temp_folder("progress");
        let mut loader = AssetLoader::new(read_bytes).unwrap();

        for (name, size) in [("a", 10), ("b", 20), ("c", 30)] {
            let path = folder.join(format!("{}.bin", name));
            std::fs::write(&path, vec![0u8; size]).unwrap();
            loader.request(name, path);
        }

        let events = poll_until_all_loaded(&mut loader);

        let progress: Vec<(u64, u64)> = events
            .iter()
            .filter_map(|event| match event {
                LoadEvent::Progress { loaded, total } => Some((*loaded, *total)),
                _ => None,
            })
            .collect();

        assert_eq!(progress.len(), 3);
        assert!([10, 20, 30].contains(&progress[0].0));
        assert!(progress.windows(2).all(|pair| pair[0].0 <= pair[1].0));
        assert!(progress.iter().all(|(_, total)| *total == 60));
        assert_eq!(progress[2], (60, 60));

        let all_loaded = events
            .iter()
            .filter(|event| matches!(event, LoadEvent::AllLoaded))
            .count();
        assert_eq!(all_loaded, 1);
        assert!(matches!(events.last(), Some(LoadEvent::AllLoaded)));

        let loaded: usize = events
            .iter()
            .filter_map(|event| match event {
                LoadEvent::Loaded { asset, .. } => Some(asset.len()),
                _ => None,
            })
            .sum();
        assert_eq!(loaded, 60);
        assert_eq!(loader.progress().fraction(), 1.0);

        std::fs::remove_dir_all(&folder).ok();
    }

    #[test]
    fn failed_load_still_settles() {
        let folder = temp_folder("failure");
        let mut loader = AssetLoader::new(read_bytes).unwrap();

        let present = folder.join("present.bin");
        std::fs::write(&present, vec![1u8; 16]).unwrap();
        loader.request("present", present);
        loader.request("missing", folder.join("missing.bin"));

        let events = poll_until_all_loaded(&mut loader);

        assert!(events.iter().any(
            |event| matches!(event, LoadEvent::Failed { key, .. } if key.as_str() == "missing")
        ));
        assert!(events.iter().any(
            |event| matches!(event, LoadEvent::Loaded { key, .. } if key.as_str() == "present")
        ));
        assert!(matches!(events.last(), Some(LoadEvent::AllLoaded)));
        assert_eq!(loader.progress().fraction(), 1.0);

        std::fs::remove_dir_all(&folder).ok();
    }

    #[test]
    fn poll_without_requests_is_empty() {
        let mut loader = AssetLoader::new(read_bytes).unwrap();
        assert!(loader.poll().is_empty());
    }
}
