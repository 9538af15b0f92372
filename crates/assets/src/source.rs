use crate::error::AssetError;
use crate::gltf_import::decode_gltf_file;
use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::{self, LocalBoxFuture};
use landing_scene::Mesh;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

/// Resolves a model name to raw geometry.
///
/// Fetches run on the host's single-threaded executor, so the returned
/// future does not need to be `Send`.
pub trait AssetSource {
    fn fetch(&self, name: &str) -> LocalBoxFuture<'static, Result<Mesh, AssetError>>;
}

/// Conventional location of a named model, relative to the asset root.
pub fn model_path(name: &str) -> PathBuf {
    Path::new("assets")
        .join("models")
        .join(name)
        .join("scene.gltf")
}

fn validate_name(name: &str) -> Result<(), AssetError> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\']);
    if bad {
        return Err(AssetError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Loads glTF models from disk.
///
/// Each fetch reads and decodes on its own worker thread; the returned
/// future only waits for the worker's answer, so the frame thread never
/// blocks on file IO or parsing.
#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(model_path(name))
    }
}

impl AssetSource for FileSource {
    fn fetch(&self, name: &str) -> LocalBoxFuture<'static, Result<Mesh, AssetError>> {
        if let Err(e) = validate_name(name) {
            return future::ready(Err(e)).boxed_local();
        }
        let path = self.path_for(name);
        let name = name.to_string();
        let (tx, rx) = oneshot::channel();
        let worker = std::thread::Builder::new()
            .name(format!("load-{name}"))
            .spawn(move || {
                let _ = tx.send(read_model(&path, name));
            });
        match worker {
            Ok(_) => async move { rx.await.unwrap_or(Err(AssetError::WorkerLost)) }.boxed_local(),
            Err(e) => future::ready(Err(AssetError::Io(e))).boxed_local(),
        }
    }
}

fn read_model(path: &Path, name: String) -> Result<Mesh, AssetError> {
    if !path.is_file() {
        return Err(AssetError::NotFound(name));
    }
    tracing::debug!(path = %path.display(), "reading model");
    decode_gltf_file(path)
}

/// In-memory models keyed by name. Unknown names fail with `NotFound`.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    models: HashMap<String, Mesh>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, mesh: Mesh) {
        self.models.insert(name.into(), mesh);
    }

    pub fn with(mut self, name: impl Into<String>, mesh: Mesh) -> Self {
        self.insert(name, mesh);
        self
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl AssetSource for MemorySource {
    fn fetch(&self, name: &str) -> LocalBoxFuture<'static, Result<Mesh, AssetError>> {
        let result = self
            .models
            .get(name)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(name.to_string()));
        future::ready(result).boxed_local()
    }
}

/// Fetches stay pending until the caller resolves them by name.
///
/// Drives headless runs and tests where the order loads finish in matters.
#[derive(Default)]
pub struct ManualSource {
    gates: RefCell<HashMap<String, VecDeque<oneshot::Sender<Result<Mesh, AssetError>>>>>,
}

impl ManualSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names with at least one fetch still waiting.
    pub fn waiting(&self) -> Vec<String> {
        let mut names: Vec<String> = self.gates.borrow().keys().cloned().collect();
        names.sort();
        names
    }

    /// Resolve the oldest waiting fetch of `name`. Returns false if none was
    /// waiting or its future is already gone.
    pub fn resolve(&self, name: &str, result: Result<Mesh, AssetError>) -> bool {
        let mut gates = self.gates.borrow_mut();
        let Some(queue) = gates.get_mut(name) else {
            return false;
        };
        let Some(tx) = queue.pop_front() else {
            return false;
        };
        if queue.is_empty() {
            gates.remove(name);
        }
        tx.send(result).is_ok()
    }
}

impl AssetSource for ManualSource {
    fn fetch(&self, name: &str) -> LocalBoxFuture<'static, Result<Mesh, AssetError>> {
        let (tx, rx) = oneshot::channel();
        self.gates
            .borrow_mut()
            .entry(name.to_string())
            .or_default()
            .push_back(tx);
        let name = name.to_string();
        async move { rx.await.unwrap_or(Err(AssetError::NotFound(name))) }.boxed_local()
    }
}
