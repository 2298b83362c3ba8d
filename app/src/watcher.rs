use crate::program::{ShaderSources, StageSource};
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, SystemTime};

#[derive(Clone, Debug)]
pub struct ShaderPaths {
    pub compute: PathBuf,
    pub vertex: PathBuf,
    pub fragment: PathBuf,
}

impl ShaderPaths {
    fn stamps(&self) -> [Option<SystemTime>; 3] {
        [&self.compute, &self.vertex, &self.fragment].map(|path| modified_at(path))
    }

    fn load(&self) -> ShaderSources {
        ShaderSources {
            compute: StageSource::load(&self.compute),
            vertex: StageSource::load(&self.vertex),
            fragment: StageSource::load(&self.fragment),
        }
    }
}

/// Background thread that (re)loads shader sources whenever any of the files
/// changes; the first load happens right after spawning.
#[derive(Debug)]
pub struct ShaderWatcher {
    rx: mpsc::Receiver<ShaderSources>,
}

impl ShaderWatcher {
    pub fn spawn(paths: ShaderPaths, interval: Duration) -> Self {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let mut previous_stamps = None;

            loop {
                let stamps = paths.stamps();

                if previous_stamps.map_or(true, |p| p != stamps) {
                    info!("Loading shaders");

                    if tx.send(paths.load()).is_err() {
                        debug!("Shader watcher stopped");
                        return;
                    }

                    previous_stamps = Some(stamps);
                } else {
                    thread::sleep(interval);
                }
            }
        });

        Self { rx }
    }

    /// Returns the newest sources loaded since the last call, if any.
    pub fn poll(&self) -> Option<ShaderSources> {
        self.rx.try_iter().last()
    }
}

fn modified_at(path: &Path) -> Option<SystemTime> {
    path.metadata().and_then(|m| m.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs, process};

    struct Fixture {
        dir: PathBuf,
        paths: ShaderPaths,
    }

    impl Fixture {
        fn new(name: &str) -> Self {
            let dir = env::temp_dir()
                .join(format!("compute-raymarch-{name}-{}", process::id()));

            fs::create_dir_all(&dir).unwrap();

            let paths = ShaderPaths {
                compute: dir.join("raymarch.wgsl"),
                vertex: dir.join("quad_vs.wgsl"),
                fragment: dir.join("quad_fs.wgsl"),
            };

            Self { dir, paths }
        }
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            _ = fs::remove_dir_all(&self.dir);
        }
    }

    #[test]
    fn loads_on_spawn() {
        let fixture = Fixture::new("spawn");

        fs::write(&fixture.paths.compute, "compute").unwrap();
        fs::write(&fixture.paths.vertex, "vertex").unwrap();
        fs::write(&fixture.paths.fragment, "fragment").unwrap();

        let watcher = ShaderWatcher::spawn(
            fixture.paths.clone(),
            Duration::from_millis(5),
        );

        let sources = watcher
            .rx
            .recv_timeout(Duration::from_secs(5))
            .unwrap();

        assert_eq!(sources.compute.text, "compute");
        assert_eq!(sources.vertex.text, "vertex");
        assert_eq!(sources.fragment.text, "fragment");
    }

    #[test]
    fn missing_files_load_as_empty() {
        let fixture = Fixture::new("missing");

        fs::write(&fixture.paths.vertex, "vertex").unwrap();

        let watcher = ShaderWatcher::spawn(
            fixture.paths.clone(),
            Duration::from_millis(5),
        );

        let sources = watcher
            .rx
            .recv_timeout(Duration::from_secs(5))
            .unwrap();

        assert!(sources.compute.text.is_empty());
        assert_eq!(sources.vertex.text, "vertex");
        assert!(sources.fragment.text.is_empty());
    }

    #[test]
    fn reloads_after_change() {
        let fixture = Fixture::new("reload");

        let watcher = ShaderWatcher::spawn(
            fixture.paths.clone(),
            Duration::from_millis(5),
        );

        watcher.rx.recv_timeout(Duration::from_secs(5)).unwrap();

        fs::write(&fixture.paths.compute, "compute").unwrap();

        let sources = watcher
            .rx
            .recv_timeout(Duration::from_secs(5))
            .unwrap();

        assert_eq!(sources.compute.text, "compute");
    }
}
