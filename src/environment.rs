//! Process environment expected by the engine's native libraries.
//!
//! Everything here mutates the process environment and must run before any
//! worker threads exist, i.e. before the async runtime is built.

use anyhow::{Context, Result};
use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{info, warn};

const MECAB_DICDIR_CANDIDATES: [&str; 2] =
    ["/var/lib/mecab/dic/ipadic-utf8", "/var/lib/mecab/dic/ipadic"];
const MECABRC_CANDIDATES: [&str; 2] = ["/etc/mecabrc", "/usr/local/etc/mecabrc"];

pub fn cpu_count() -> usize {
    std::thread::available_parallelism()
        .map(|count| count.get())
        .unwrap_or(1)
}

/// Point OpenMP and MKL at every available core unless the operator already
/// chose a thread count. Returns the detected core count.
pub fn configure_thread_env() -> usize {
    let cores = cpu_count();
    for var in ["OMP_NUM_THREADS", "MKL_NUM_THREADS"] {
        if env::var_os(var).is_none() {
            env::set_var(var, cores.to_string());
        }
    }
    cores
}

/// What [`setup_mecab_environment`] found and exported.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MecabEnvironment {
    pub binary: Option<PathBuf>,
    pub dicdir: Option<PathBuf>,
    /// `None` when MeCab is missing; `/dev/null` when no rc file exists.
    pub mecabrc: Option<PathBuf>,
}

pub fn find_on_path(program: &str) -> Option<PathBuf> {
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

fn first_existing(candidates: &[&str], accept: fn(&Path) -> bool) -> Option<PathBuf> {
    candidates
        .iter()
        .map(PathBuf::from)
        .find(|path| accept(path))
}

/// Resolve the IPADIC dictionary and rc file for Japanese text processing.
pub fn resolve_mecab_paths(
    dicdir_candidates: &[&str],
    mecabrc_candidates: &[&str],
) -> (Option<PathBuf>, PathBuf) {
    let dicdir = first_existing(dicdir_candidates, Path::is_dir);
    let mecabrc = first_existing(mecabrc_candidates, Path::is_file)
        .unwrap_or_else(|| PathBuf::from("/dev/null"));
    (dicdir, mecabrc)
}

/// Export `MECAB_DICDIR` and `MECABRC` when a MeCab installation exists.
pub fn setup_mecab_environment() -> MecabEnvironment {
    let Some(binary) = find_on_path("mecab") else {
        warn!("MeCab is not installed, Japanese voices may fail");
        return MecabEnvironment::default();
    };

    let (dicdir, mecabrc) = resolve_mecab_paths(&MECAB_DICDIR_CANDIDATES, &MECABRC_CANDIDATES);
    if let Some(dir) = &dicdir {
        env::set_var("MECAB_DICDIR", dir);
        info!("MeCab dictionary: {}", dir.display());
    }
    env::set_var("MECABRC", &mecabrc);
    if mecabrc == Path::new("/dev/null") {
        info!("MeCab rc file disabled");
    } else {
        info!("MeCab rc file: {}", mecabrc.display());
    }

    MecabEnvironment {
        binary: Some(binary),
        dicdir,
        mecabrc: Some(mecabrc),
    }
}

/// Parse a probe word with the `mecab` binary and return its analysis.
pub fn check_mecab(sample: &str) -> Result<String> {
    let mut child = Command::new("mecab")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .context("Failed to start mecab")?;

    if let Some(mut stdin) = child.stdin.take() {
        writeln!(stdin, "{}", sample).context("Failed to write to mecab")?;
    }
    let output = child.wait_with_output().context("Failed to wait for mecab")?;
    if !output.status.success() {
        anyhow::bail!(
            "mecab exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
