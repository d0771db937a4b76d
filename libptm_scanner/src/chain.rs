use std::path::{Path, PathBuf};

use polars::prelude::*;

use super::constants::{NTUPLE_PREFIX, NTUPLE_SUFFIX};
use super::error::ChainError;

/// ChainAssembler discovers the ntuple files for one data stream and builds a
/// Chain out of them.
///
/// Simulation jobs scatter their output over many files, one directory tree
/// per job, with one subdirectory per readback stream (e.g. `readPTM/ntPTM`).
/// The assembler walks the job directory recursively and collects every file
/// named in the `nts.*.parquet` convention whose parent directory matches the
/// ntuple selector.
#[derive(Debug, Default)]
pub struct ChainAssembler {
    pub job_dir_path: Option<PathBuf>,
    pub ntuple_path: Option<PathBuf>,
}

impl ChainAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    fn is_ntuple_file(name: &str) -> bool {
        name.starts_with(NTUPLE_PREFIX) && name.ends_with(NTUPLE_SUFFIX)
    }

    fn collect_files(
        dir: &Path,
        selector: &Path,
        found: &mut Vec<PathBuf>,
    ) -> Result<(), ChainError> {
        for item in dir.read_dir()? {
            let item_path = item?.path();
            if item_path.is_dir() {
                Self::collect_files(&item_path, selector, found)?;
            } else if let Some(name) = item_path.file_name().and_then(|n| n.to_str()) {
                if Self::is_ntuple_file(name) && dir.ends_with(selector) {
                    found.push(item_path);
                }
            }
        }
        Ok(())
    }

    /// Walk the job directory and assemble the chain.
    ///
    /// Both `job_dir_path` and `ntuple_path` must be set first; failing to do
    /// so is an immediate error, not a silently empty chain.
    pub fn create_chain(&self) -> Result<Chain, ChainError> {
        let job_dir = self.job_dir_path.as_deref().ok_or(ChainError::NoJobDir)?;
        let selector = self.ntuple_path.as_deref().ok_or(ChainError::NoNtuplePath)?;

        let mut file_paths: Vec<PathBuf> = Vec::new();
        Self::collect_files(job_dir, selector, &mut file_paths)?;
        if file_paths.is_empty() {
            return Err(ChainError::NoMatchingFiles(job_dir.join(selector)));
        }
        // Sort standard; file names only differ in the sequencer field
        file_paths.sort();

        let mut total_size_bytes = 0;
        for path in file_paths.iter() {
            total_size_bytes += path.metadata()?.len();
        }

        Ok(Chain {
            file_paths,
            total_size_bytes,
        })
    }
}

/// A Chain is one logical data stream concatenated from many ntuple files, in
/// the manner of a ROOT TChain. Reading is lazy; nothing is scanned until one
/// of the collect methods runs.
#[derive(Debug, Clone)]
pub struct Chain {
    file_paths: Vec<PathBuf>,
    total_size_bytes: u64,
}

impl Chain {
    pub fn file_paths(&self) -> &[PathBuf] {
        &self.file_paths
    }

    pub fn len(&self) -> usize {
        self.file_paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.file_paths.is_empty()
    }

    pub fn total_size_bytes(&self) -> u64 {
        self.total_size_bytes
    }

    /// The whole chain as one lazy frame.
    pub fn lazy_frame(&self) -> Result<LazyFrame, ChainError> {
        let frames = self
            .file_paths
            .iter()
            .map(|path| LazyFrame::scan_parquet(path, ScanArgsParquet::default()))
            .collect::<PolarsResult<Vec<LazyFrame>>>()?;
        Ok(concat(frames, UnionArgs::default())?)
    }

    /// Materialize the whole chain into a single data frame.
    pub fn collect(&self) -> Result<DataFrame, ChainError> {
        Ok(self.lazy_frame()?.collect()?)
    }

    /// Materialize one data frame per file, in chain order.
    ///
    /// Needed where the file ordinal matters, e.g. to disambiguate repeated
    /// event ids across independently-simulated files.
    pub fn collect_each(&self) -> Result<Vec<DataFrame>, ChainError> {
        let mut frames = Vec::with_capacity(self.file_paths.len());
        for path in self.file_paths.iter() {
            let lf = LazyFrame::scan_parquet(path, ScanArgsParquet::default())?;
            frames.push(lf.collect()?);
        }
        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{create_dir_all, File};

    fn touch(path: &Path) {
        File::create(path).unwrap();
    }

    #[test]
    fn test_file_name_convention() {
        assert!(ChainAssembler::is_ntuple_file("nts.owner.ptm_scan.001.parquet"));
        assert!(!ChainAssembler::is_ntuple_file("nts.owner.ptm_scan.001.root"));
        assert!(!ChainAssembler::is_ntuple_file("log.owner.ptm_scan.001.parquet"));
        assert!(!ChainAssembler::is_ntuple_file("readme.txt"));
    }

    #[test]
    fn test_unset_paths_are_errors() {
        let assembler = ChainAssembler::new();
        assert!(matches!(
            assembler.create_chain(),
            Err(ChainError::NoJobDir)
        ));

        let mut assembler = ChainAssembler::new();
        assembler.job_dir_path = Some(PathBuf::from("/tmp"));
        assert!(matches!(
            assembler.create_chain(),
            Err(ChainError::NoNtuplePath)
        ));
    }

    #[test]
    fn test_recursive_discovery() {
        let dir = tempfile::tempdir().unwrap();
        let stream_a = dir.path().join("00").join("readPTM").join("ntPTM");
        let stream_b = dir.path().join("01").join("readPTM").join("ntPTM");
        let other_stream = dir.path().join("00").join("readvdNr").join("ntvd");
        create_dir_all(&stream_a).unwrap();
        create_dir_all(&stream_b).unwrap();
        create_dir_all(&other_stream).unwrap();
        touch(&stream_a.join("nts.owner.scan.001.parquet"));
        touch(&stream_a.join("nts.owner.scan.002.parquet"));
        touch(&stream_a.join("notes.txt"));
        touch(&stream_b.join("nts.owner.scan.003.parquet"));
        touch(&other_stream.join("nts.owner.scan.001.parquet"));

        let mut assembler = ChainAssembler::new();
        assembler.job_dir_path = Some(dir.path().to_path_buf());
        assembler.ntuple_path = Some(PathBuf::from("readPTM/ntPTM"));
        let chain = assembler.create_chain().unwrap();
        assert_eq!(chain.len(), 3);
        for path in chain.file_paths() {
            assert!(path.to_string_lossy().contains("readPTM"));
        }
    }

    #[test]
    fn test_no_matching_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut assembler = ChainAssembler::new();
        assembler.job_dir_path = Some(dir.path().to_path_buf());
        assembler.ntuple_path = Some(PathBuf::from("readPTM/ntPTM"));
        assert!(matches!(
            assembler.create_chain(),
            Err(ChainError::NoMatchingFiles(_))
        ));
    }
}
