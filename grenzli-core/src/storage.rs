//! Staging and output directories for downloaded boundaries.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;

use crate::service::FetchError;

const STAGING_EXT: &str = "gz";
const OUTPUT_EXT: &str = "geojson";
const PARTIAL_SUFFIX: &str = ".part";

#[derive(Debug, Clone)]
/// The two directories a batch writes into.
pub struct Storage {
    staging_dir: PathBuf,
    output_dir: PathBuf,
}

impl Storage {
    /// Bind to a staging and an output directory. Nothing is created.
    #[must_use]
    pub fn new(staging_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            staging_dir: staging_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    /// Directory holding compressed downloads.
    #[must_use]
    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Directory holding decompressed GeoJSON.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// `<staging>/<stem>.gz`
    #[must_use]
    pub fn staging_path(&self, stem: &str) -> PathBuf {
        self.staging_dir.join(format!("{stem}.{STAGING_EXT}"))
    }

    /// `<output>/<stem>.geojson`
    #[must_use]
    pub fn output_path(&self, stem: &str) -> PathBuf {
        self.output_dir.join(format!("{stem}.{OUTPUT_EXT}"))
    }

    /// `<staging>/<stem>.geojson.part`, where decompression streams to.
    #[must_use]
    pub fn partial_path(&self, stem: &str) -> PathBuf {
        self.staging_dir
            .join(format!("{stem}.{OUTPUT_EXT}{PARTIAL_SUFFIX}"))
    }

    // Copy target used only when staging and output are on different filesystems.
    fn landing_path(&self, stem: &str) -> PathBuf {
        self.output_dir
            .join(format!("{stem}.{OUTPUT_EXT}{PARTIAL_SUFFIX}"))
    }

    /// Fail unless both directories exist.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::MissingDirectory`] naming the first absent one.
    pub fn check_dirs(&self) -> Result<(), FetchError> {
        for dir in [&self.staging_dir, &self.output_dir] {
            if !dir.is_dir() {
                return Err(FetchError::MissingDirectory(dir.clone()));
            }
        }
        Ok(())
    }

    /// `mkdir -p` both directories.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Io`] when a directory cannot be created.
    pub fn create_dirs(&self) -> Result<(), FetchError> {
        for dir in [&self.staging_dir, &self.output_dir] {
            if !dir.is_dir() {
                log::info!("creating directory {}", dir.display());
                fs::create_dir_all(dir).map_err(|source| FetchError::Io {
                    path: dir.clone(),
                    source,
                })?;
            }
        }
        Ok(())
    }

    /// Write the compressed payload verbatim to the staging file.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Io`] when the file cannot be written.
    pub fn write_staging(&self, stem: &str, payload: &[u8]) -> Result<PathBuf, FetchError> {
        let path = self.staging_path(stem);
        fs::write(&path, payload).map_err(|source| FetchError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    /// Decompress the single gzip member in `staging` into the output file.
    ///
    /// The bytes are streamed into [`Storage::partial_path`] inside the
    /// staging directory and moved into the output directory once the stream
    /// ended cleanly, so the output directory never sees a truncated file.
    /// Returns the output path and decompressed size.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Decompress`] for corrupt input and
    /// [`FetchError::Io`] for filesystem failures.
    pub fn decompress(&self, staging: &Path, stem: &str) -> Result<(PathBuf, u64), FetchError> {
        let partial = self.partial_path(stem);
        let output = self.output_path(stem);

        let bytes = inflate(staging, &partial).inspect_err(|_| discard(&partial))?;
        let placed = place(&partial, &output, &self.landing_path(stem));
        discard(&partial);
        placed.map(|()| (output, bytes))
    }

    /// Delete the staging file. A file that is already gone is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Io`] when removal fails for another reason.
    pub fn remove_staging(&self, staging: &Path) -> Result<(), FetchError> {
        match fs::remove_file(staging) {
            Ok(()) => Ok(()),
            Err(source) if source.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(FetchError::Io {
                path: staging.to_path_buf(),
                source,
            }),
        }
    }
}

/// Move `partial` onto `output`. When the two directories sit on different
/// filesystems the file is copied next to `output` first and renamed from
/// there, which keeps the final step atomic.
fn place(partial: &Path, output: &Path, landing: &Path) -> Result<(), FetchError> {
    match fs::rename(partial, output) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::CrossesDevices => {
            log::debug!(
                "{} and {} are on different filesystems, copying",
                partial.display(),
                output.display()
            );
            let moved = fs::copy(partial, landing)
                .and_then(|_| fs::rename(landing, output))
                .map_err(|source| FetchError::Io {
                    path: output.to_path_buf(),
                    source,
                });
            if moved.is_err() {
                discard(landing);
            }
            moved
        }
        Err(source) => Err(FetchError::Io {
            path: output.to_path_buf(),
            source,
        }),
    }
}

fn inflate(staging: &Path, target: &Path) -> Result<u64, FetchError> {
    let input = File::open(staging).map_err(|source| FetchError::Io {
        path: staging.to_path_buf(),
        source,
    })?;
    let mut decoder = GzDecoder::new(BufReader::new(input));

    let file = File::create(target).map_err(|source| FetchError::Io {
        path: target.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);

    let mut buf = [0_u8; 64 * 1024];
    let mut total: u64 = 0;
    loop {
        let read = decoder.read(&mut buf).map_err(|source| FetchError::Decompress {
            path: staging.to_path_buf(),
            source,
        })?;
        if read == 0 {
            break;
        }
        let chunk = buf.get(..read).unwrap_or_default();
        writer.write_all(chunk).map_err(|source| FetchError::Io {
            path: target.to_path_buf(),
            source,
        })?;
        total += read as u64;
    }

    writer.flush().map_err(|source| FetchError::Io {
        path: target.to_path_buf(),
        source,
    })?;
    Ok(total)
}

fn discard(path: &Path) {
    if let Err(err) = fs::remove_file(path)
        && err.kind() != ErrorKind::NotFound
    {
        log::warn!("could not remove {}: {err}", path.display());
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use flate2::Compression;
    use flate2::write::GzEncoder;
    use tempfile::tempdir;

    use super::*;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn storage_in(root: &Path) -> Storage {
        let storage = Storage::new(root.join("gz"), root.join("geojson"));
        storage.create_dirs().unwrap();
        storage
    }

    #[test]
    fn decompress_writes_exact_bytes() {
        let tmp = tempdir().unwrap();
        let storage = storage_in(tmp.path());
        let geojson = br#"{"type":"FeatureCollection","features":[]}"#;

        let staging = storage.write_staging("Wakanda", &gzip(geojson)).unwrap();
        let (output, bytes) = storage.decompress(&staging, "Wakanda").unwrap();

        assert_eq!(output, tmp.path().join("geojson").join("Wakanda.geojson"));
        assert_eq!(bytes, geojson.len() as u64);
        assert_eq!(fs::read(&output).unwrap(), geojson);
        assert!(
            !storage.partial_path("Wakanda").exists(),
            "partial file left behind"
        );
    }

    #[test]
    fn corrupt_payload_leaves_no_output() {
        let tmp = tempdir().unwrap();
        let storage = storage_in(tmp.path());

        let staging = storage.write_staging("Broken", b"definitely not gzip").unwrap();
        let err = storage.decompress(&staging, "Broken").unwrap_err();

        assert!(matches!(err, FetchError::Decompress { .. }), "got {err:?}");
        assert!(!storage.output_path("Broken").exists(), "output created");
        assert!(!storage.partial_path("Broken").exists(), "partial kept");
    }

    #[test]
    fn partial_file_lives_in_staging_dir() {
        let storage = Storage::new("gz", "geojson");
        assert_eq!(
            storage.partial_path("Wakanda"),
            Path::new("gz").join("Wakanda.geojson.part")
        );
    }

    #[test]
    fn truncated_stream_never_reaches_output_dir() {
        let tmp = tempdir().unwrap();
        let storage = storage_in(tmp.path());
        let payload: Vec<u8> = (0..200_000_u32).flat_map(u32::to_le_bytes).collect();
        let compressed = gzip(&payload);
        let truncated = compressed.get(..compressed.len() / 2).unwrap();

        let staging = storage.write_staging("Cut", truncated).unwrap();
        assert!(storage.decompress(&staging, "Cut").is_err());

        let leftovers: Vec<_> = fs::read_dir(storage.output_dir()).unwrap().collect();
        assert!(leftovers.is_empty(), "output dir not empty: {leftovers:?}");
        assert!(!storage.partial_path("Cut").exists(), "partial kept");
    }

    #[test]
    fn place_reports_missing_output_dir() {
        let tmp = tempdir().unwrap();
        let partial = tmp.path().join("a.part");
        fs::write(&partial, b"{}").unwrap();
        let output = tmp.path().join("missing").join("a.geojson");

        let err = place(&partial, &output, &tmp.path().join("missing").join("a.part")).unwrap_err();
        assert!(matches!(&err, FetchError::Io { path, .. } if *path == output), "got {err:?}");
    }

    #[test]
    fn rerun_overwrites_output() {
        let tmp = tempdir().unwrap();
        let storage = storage_in(tmp.path());

        let first = storage.write_staging("X", &gzip(b"old")).unwrap();
        storage.decompress(&first, "X").unwrap();
        let second = storage.write_staging("X", &gzip(b"new")).unwrap();
        let (output, _) = storage.decompress(&second, "X").unwrap();

        assert_eq!(fs::read(output).unwrap(), b"new");
    }

    #[test]
    fn remove_staging_tolerates_missing_file() {
        let tmp = tempdir().unwrap();
        let storage = storage_in(tmp.path());

        let staging = storage.write_staging("Gone", b"x").unwrap();
        storage.remove_staging(&staging).unwrap();
        assert!(!staging.exists(), "staging still present");
        storage.remove_staging(&staging).unwrap();
    }

    #[test]
    fn check_dirs_reports_missing_directory() {
        let tmp = tempdir().unwrap();
        let storage = Storage::new(tmp.path().join("gz"), tmp.path().join("geojson"));

        let err = storage.check_dirs().unwrap_err();
        assert!(
            matches!(&err, FetchError::MissingDirectory(dir) if dir.ends_with("gz")),
            "got {err:?}"
        );

        storage.create_dirs().unwrap();
        storage.check_dirs().unwrap();
    }
}
