use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use image::RgbImage;
use tracing::{debug, info, instrument, warn};

use super::fingerprint::{Fingerprint, FingerprintAlgorithm, Fingerprinter};

/// File extensions considered when loading reference images.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp"];

/// Immutable set of placeholder fingerprints.
///
/// Construct once at start-up and pass by reference into every selection.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderCorpus {
    fingerprinter: Fingerprinter,
    fingerprints: Vec<Fingerprint>,
}

impl PlaceholderCorpus {
    /// A corpus that matches nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a corpus from precomputed fingerprints.
    pub fn from_fingerprints(
        algorithm: FingerprintAlgorithm,
        fingerprints: Vec<Fingerprint>,
    ) -> Self {
        Self {
            fingerprinter: Fingerprinter::new(algorithm),
            fingerprints,
        }
    }

    /// Build a corpus by fingerprinting already decoded reference images.
    pub fn from_images<'a, I>(algorithm: FingerprintAlgorithm, images: I) -> Self
    where
        I: IntoIterator<Item = &'a RgbImage>,
    {
        let fingerprinter = Fingerprinter::new(algorithm);
        let fingerprints = images
            .into_iter()
            .map(|image| fingerprinter.fingerprint(image))
            .collect();
        Self {
            fingerprinter,
            fingerprints,
        }
    }

    /// Load every decodable image in `dir` with the default algorithm.
    pub fn load(dir: impl AsRef<Path>) -> Self {
        Self::load_with(dir, FingerprintAlgorithm::default())
    }

    /// Load every decodable image in `dir`.
    ///
    /// A missing or unreadable directory yields an empty corpus. Files without
    /// an image extension are ignored; files that fail to decode are skipped
    /// with a warning.
    #[instrument(level = "info", skip_all, fields(dir = %dir.as_ref().display(), ?algorithm))]
    pub fn load_with(dir: impl AsRef<Path>, algorithm: FingerprintAlgorithm) -> Self {
        let dir = dir.as_ref();
        let fingerprinter = Fingerprinter::new(algorithm);

        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Placeholder directory not found");
                return Self::from_fingerprints(algorithm, Vec::new());
            }
            Err(e) => {
                warn!(error = %e, "Failed to read placeholder directory");
                return Self::from_fingerprints(algorithm, Vec::new());
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && has_image_extension(path))
            .collect();
        paths.sort();

        let mut fingerprints = Vec::with_capacity(paths.len());
        for path in &paths {
            match image::open(path) {
                Ok(decoded) => {
                    let fingerprint = fingerprinter.fingerprint(&decoded.to_rgb8());
                    debug!(file = %path.display(), %fingerprint, "Loaded placeholder");
                    fingerprints.push(fingerprint);
                }
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "Failed to load placeholder image");
                }
            }
        }

        info!(count = fingerprints.len(), "Placeholder corpus loaded");
        Self {
            fingerprinter,
            fingerprints,
        }
    }

    pub fn algorithm(&self) -> FingerprintAlgorithm {
        self.fingerprinter.algorithm()
    }

    pub fn fingerprints(&self) -> &[Fingerprint] {
        &self.fingerprints
    }

    pub fn len(&self) -> usize {
        self.fingerprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fingerprints.is_empty()
    }

    /// Hasher configured with this corpus's algorithm.
    pub fn fingerprinter(&self) -> Fingerprinter {
        self.fingerprinter
    }

    /// Fingerprint `image` with this corpus's algorithm.
    pub fn fingerprint(&self, image: &RgbImage) -> Fingerprint {
        self.fingerprinter.fingerprint(image)
    }

    /// Distance to the first corpus entry within `threshold`, if any.
    pub fn find_match(&self, image: &RgbImage, threshold: u32) -> Option<u32> {
        if self.fingerprints.is_empty() {
            return None;
        }
        self.match_fingerprint(self.fingerprint(image), threshold)
    }

    /// Like [`find_match`](Self::find_match), for a fingerprint computed with
    /// [`fingerprinter`](Self::fingerprinter).
    pub fn match_fingerprint(&self, fingerprint: Fingerprint, threshold: u32) -> Option<u32> {
        self.fingerprints
            .iter()
            .map(|known| fingerprint.hamming_distance(known))
            .find(|&distance| distance <= threshold)
    }
}

/// Load the placeholder corpus from `dir` using the default fingerprint algorithm.
pub fn load_placeholders(dir: impl AsRef<Path>) -> PlaceholderCorpus {
    PlaceholderCorpus::load(dir)
}

/// True if `image` is within `hamming_threshold` bits of any corpus entry.
pub fn is_placeholder(
    image: &RgbImage,
    corpus: &PlaceholderCorpus,
    hamming_threshold: u32,
) -> bool {
    corpus.find_match(image, hamming_threshold).is_some()
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
