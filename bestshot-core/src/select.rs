//! Best-candidate selection.
//!
//! Each candidate URL runs through fetch (normalized URL, then original),
//! placeholder screening, whitespace cropping and the sharpness threshold.
//! Survivors are compared by cropped pixel area, then sharpness; on an exact
//! tie the earlier candidate is kept.

use futures_util::stream::{self, StreamExt};
use image::RgbImage;
use tracing::{debug, info, instrument, warn};

use crate::config::SelectionConfig;
use crate::error::{FetchError, Result};
use crate::fetch::{fetch_with_fallback, FetchedImage, ImageSource};
use crate::placeholder::{Fingerprint, Fingerprinter, PlaceholderCorpus};
use crate::quality::{crop_whitespace, sharpness};

/// Ranking key of a surviving candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityScore {
    /// Width times height of the cropped image.
    pub area: u64,
    /// Laplacian variance of the cropped image.
    pub sharpness: f64,
}

impl QualityScore {
    /// Strictly better: larger area, or equal area and higher sharpness.
    pub fn beats(&self, other: &Self) -> bool {
        self.area > other.area || (self.area == other.area && self.sharpness > other.sharpness)
    }
}

/// Why a candidate was not considered for selection.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    /// Neither the normalized nor the original URL produced an image.
    FetchFailed(FetchError),
    /// Matched a known placeholder within the Hamming threshold.
    Placeholder { distance: u32 },
    /// Sharpness below the Laplacian threshold.
    TooBlurry { sharpness: f64 },
    /// The scoring task did not complete.
    AnalysisFailed(String),
}

/// A candidate that passed every check.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    /// Whitespace-cropped image.
    pub image: RgbImage,
    /// URL the image was actually fetched from.
    pub url: String,
    pub score: QualityScore,
}

/// The winning image and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedImage {
    /// Whitespace-cropped image.
    pub image: RgbImage,
    /// URL the image was actually fetched from (normalized or original).
    pub url: String,
}

/// Outcome of a selection call.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionResult {
    Selected(SelectedImage),
    /// Every candidate was rejected, or there were none.
    NoAcceptableCandidate,
}

impl SelectionResult {
    pub fn is_selected(&self) -> bool {
        matches!(self, Self::Selected(_))
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Selected(selected) => Some(selected.url.as_str()),
            Self::NoAcceptableCandidate => None,
        }
    }

    pub fn image(&self) -> Option<&RgbImage> {
        match self {
            Self::Selected(selected) => Some(&selected.image),
            Self::NoAcceptableCandidate => None,
        }
    }

    pub fn into_selected(self) -> Option<SelectedImage> {
        match self {
            Self::Selected(selected) => Some(selected),
            Self::NoAcceptableCandidate => None,
        }
    }
}

/// Selects the best image from candidate URLs.
///
/// Holds no per-call state: the same selector can serve any number of
/// concurrent calls, each with its own candidates and a shared corpus.
///
/// ## Example
///
/// ```no_run
/// use bestshot_core::{load_placeholders, HttpImageFetcher, ImageSelector};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let corpus = load_placeholders("assets/placeholders");
/// let selector = ImageSelector::new(HttpImageFetcher::new()?);
///
/// let candidates = ["https://cdn.example.com/item/123.jpg?w=300"];
/// match selector.select_best_image(&candidates, &corpus).await.into_selected() {
///     Some(best) => println!("{} ({}x{})", best.url, best.image.width(), best.image.height()),
///     None => println!("no usable image"),
/// }
/// # Ok(())
/// # }
/// ```
pub struct ImageSelector<S> {
    source: S,
    config: SelectionConfig,
}

impl<S: ImageSource> ImageSelector<S> {
    /// Create a selector with default thresholds.
    pub fn new(source: S) -> Self {
        Self {
            source,
            config: SelectionConfig::default(),
        }
    }

    /// Create a selector with custom thresholds, validating them first.
    pub fn with_config(source: S, config: SelectionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { source, config })
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch, screen, crop and score a single candidate.
    ///
    /// Fingerprinting, cropping and scoring run on Tokio's blocking pool, so
    /// this must be awaited inside a Tokio runtime.
    pub async fn evaluate_candidate(
        &self,
        url: &str,
        corpus: &PlaceholderCorpus,
    ) -> std::result::Result<ScoredCandidate, Rejection> {
        let FetchedImage {
            image,
            url: fetched_url,
        } = fetch_with_fallback(&self.source, url)
            .await
            .map_err(Rejection::FetchFailed)?;

        let fingerprinter = (!corpus.is_empty()).then(|| corpus.fingerprinter());
        let analysis = tokio::task::spawn_blocking(move || analyze(image, fingerprinter))
            .await
            .map_err(|e| Rejection::AnalysisFailed(format!("Task failed: {e}")))?;

        let placeholder = analysis
            .fingerprint
            .and_then(|fp| corpus.match_fingerprint(fp, self.config.hamming_threshold));
        if let Some(distance) = placeholder {
            return Err(Rejection::Placeholder { distance });
        }

        if analysis.sharpness < self.config.laplacian_threshold {
            return Err(Rejection::TooBlurry {
                sharpness: analysis.sharpness,
            });
        }

        let cropped = analysis.cropped;
        let area = u64::from(cropped.width()) * u64::from(cropped.height());
        Ok(ScoredCandidate {
            image: cropped,
            url: fetched_url,
            score: QualityScore {
                area,
                sharpness: analysis.sharpness,
            },
        })
    }

    /// Evaluate candidates one at a time, in order, and return the best.
    ///
    /// Never fails: fetch and decode errors reject individual candidates.
    #[instrument(level = "info", skip_all, fields(candidates = candidates.len()))]
    pub async fn select_best_image<U>(
        &self,
        candidates: &[U],
        corpus: &PlaceholderCorpus,
    ) -> SelectionResult
    where
        U: AsRef<str>,
    {
        let mut best = None;
        for url in candidates {
            let url = url.as_ref();
            let evaluated = self.evaluate_candidate(url, corpus).await;
            consider(&mut best, url, evaluated);
        }
        finish(best)
    }

    /// Like [`select_best_image`](Self::select_best_image), with up to
    /// `max_concurrent_fetches` candidates evaluated at once.
    ///
    /// Results are reduced in caller order, so ties resolve exactly as in the
    /// sequential call.
    #[instrument(level = "info", skip_all, fields(
        candidates = candidates.len(),
        max_in_flight = self.config.max_concurrent_fetches
    ))]
    pub async fn select_best_image_concurrent<U>(
        &self,
        candidates: &[U],
        corpus: &PlaceholderCorpus,
    ) -> SelectionResult
    where
        U: AsRef<str>,
    {
        let evaluations: Vec<_> = stream::iter(candidates.iter().map(|url| async move {
            let url = url.as_ref();
            (url, self.evaluate_candidate(url, corpus).await)
        }))
        .buffered(self.config.max_concurrent_fetches.max(1))
        .collect()
        .await;

        let mut best = None;
        for (url, evaluated) in evaluations {
            consider(&mut best, url, evaluated);
        }
        finish(best)
    }
}

/// CPU-bound measurements of one decoded image.
struct Analysis {
    /// Fingerprint of the uncropped image, when there is a corpus to match.
    fingerprint: Option<Fingerprint>,
    cropped: RgbImage,
    sharpness: f64,
}

fn analyze(image: RgbImage, fingerprinter: Option<Fingerprinter>) -> Analysis {
    let fingerprint = fingerprinter.map(|hasher| hasher.fingerprint(&image));
    let cropped = crop_whitespace(image);
    let score = sharpness(&cropped);
    Analysis {
        fingerprint,
        cropped,
        sharpness: score,
    }
}

/// Fold one evaluation into the running best.
fn consider(
    best: &mut Option<ScoredCandidate>,
    url: &str,
    evaluated: std::result::Result<ScoredCandidate, Rejection>,
) {
    match evaluated {
        Ok(candidate) => {
            let wins = best
                .as_ref()
                .map_or(true, |current| candidate.score.beats(&current.score));
            if wins {
                info!(
                    url = %candidate.url,
                    width = candidate.image.width(),
                    height = candidate.image.height(),
                    sharpness = candidate.score.sharpness,
                    "New best candidate"
                );
                *best = Some(candidate);
            } else {
                debug!(url = %candidate.url, score = ?candidate.score, "Candidate outranked");
            }
        }
        Err(Rejection::FetchFailed(e)) => info!(url, error = %e, "Candidate unavailable"),
        Err(Rejection::Placeholder { distance }) => {
            info!(url, distance, "Placeholder detected")
        }
        Err(Rejection::TooBlurry { sharpness }) => {
            info!(url, sharpness, "Low quality candidate")
        }
        Err(Rejection::AnalysisFailed(e)) => warn!(url, error = %e, "Candidate analysis failed"),
    }
}

fn finish(best: Option<ScoredCandidate>) -> SelectionResult {
    match best {
        Some(winner) => {
            info!(
                url = %winner.url,
                width = winner.image.width(),
                height = winner.image.height(),
                sharpness = winner.score.sharpness,
                "Selected best image"
            );
            SelectionResult::Selected(SelectedImage {
                image: winner.image,
                url: winner.url,
            })
        }
        None => {
            info!("No acceptable candidate");
            SelectionResult::NoAcceptableCandidate
        }
    }
}

/// Select the best image with explicit thresholds.
///
/// Fetch behaviour (timeouts, retries, size limit) is whatever `source` was
/// built with; only the thresholds come from the arguments.
pub async fn select_best_image<S, U>(
    source: &S,
    candidates: &[U],
    corpus: &PlaceholderCorpus,
    laplacian_threshold: f64,
    hamming_threshold: u32,
) -> Result<SelectionResult>
where
    S: ImageSource + ?Sized,
    U: AsRef<str>,
{
    let config = SelectionConfig {
        laplacian_threshold,
        hamming_threshold,
        ..Default::default()
    };
    let selector = ImageSelector::with_config(source, config)?;
    Ok(selector.select_best_image(candidates, corpus).await)
}
