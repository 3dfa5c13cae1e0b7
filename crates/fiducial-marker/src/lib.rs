//! Marker candidate extraction, rectification, cell sampling, and codeword
//! decoding. Pose estimation is one layer up, in `fiducial-pose`, which
//! consumes this crate's `DecodedCandidate` list.

pub mod codeword;
pub mod config;
pub mod extract;
pub mod rectify;
pub mod refine;
pub mod sample;

use fiducial_core::GrayImageView;

#[cfg(feature = "tracing")]
use tracing::instrument;

pub use codeword::CODEWORDS;
pub use config::{ExtractorConfig, RefineConfig};
pub use extract::{extract_candidates, Quad};
pub use rectify::rectify_marker;
pub use refine::refine_quad;
pub use sample::{sample_cells, BitMatrix};

/// A fully decoded marker candidate: refined CCW corners plus its payload
/// code. Pose fields are added one layer up, by `fiducial-pose`.
#[derive(Clone, Copy, Debug)]
pub struct DecodedCandidate {
    pub code: u32,
    pub corners: Quad,
}

/// Run candidate extraction, rectification, sampling, and decoding, then
/// sub-pixel refinement on every surviving candidate's corners.
///
/// Candidates that fail rectification, border validation, or codeword
/// decoding are silently dropped; this never errors.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(gray, extractor_cfg, refine_cfg), fields(width = gray.width, height = gray.height))
)]
pub fn detect_and_decode(
    gray: &GrayImageView<'_>,
    extractor_cfg: &ExtractorConfig,
    refine_cfg: &RefineConfig,
) -> Vec<DecodedCandidate> {
    let candidates = extract_candidates(gray, extractor_cfg);
    log::debug!("extracted {} raw candidates", candidates.len());

    let mut decoded = Vec::new();
    for quad in candidates {
        let Some(rectified) = rectify_marker(gray, &quad) else {
            continue;
        };
        let Some(bits) = sample_cells(&rectified.view()) else {
            continue;
        };
        let Some(code) = codeword::decode(&bits) else {
            continue;
        };
        let corners = refine_quad(gray, &quad, refine_cfg);
        decoded.push(DecodedCandidate { code, corners });
    }
    log::debug!("decoded {} markers", decoded.len());
    decoded
}
