//! Turning raw index matches into ranked, provenance-annotated hits.
//!
//! The retrieval service in the app crate embeds the query and asks the
//! [`VectorIndex`](crate::store::VectorIndex) for neighbors; everything
//! after that is pure and lives here:
//!
//! 1. Assign 1-based ranks in index order (nearest first).
//! 2. Round the cosine distance to a fixed number of decimals.
//! 3. Render `start–end` line ranges, with `?` when a chunk has no lines
//!    (full-unit chunks).
//! 4. Optionally render the hits as a plain-text context block for a
//!    prompt builder.

use crate::models::{ChunkMetadata, Hit, QueryMatch};

/// Placeholder for an absent line number.
pub const MISSING_LINE: &str = "?";

/// Default number of decimals kept in [`Hit::score`].
pub const DEFAULT_SCORE_PRECISION: u32 = 4;

/// Convert index matches (nearest first) into ranked hits.
pub fn format_hits(matches: Vec<QueryMatch>, score_precision: u32) -> Vec<Hit> {
    matches
        .into_iter()
        .enumerate()
        .map(|(i, m)| Hit {
            rank: i + 1,
            score: round_score(m.distance, score_precision),
            kind: m.metadata.kind,
            name: m.metadata.name.clone(),
            file_path: m.metadata.file_path.clone(),
            lines: line_range(&m.metadata),
            code: m.document.trim().to_string(),
        })
        .collect()
}

/// `start–end` (en dash), using [`MISSING_LINE`] for absent bounds.
pub fn line_range(metadata: &ChunkMetadata) -> String {
    let fmt = |line: Option<usize>| {
        line.map(|l| l.to_string())
            .unwrap_or_else(|| MISSING_LINE.to_string())
    };
    format!("{}–{}", fmt(metadata.start_line), fmt(metadata.end_line))
}

/// Round to `precision` decimal places.
pub fn round_score(score: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (score * factor).round() / factor
}

/// Render hits as the context block consumed by prompt construction.
///
/// Each hit becomes a comment header followed by its code:
///
/// ```text
/// // [1] findById | shop/src/OrderService.java:12–20
/// public Order findById(Long id) { ... }
///
/// ```
pub fn render_context(hits: &[Hit]) -> String {
    let mut context = String::new();
    for hit in hits {
        context.push_str(&format!(
            "// [{}] {} | {}\n{}\n\n",
            hit.rank,
            hit.name,
            hit.provenance(),
            hit.code
        ));
    }
    context
}
