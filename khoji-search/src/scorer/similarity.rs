//! Cosine similarity as an optional, model-free scoring primitive.
//!
//! Not part of the default retrieval flow. Callers holding embeddings for
//! the query and documents can use [`rank_by_similarity`] instead of the
//! language-model scorer.

use super::Rankable;
use crate::types::clamp_relevance;

/// Cosine similarity of every row in `docs` against `query`.
///
/// `dot(doc, query) / (‖doc‖ · ‖query‖)` per row. A zero-norm vector on
/// either side yields `0.0` for that row instead of NaN. Rows of a
/// different length are compared over their common prefix.
pub fn cosine_similarity(query: &[f64], docs: &[Vec<f64>]) -> Vec<f64> {
    let query_norm = norm(query);
    docs.iter()
        .map(|doc| {
            let denom = norm(doc) * query_norm;
            if denom == 0.0 {
                return 0.0;
            }
            let dot: f64 = doc.iter().zip(query).map(|(a, b)| a * b).sum();
            dot / denom
        })
        .collect()
}

fn norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Score documents by embedding similarity and sort them, most similar
/// first. Negative similarities clamp to zero relevance.
pub fn rank_by_similarity<D: Rankable>(query: &[f64], docs: Vec<(D, Vec<f64>)>) -> Vec<D> {
    let (mut documents, vectors): (Vec<D>, Vec<Vec<f64>>) = docs.into_iter().unzip();
    let scores = cosine_similarity(query, &vectors);
    for (doc, score) in documents.iter_mut().zip(scores) {
        doc.set_relevance(clamp_relevance(score));
    }
    documents.sort_by(|a, b| b.relevance().total_cmp(&a.relevance()));
    documents
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CandidateDocument;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn identical_direction_scores_one() {
        let scores = cosine_similarity(&[1.0, 2.0, 3.0], &[vec![2.0, 4.0, 6.0]]);
        assert!(approx(scores[0], 1.0));
    }

    #[test]
    fn orthogonal_scores_zero_and_opposite_scores_minus_one() {
        let scores = cosine_similarity(&[1.0, 0.0], &[vec![0.0, 1.0], vec![-3.0, 0.0]]);
        assert!(approx(scores[0], 0.0));
        assert!(approx(scores[1], -1.0));
    }

    #[test]
    fn zero_vectors_score_zero() {
        let scores = cosine_similarity(&[0.0, 0.0], &[vec![1.0, 1.0]]);
        assert!(approx(scores[0], 0.0));
        let scores = cosine_similarity(&[1.0, 1.0], &[vec![0.0, 0.0]]);
        assert!(approx(scores[0], 0.0));
    }

    #[test]
    fn one_score_per_row() {
        let docs = vec![vec![1.0, 0.0], vec![0.5, 0.5], vec![0.0, 1.0]];
        let scores = cosine_similarity(&[1.0, 0.0], &docs);
        assert_eq!(scores.len(), 3);
        assert!(scores[0] > scores[1] && scores[1] > scores[2]);
    }

    #[test]
    fn rank_by_similarity_orders_and_clamps() {
        let docs = vec![
            (CandidateDocument::new("far", "https://far.com", "", 0.0), vec![-1.0, 0.0]),
            (CandidateDocument::new("near", "https://near.com", "", 0.0), vec![1.0, 0.1]),
            (CandidateDocument::new("mid", "https://mid.com", "", 0.0), vec![1.0, 1.0]),
        ];
        let ranked = rank_by_similarity(&[1.0, 0.0], docs);
        let titles: Vec<&str> = ranked.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, ["near", "mid", "far"]);
        assert!(approx(ranked[2].relevance(), 0.0));
        assert!(ranked.iter().all(|d| (0.0..=1.0).contains(&d.relevance())));
    }
}
