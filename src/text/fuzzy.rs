use strsim::levenshtein;

/// Long titles are pre-screened on their first 50 characters before paying
/// for a full edit-distance computation.
const PREFIX_CHECK_LEN: usize = 50;
const PREFIX_MAX_EDITS: usize = 5;

/// Edit tolerance applied to the candidate title. Tolerance scales with
/// length so that long titles absorb punctuation and diacritic drift between
/// sources without conflating distinct short titles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tolerance {
    /// One allowed edit per 10 candidate characters.
    #[default]
    Standard,
    /// One allowed edit per 20 candidate characters.
    Tight,
}

impl Tolerance {
    fn allowed_edits(self, candidate_len: usize) -> usize {
        match self {
            Tolerance::Standard => candidate_len / 10,
            Tolerance::Tight => candidate_len / 20,
        }
    }
}

/// Decides whether two normalized titles denote the same work; callers that
/// scan a whole index normalize the query once and reuse it.
pub fn normalized_titles_match(query_norm: &str, candidate_norm: &str, tolerance: Tolerance) -> bool {
    let q_len = query_norm.chars().count();
    let c_len = candidate_norm.chars().count();

    // Candidate length must fall strictly within ±10% of the query length,
    // regardless of content.
    if (c_len as f64) <= q_len as f64 * 0.9 || (c_len as f64) >= q_len as f64 * 1.1 {
        return false;
    }

    if c_len > PREFIX_CHECK_LEN {
        let q_prefix: String = query_norm.chars().take(PREFIX_CHECK_LEN).collect();
        let c_prefix: String = candidate_norm.chars().take(PREFIX_CHECK_LEN).collect();
        if levenshtein(&q_prefix, &c_prefix) > PREFIX_MAX_EDITS {
            return false;
        }
    }

    levenshtein(query_norm, candidate_norm) <= tolerance.allowed_edits(c_len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::normalize_title;

    fn titles_match(query: &str, candidate_norm: &str) -> bool {
        normalized_titles_match(&normalize_title(query), candidate_norm, Tolerance::Standard)
    }

    #[test]
    fn test_identical_titles_match() {
        assert!(titles_match(
            "Deep learning for protein folding",
            "deep learning for protein folding"
        ));
    }

    #[test]
    fn test_normalization_drift_matches() {
        // Punctuation and diacritics should not keep the same work apart.
        assert!(titles_match(
            "Étude sur le climat: une synthèse régionale",
            "etude sur le climat une synthese regionale"
        ));
    }

    #[test]
    fn test_length_gate_rejects_regardless_of_content() {
        assert!(!titles_match("ABC", ""));
        assert!(!titles_match("ABC", "abcd")); // 4 > 3 * 1.1
        assert!(!titles_match("ABC", "ab")); // 2 < 3 * 0.9
        // Equal length passes the gate and identical content matches.
        assert!(titles_match("ABC", "abc"));
    }

    #[test]
    fn test_short_titles_tolerate_no_edits() {
        // candidate_len / 10 == 0 below ten characters
        assert!(!titles_match("ABC", "abd"));
    }

    #[test]
    fn test_tolerance_scales_with_length() {
        let query = "measurement of neutrino oscillations at reactors"; // 48 chars
        let candidate = "measurement of neutrino oscilations at reactorss"; // two edits
        assert!(normalized_titles_match(query, candidate, Tolerance::Standard));
        // The tight variant allows only 48 / 20 == 2 edits; three is too many.
        let worse = "measurment of neutrino oscilations at reactorss";
        assert!(!normalized_titles_match(query, worse, Tolerance::Tight));
    }

    #[test]
    fn test_prefix_guard_rejects_garbled_long_titles() {
        // 73 characters, so the overall budget is 7 edits. Six edits inside
        // the first 50 characters trip the prefix guard anyway.
        let tail = " tail of the title here";
        let query = format!("{}{}", "a".repeat(50), tail);
        let front_edits = format!("{}{}{}", "b".repeat(6), "a".repeat(44), tail);
        assert!(!normalized_titles_match(&query, &front_edits, Tolerance::Standard));
        // The same number of edits past the prefix is absorbed.
        let tail_edits = format!("{} tape of the title hers", "a".repeat(50));
        assert!(normalized_titles_match(&query, &tail_edits, Tolerance::Standard));
    }

    #[test]
    fn test_long_titles_within_tolerance_match() {
        let query = "a comprehensive survey of graph neural network architectures for molecules";
        let candidate = "a comprehensive survey of graph neural network architectures for molecule";
        assert!(normalized_titles_match(query, candidate, Tolerance::Standard));
    }
}
