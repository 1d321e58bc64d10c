//! "Did you mean" suggestions for misspelled column names and handles

/// Levenshtein distance between two strings, counted in chars
pub fn edit_distance(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b_chars.len()).collect();
    let mut current = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != *cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b_chars.len()]
}

/// Closest candidate to `name`, if any is plausibly a typo of it.
///
/// Case-insensitive equality always wins. Otherwise a candidate qualifies when
/// its distance is at most a third of the longer string (minimum 1).
pub fn closest_match<'a, I>(name: &str, candidates: I) -> Option<String>
where
    I: IntoIterator<Item = &'a String>,
{
    let lowered = name.to_lowercase();
    let mut best: Option<(usize, &String)> = None;

    for candidate in candidates {
        if candidate.to_lowercase() == lowered {
            return Some(candidate.clone());
        }
        let distance = edit_distance(&lowered, &candidate.to_lowercase());
        let longest = name.chars().count().max(candidate.chars().count());
        let threshold = (longest / 3).max(1);
        if distance <= threshold && best.map_or(true, |(d, _)| distance < d) {
            best = Some((distance, candidate));
        }
    }

    best.map(|(_, candidate)| candidate.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("", ""), 0);
        assert_eq!(edit_distance("abc", ""), 3);
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("value", "valeu"), 2);
    }

    #[test]
    fn test_closest_match_prefers_case_insensitive_equal() {
        let candidates = names(&["Value", "value2"]);
        assert_eq!(closest_match("value", &candidates), Some("Value".to_string()));
    }

    #[test]
    fn test_closest_match_finds_typo() {
        let candidates = names(&["id", "name", "amount"]);
        assert_eq!(closest_match("amonut", &candidates), Some("amount".to_string()));
        assert_eq!(closest_match("nme", &candidates), Some("name".to_string()));
    }

    #[test]
    fn test_closest_match_rejects_unrelated() {
        let candidates = names(&["id", "name", "amount"]);
        assert_eq!(closest_match("temperature", &candidates), None);
    }
}
