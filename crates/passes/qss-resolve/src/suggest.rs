//! "Did you mean" suggestions for misspelt names

use std::mem;

/// Names from `candidates` within a small edit distance of `name`, closest first
///
/// At most three are returned.
pub fn similar_names<'names>(
    name: &str,
    candidates: impl IntoIterator<Item = &'names str>,
) -> Vec<&'names str> {
    let mut suggestions: Vec<(&str, usize)> = candidates
        .into_iter()
        .filter(|candidate| *candidate != name)
        .map(|candidate| (candidate, levenshtein_distance(name, candidate)))
        .filter(|(_, distance)| *distance <= 2)
        .collect();
    suggestions.sort_by(|left, right| left.1.cmp(&right.1).then_with(|| left.0.cmp(right.0)));
    suggestions.into_iter().take(3).map(|(candidate, _)| candidate).collect()
}

/// Compute Levenshtein distance between two strings
pub fn levenshtein_distance(source: &str, target: &str) -> usize {
    let source: Vec<char> = source.chars().collect();
    let target: Vec<char> = target.chars().collect();

    if source.is_empty() {
        return target.len();
    }
    if target.is_empty() {
        return source.len();
    }

    let mut previous: Vec<usize> = (0..=target.len()).collect();
    let mut current = vec![0; target.len() + 1];
    for (idx, source_char) in source.iter().enumerate() {
        current[0] = idx + 1;
        for (jdx, target_char) in target.iter().enumerate() {
            let cost = usize::from(source_char != target_char);
            current[jdx + 1] = (previous[jdx + 1] + 1)
                .min(current[jdx] + 1)
                .min(previous[jdx] + cost);
        }
        mem::swap(&mut previous, &mut current);
    }

    previous[target.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein_distance("", ""), 0);
        assert_eq!(levenshtein_distance("abc", "abc"), 0);
        assert_eq!(levenshtein_distance("abc", "def"), 3);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("saturday", "sunday"), 3);
        assert_eq!(levenshtein_distance("größe", "grösse"), 2);
    }

    #[test]
    fn test_similar_names_are_close_and_ordered() {
        let names = ["count", "amount", "cont", "total", "counts"];
        assert_eq!(similar_names("coutn", names), ["cont", "count", "counts"]);
        assert!(similar_names("zzz", names).is_empty());
    }
}
