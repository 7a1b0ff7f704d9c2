//! Majority helpers used by selection and flipping.

/// The most frequent key among `items`. Ties go to the key seen first.
pub fn most_common<T, K, F>(items: &[T], key: F) -> Option<K>
where
    K: PartialEq,
    F: Fn(&T) -> K,
{
    let mut counts: Vec<(K, usize)> = Vec::new();
    for item in items {
        let k = key(item);
        match counts.iter_mut().find(|(seen, _)| *seen == k) {
            Some((_, count)) => *count += 1,
            None => counts.push((k, 1)),
        }
    }

    let mut best: Option<(K, usize)> = None;
    for (k, count) in counts {
        match &best {
            Some((_, best_count)) if *best_count >= count => {}
            _ => best = Some((k, count)),
        }
    }
    best.map(|(k, _)| k)
}

/// Keep only the items whose key equals the most common key.
pub fn filter_most_common<T, K, F>(items: &[T], key: F) -> Vec<T>
where
    T: Clone,
    K: PartialEq,
    F: Fn(&T) -> K,
{
    match most_common(items, &key) {
        Some(winner) => items
            .iter()
            .filter(|item| key(item) == winner)
            .cloned()
            .collect(),
        None => Vec::new(),
    }
}
