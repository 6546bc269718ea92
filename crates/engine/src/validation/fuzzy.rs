//! Fuzzy string matching: Levenshtein distance for "Did you mean …?"
//! suggestions and kebab-case checks for document ids.

/// Closest candidate by edit distance, or `None` when even the best one is
/// further away than half the longer string.
pub(crate) fn fuzzy_match<'a, S: AsRef<str>>(input: &str, candidates: &'a [S]) -> Option<&'a str> {
    let needle = input.to_lowercase();
    let (best, distance) = candidates
        .iter()
        .map(|c| c.as_ref())
        .map(|c| (c, levenshtein(&needle, &c.to_lowercase())))
        .fold(None, |best: Option<(&str, usize)>, (c, d)| match best {
            Some((_, top)) if d >= top => best,
            _ => Some((c, d)),
        })?;

    let limit = input.len().max(best.len()) / 2;
    (distance <= limit).then_some(best)
}

/// Levenshtein edit distance over chars.
pub(crate) fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let above = row[j + 1];
            let substitution = diagonal + usize::from(ca != *cb);
            row[j + 1] = substitution.min(above + 1).min(row[j] + 1);
            diagonal = above;
        }
    }

    row[b.len()]
}

/// `^[a-z0-9]+(-[a-z0-9]+)*$`
pub(crate) fn is_kebab_case(s: &str) -> bool {
    !s.is_empty()
        && s.split('-').all(|part| {
            !part.is_empty()
                && part
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        })
}

/// Render a suggestion the way validation messages carry it.
pub(crate) fn did_you_mean(candidate: &str) -> String {
    format!("Did you mean '{candidate}'?")
}
