use std::cmp::Ordering;
use std::iter::Peekable;
use std::str::Chars;

/// Natural ("alphanumeric") string comparison.
///
/// Runs of ASCII digits compare by numeric value, so `item2` sorts before `item10`.
/// Everything else compares character by character, lower-cased when `case_insensitive`.
/// Numerically equal runs with different zero padding (`a01` / `a1`) compare equal.
pub fn compare(a: &str, b: &str, case_insensitive: bool) -> Ordering {
    let mut ia = a.chars().peekable();
    let mut ib = b.chars().peekable();

    loop {
        match (ia.peek().copied(), ib.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(ca), Some(cb)) => {
                if ca.is_ascii_digit() && cb.is_ascii_digit() {
                    let ord = compare_digit_runs(&mut ia, &mut ib);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                    continue;
                }

                ia.next();
                ib.next();
                let ord = if case_insensitive {
                    ca.to_lowercase().cmp(cb.to_lowercase())
                } else {
                    ca.cmp(&cb)
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

/// Sort in place with the case-insensitive natural order (stable).
pub fn sort(entries: &mut [String]) {
    entries.sort_by(|a, b| compare(a, b, true));
}

fn take_digits(it: &mut Peekable<Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = it.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        run.push(c);
        it.next();
    }
    run
}

fn compare_digit_runs(ia: &mut Peekable<Chars<'_>>, ib: &mut Peekable<Chars<'_>>) -> Ordering {
    let ra = take_digits(ia);
    let rb = take_digits(ib);
    let sa = ra.trim_start_matches('0');
    let sb = rb.trim_start_matches('0');
    // Same digit count means lexical order is numeric order; avoids overflow on long runs.
    sa.len().cmp(&sb.len()).then_with(|| sa.cmp(sb))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(v: &[&str]) -> Vec<String> {
        let mut v: Vec<String> = v.iter().map(|s| s.to_string()).collect();
        sort(&mut v);
        v
    }

    #[test]
    fn numeric_runs_compare_by_value() {
        assert_eq!(compare("item2", "item10", true), Ordering::Less);
        assert_eq!(compare("item10", "item9", true), Ordering::Greater);
        assert_eq!(
            sorted(&["file10", "file1", "file2", "file20"]),
            vec!["file1", "file2", "file10", "file20"]
        );
    }

    #[test]
    fn case_is_ignored_when_requested() {
        assert_eq!(compare("apple", "Banana", true), Ordering::Less);
        assert_eq!(compare("apple", "Banana", false), Ordering::Greater);
        assert_eq!(compare("ABC", "abc", true), Ordering::Equal);
    }

    #[test]
    fn zero_padding_and_long_runs() {
        assert_eq!(compare("a01", "a1", true), Ordering::Equal);
        assert_eq!(compare("a007", "a10", true), Ordering::Less);
        assert_eq!(
            compare("v99999999999999999999999", "v100000000000000000000000", true),
            Ordering::Less
        );
    }

    #[test]
    fn prefix_sorts_first() {
        assert_eq!(compare("tag", "tag2", true), Ordering::Less);
        assert_eq!(compare("", "a", true), Ordering::Less);
    }

    #[test]
    fn sort_is_stable_for_equal_keys() {
        assert_eq!(sorted(&["b", "Apple", "apple"]), vec!["Apple", "apple", "b"]);
        assert_eq!(sorted(&["apple", "b", "Apple"]), vec!["apple", "Apple", "b"]);
    }
}
