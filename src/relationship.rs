use std::collections::{BTreeSet, HashSet};

/// Accounts in `following` that are absent from `followers`, compared by exact
/// handle equality. The result iterates in ascending lexicographic order.
pub fn non_reciprocal(following: &HashSet<String>, followers: &HashSet<String>) -> BTreeSet<String> {
    following.difference(followers).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(handles: &[&str]) -> HashSet<String> {
        handles.iter().map(|h| h.to_string()).collect()
    }

    #[test]
    fn test_difference_is_following_minus_followers() {
        let result = non_reciprocal(&set(&["a", "b", "c"]), &set(&["b", "c", "d"]));
        assert_eq!(result.into_iter().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn test_result_is_subset_of_following() {
        let following = set(&["zed", "amy", "kim", "bob"]);
        let followers = set(&["kim", "xavier"]);
        let result = non_reciprocal(&following, &followers);

        assert!(result.iter().all(|h| following.contains(h)));
        assert!(result.iter().all(|h| !followers.contains(h)));
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn test_empty_iff_fully_reciprocal() {
        let same = set(&["a", "b"]);
        assert!(non_reciprocal(&same, &same).is_empty());
        assert!(non_reciprocal(&set(&["a"]), &set(&["a", "b", "c"])).is_empty());
        assert!(non_reciprocal(&set(&[]), &set(&["a"])).is_empty());
        assert!(!non_reciprocal(&set(&["a", "b"]), &set(&["a"])).is_empty());
    }

    #[test]
    fn test_everything_when_no_followers() {
        let result = non_reciprocal(&set(&["b", "a"]), &set(&[]));
        assert_eq!(result.into_iter().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_sorted_and_case_sensitive() {
        let result = non_reciprocal(&set(&["charlie", "Alice", "bob"]), &set(&["alice"]));
        assert_eq!(
            result.into_iter().collect::<Vec<_>>(),
            vec!["Alice", "bob", "charlie"]
        );
    }
}
