//! Graph name resolution.
//!
//! Names live in a `/`-separated namespace tree. Global names start with the
//! root separator, private names with `~`; both are already resolved and are
//! never re-prefixed by a join.

/// Namespace separator.
pub const SEP: char = '/';

/// Marker for private (node-local) names.
pub const PRIV_NAME: char = '~';

/// Test if `name` is a global graph name (i.e. `/ns/name`).
pub fn is_global(name: &str) -> bool {
    name.starts_with(SEP)
}

/// Test if `name` is a private graph name (i.e. `~name`).
pub fn is_private(name: &str) -> bool {
    name.starts_with(PRIV_NAME)
}

/// Join a namespace and a name.
///
/// An unjoinable name (private or global) is returned unchanged regardless of
/// the namespace argument. An empty namespace returns the name as-is. The
/// separator is never doubled.
pub fn ns_join(ns: &str, name: &str) -> String {
    if is_private(name) || is_global(name) {
        return name.to_string();
    }
    if ns == "~" {
        return format!("{PRIV_NAME}{name}");
    }
    if ns.is_empty() {
        return name.to_string();
    }
    if ns.ends_with(SEP) {
        return format!("{ns}{name}");
    }
    format!("{ns}{SEP}{name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_and_private_names() {
        assert!(is_global("/talker"));
        assert!(!is_global("talker"));
        assert!(!is_global(""));
        assert!(is_private("~talker"));
        assert!(!is_private("talker"));
        assert!(!is_private(""));
    }

    #[test]
    fn test_ns_join_basic() {
        assert_eq!(ns_join("/demo", "talker"), "/demo/talker");
        assert_eq!(ns_join("/demo/", "talker"), "/demo/talker");
        assert_eq!(ns_join("/", "talker"), "/talker");
        assert_eq!(ns_join("", "talker"), "talker");
    }

    #[test]
    fn test_ns_join_unjoinable_names_are_returned_unchanged() {
        // Already-global and already-private names short-circuit the join.
        assert_eq!(ns_join("/demo", "/other/talker"), "/other/talker");
        assert_eq!(ns_join("/demo", "~talker"), "~talker");
        // Re-joining is idempotent.
        let joined = ns_join("/demo", "talker");
        assert_eq!(ns_join("/elsewhere", &joined), joined);
    }

    #[test]
    fn test_ns_join_private_namespace() {
        assert_eq!(ns_join("~", "talker"), "~talker");
    }
}
