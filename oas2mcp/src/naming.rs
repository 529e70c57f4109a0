//! Canonical tool names

/// Snake-case body of a tool name.
///
/// `.` becomes `_`, an underscore is inserted at every lowercase→uppercase
/// boundary, every character outside `[a-zA-Z0-9_]` becomes `_`, runs of
/// underscores collapse to one, and the result is lowercased.
pub fn name_body(identifier: &str) -> String {
    let mut split = String::with_capacity(identifier.len() + 8);
    let mut prev_lower = false;
    for c in identifier.chars() {
        let c = if c == '.' { '_' } else { c };
        if prev_lower && c.is_ascii_uppercase() {
            split.push('_');
        }
        prev_lower = c.is_ascii_lowercase();
        split.push(c);
    }

    let mut body = String::with_capacity(split.len());
    for c in split.chars() {
        let c = if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' };
        if c == '_' && body.ends_with('_') {
            continue;
        }
        body.push(c);
    }
    body.to_ascii_lowercase()
}

/// Tool name for an operation identifier, e.g.
/// `documents.info` → `outline_documents_info`
pub fn canonical_name(namespace: &str, identifier: &str) -> String {
    let body = name_body(identifier);
    if namespace.is_empty() {
        body
    } else {
        format!("{}_{}", namespace, body)
    }
}

/// Lowercase words of an identifier, as split by [`name_body`]
pub fn identifier_tokens(identifier: &str) -> Vec<String> {
    name_body(identifier)
        .split('_')
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_dotted_identifier() {
        assert_eq!(canonical_name("outline", "documents.info"), "outline_documents_info");
        assert_eq!(canonical_name("outline", "auth.info"), "outline_auth_info");
    }

    #[test]
    fn test_camel_case_boundaries() {
        assert_eq!(canonical_name("outline", "fileOperations.list"), "outline_file_operations_list");
        assert_eq!(canonical_name("outline", "documents.search_titles"), "outline_documents_search_titles");
        assert_eq!(canonical_name("outline", "APIKeys.create"), "outline_apikeys_create");
    }

    #[test]
    fn test_invalid_characters_collapse() {
        assert_eq!(canonical_name("outline", "users/{id}--info"), "outline_users_id_info");
        assert_eq!(canonical_name("", "a..b"), "a_b");
    }

    #[test]
    fn test_tokens() {
        assert_eq!(identifier_tokens("groups.listMemberships"), vec!["groups", "list", "memberships"]);
    }

    proptest! {
        #[test]
        fn prop_body_charset(identifier in ".*") {
            let body = name_body(&identifier);
            prop_assert!(body.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'));
            prop_assert!(!body.contains("__"));
        }

        #[test]
        fn prop_name_is_prefixed_and_deterministic(identifier in "[a-zA-Z./_-]{0,24}") {
            let name = canonical_name("outline", &identifier);
            prop_assert!(name.starts_with("outline_"));
            prop_assert_eq!(name, canonical_name("outline", &identifier));
        }

        #[test]
        fn prop_body_is_stable(identifier in "[a-zA-Z0-9._]{0,24}") {
            let body = name_body(&identifier);
            prop_assert_eq!(name_body(&body), body.clone());
        }
    }
}
