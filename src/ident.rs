//! `owner/name` identifiers.
//!
//! Models, deployments and deployment ids all use the same two-part shape.

/// Pattern a model identifier must match.
pub const MODEL_PATTERN: &str = "^[^/]+/[^/]+$";

/// Message shown when [`MODEL_PATTERN`] does not match.
pub const MODEL_PATTERN_MESSAGE: &str = "must match the format {model_owner}/{model_name}";

/// Pattern a model version id must match.
pub const VERSION_PATTERN: &str = "^[a-fA-F0-9]+$";

/// Message shown when [`VERSION_PATTERN`] does not match.
pub const VERSION_PATTERN_MESSAGE: &str = "must be a valid version ID";

/// Split `owner/name` into its two parts.
///
/// Returns `None` unless there are exactly two non-empty parts.
pub fn split_owner_name(value: &str) -> Option<(&str, &str)> {
    let mut parts = value.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => {
            Some((owner, name))
        }
        _ => None,
    }
}

/// Join an owner and a name into an identifier.
pub fn join_owner_name(owner: &str, name: &str) -> String {
    format!("{}/{}", owner, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use regex::Regex;

    #[test]
    fn test_split_owner_name() {
        assert_eq!(split_owner_name("stability-ai/sdxl"), Some(("stability-ai", "sdxl")));
        assert_eq!(split_owner_name("sdxl"), None);
        assert_eq!(split_owner_name("a/b/c"), None);
        assert_eq!(split_owner_name("/b"), None);
        assert_eq!(split_owner_name("a/"), None);
        assert_eq!(split_owner_name(""), None);
    }

    #[test]
    fn test_join_owner_name() {
        assert_eq!(join_owner_name("replicate-testing", "web"), "replicate-testing/web");
    }

    proptest! {
        #[test]
        fn split_inverts_join(owner in "[^/]{1,20}", name in "[^/]{1,20}") {
            let joined = join_owner_name(&owner, &name);
            prop_assert_eq!(split_owner_name(&joined), Some((owner.as_str(), name.as_str())));
        }

        #[test]
        fn split_agrees_with_model_pattern(value in "[a-z/]{0,12}") {
            let re = Regex::new(MODEL_PATTERN).unwrap();
            prop_assert_eq!(split_owner_name(&value).is_some(), re.is_match(&value));
        }
    }
}
