use crate::models::PurgeRequest;
use forecourt::cache::Tag;
use shared::Error;

const MAX_KEY_LEN: usize = 255;

#[derive(Debug)]
pub enum ValidationError {
    EmptyKey,
    KeyTooLong { key: String },
    InvalidTag { tag: String, reason: &'static str },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::EmptyKey => {
                write!(f, "Cache keys must not be empty")
            }
            ValidationError::KeyTooLong { key } => {
                write!(
                    f,
                    "Cache key '{}' exceeds the maximum length of {} bytes",
                    key, MAX_KEY_LEN
                )
            }
            ValidationError::InvalidTag { tag, reason } => {
                write!(f, "Invalid tag '{}': {}", tag, reason)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validates a purge request before any store call is made. Tag names become
/// store keys under the reserved `tag:` namespace, so they are checked
/// against the tag syntax rules; a violation is a validation error, distinct
/// from a store failure.
pub fn validate_purge_request(
    req: &PurgeRequest,
) -> Result<(Vec<String>, Vec<Tag>), ValidationError> {
    for key in &req.keys {
        if key.is_empty() {
            return Err(ValidationError::EmptyKey);
        }
        if key.len() > MAX_KEY_LEN {
            return Err(ValidationError::KeyTooLong { key: key.clone() });
        }
    }

    let mut tags = Vec::with_capacity(req.tags.len());
    for raw in &req.tags {
        match Tag::new(raw.clone()) {
            Ok(tag) => tags.push(tag),
            Err(Error::InvalidTag { tag, reason }) => {
                return Err(ValidationError::InvalidTag { tag, reason });
            }
            Err(_) => {
                return Err(ValidationError::InvalidTag {
                    tag: raw.clone(),
                    reason: "tag failed validation",
                });
            }
        }
    }

    Ok((req.keys.clone(), tags))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(keys: Vec<&str>, tags: Vec<&str>) -> PurgeRequest {
        PurgeRequest {
            keys: keys.into_iter().map(String::from).collect(),
            tags: tags.into_iter().map(String::from).collect(),
        }
    }

    #[test]
    fn accepts_wellformed_keys_and_tags() {
        let (keys, tags) =
            validate_purge_request(&request(vec!["car:42"], vec!["listing:42", "country:US"]))
                .unwrap();
        assert_eq!(keys, vec!["car:42"]);
        assert_eq!(tags.len(), 2);
    }

    #[test]
    fn rejects_malformed_tags_before_any_store_call() {
        assert!(matches!(
            validate_purge_request(&request(vec![], vec!["has space"])),
            Err(ValidationError::InvalidTag { .. })
        ));
        assert!(matches!(
            validate_purge_request(&request(vec![], vec![""])),
            Err(ValidationError::InvalidTag { .. })
        ));
    }

    #[test]
    fn rejects_oversized_keys() {
        let long = "k".repeat(300);
        assert!(matches!(
            validate_purge_request(&request(vec![&long], vec![])),
            Err(ValidationError::KeyTooLong { .. })
        ));
        assert!(matches!(
            validate_purge_request(&request(vec![""], vec![])),
            Err(ValidationError::EmptyKey)
        ));
    }

    #[test]
    fn empty_request_is_valid_and_means_full_flush() {
        let (keys, tags) = validate_purge_request(&request(vec![], vec![])).unwrap();
        assert!(keys.is_empty());
        assert!(tags.is_empty());
    }
}
