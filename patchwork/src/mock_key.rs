use crate::Target;

/// Identifies one patched attribute: the identity of the target object plus
/// the attribute name. Two equal but distinct objects get distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct MockKey {
    target: usize,
    attribute: String,
}

impl MockKey {
    pub fn new(target: &Target, attribute: &str) -> Self {
        Self {
            target: target.id(),
            attribute: attribute.to_string(),
        }
    }
}
