use super::Object;

pub(super) fn metadata(root: &Object) -> Option<MetadataView<'_>> {
    root.get("metadata")
        .and_then(|v| v.as_object())
        .map(MetadataView)
}

/// Read-only access to the identity fields under `metadata`.
#[derive(Debug)]
pub(super) struct MetadataView<'a>(&'a Object);

impl<'a> MetadataView<'a> {
    pub(super) fn name(&self) -> Option<&'a str> {
        self.0.get("name").and_then(|v| v.as_str())
    }

    pub(super) fn namespace(&self) -> Option<&'a str> {
        self.0.get("namespace").and_then(|v| v.as_str())
    }
}
