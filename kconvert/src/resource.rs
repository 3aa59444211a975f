mod view;

use std::{fmt, ops::Deref};

use anyhow::bail;
use compact_str::ToCompactString;
use serde::{Deserialize, Serialize};

use crate::manifest::Str;

pub type Object = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Gvk {
    pub group: Str,
    pub version: Str,
    pub kind: Str,
}

impl Gvk {
    fn from_api_version(api_version: &str, kind: &str) -> Self {
        let (group, version) = api_version
            .split_once('/')
            .unwrap_or(("", api_version));

        Gvk {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }
}

impl fmt::Display for Gvk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}.{}", self.kind, self.version)
        } else {
            write!(f, "{}.{}.{}", self.kind, self.version, self.group)
        }
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ResId {
    pub gvk: Gvk,
    pub name: Str,
    pub namespace: Option<Str>,
}

impl Deref for ResId {
    type Target = Gvk;

    fn deref(&self) -> &Self::Target {
        &self.gvk
    }
}

impl fmt::Debug for ResId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for ResId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(namespace) = &self.namespace {
            write!(f, "{}/{}.{namespace}", self.gvk, self.name)?;
        } else {
            write!(f, "{}/{}", self.gvk, self.name)?;
        }
        Ok(())
    }
}

/// A single manifest document along with its identity.
///
/// The root holds the complete document, `apiVersion` and `kind` included, so any field can be
/// looked up with [`Resource::get_field_value`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    id: ResId,
    root: Object,
}

impl Resource {
    /// Identity fields that are missing or not strings are left empty rather than rejected, such
    /// documents are still carried along and skipped by the passes that need them.
    pub fn from_object(root: Object) -> Self {
        let str_field = |key: &str| root.get(key).and_then(|v| v.as_str()).unwrap_or_default();
        let gvk = Gvk::from_api_version(str_field("apiVersion"), str_field("kind"));

        let metadata = view::metadata(&root);
        let id = ResId {
            gvk,
            name: metadata
                .as_ref()
                .and_then(|m| m.name())
                .unwrap_or_default()
                .into(),
            namespace: metadata.and_then(|m| m.namespace()).map(Into::into),
        };

        Resource { id, root }
    }

    pub fn from_value(value: serde_json::Value) -> anyhow::Result<Self> {
        match value {
            serde_json::Value::Object(root) => Ok(Self::from_object(root)),
            other => bail!("expected a mapping for a resource document, found `{other}`"),
        }
    }

    pub fn id(&self) -> &ResId {
        &self.id
    }

    pub fn name(&self) -> &Str {
        &self.id.name
    }

    pub fn namespace(&self) -> Option<&Str> {
        self.id.namespace.as_ref()
    }

    pub fn gvk(&self) -> &Gvk {
        &self.id.gvk
    }

    pub fn kind(&self) -> &Str {
        &self.id.kind
    }

    pub fn root(&self) -> &Object {
        &self.root
    }

    /// Looks up a scalar by a dotted path such as `metadata.name`.
    /// Numbers and booleans are rendered as strings, `null` counts as missing.
    pub fn get_field_value(&self, path: &str) -> Result<Str, FieldError> {
        let mut segments = path.split('.');
        let missing = || FieldError::Missing { path: path.into() };

        let first = segments.next().ok_or_else(missing)?;
        let mut value = self.root.get(first).ok_or_else(missing)?;
        for segment in segments {
            value = value
                .as_object()
                .and_then(|object| object.get(segment))
                .ok_or_else(missing)?;
        }

        match value {
            serde_json::Value::Null => Err(missing()),
            serde_json::Value::String(s) => Ok(s.as_str().into()),
            serde_json::Value::Number(n) => Ok(n.to_compact_string()),
            serde_json::Value::Bool(b) => Ok(b.to_compact_string()),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                Err(FieldError::NotScalar { path: path.into() })
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    Missing { path: Str },
    NotScalar { path: Str },
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldError::Missing { path } => write!(f, "no field named `{path}`"),
            FieldError::NotScalar { path } => write!(f, "field `{path}` is not a scalar"),
        }
    }
}

impl std::error::Error for FieldError {}

impl Serialize for Resource {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        self.root.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Resource {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::de::Deserializer<'de>,
    {
        let root = Object::deserialize(deserializer)
            .map_err(|err| serde::de::Error::custom(format!("parsing resource: {err}")))?;
        Ok(Resource::from_object(root))
    }
}
