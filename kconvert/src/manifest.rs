use core::fmt;
use std::path::PathBuf;

use compact_str::CompactString;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::image::ImageRef;

pub type Str = CompactString;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Kustomization {
    #[serde(flatten)]
    pub type_meta: TypeMeta<apiversion::V1Beta1, kind::Kustomize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<PathBuf>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImageTag>,
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        rename = "secretGenerator"
    )]
    pub secret_generators: Vec<SecretGenerator>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ImageTag {
    pub name: Str,
    // `new_tag` is the value used to replace the original tag.
    #[serde(default, skip_serializing_if = "Str::is_empty")]
    pub new_tag: Str,
    // `digest` is the value used to replace the original image tag.
    // If `digest` is present `new_tag` is ignored.
    #[serde(default, skip_serializing_if = "Str::is_empty")]
    pub digest: Str,
}

impl From<ImageRef<'_>> for ImageTag {
    fn from(image: ImageRef<'_>) -> Self {
        Self {
            name: image.name.into(),
            new_tag: image.tag.unwrap_or_default().into(),
            digest: image.digest.unwrap_or_default().into(),
        }
    }
}

/// Renders the key image tags are ordered by: `name@digest` when a digest is set, `name:tag`
/// otherwise (even when the tag is empty).
impl fmt::Display for ImageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.digest.is_empty() {
            write!(f, "{}:{}", self.name, self.new_tag)
        } else {
            write!(f, "{}@{}", self.name, self.digest)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SecretGenerator {
    pub name: Str,
    #[serde(rename = "type")]
    pub ty: Str,
    /// Maps each secret key to a shell command printing its value.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub commands: IndexMap<Str, Str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TypeMeta<V, K> {
    pub api_version: Option<V>,
    pub kind: Option<K>,
}

impl<V, K> Default for TypeMeta<V, K>
where
    V: Default,
    K: Default,
{
    fn default() -> Self {
        Self {
            api_version: Some(V::default()),
            kind: Some(K::default()),
        }
    }
}

pub mod kind {
    use super::define_symbol;

    define_symbol!(Kustomize = "Kustomization");
    define_symbol!(Secret = "Secret");
}

pub mod apiversion {
    use super::define_symbol;

    define_symbol!(V1Beta1 = "kustomize.config.k8s.io/v1beta1");
}

macro_rules! define_symbol {
    ($name:ident = $value:literal) => {
        #[derive(Clone, PartialEq, Eq, Hash, Default)]
        #[allow(non_camel_case_types)]
        pub struct $name;

        impl ::core::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", $value)
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", $value)
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str($value)
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let value: $crate::manifest::Str = ::serde::Deserialize::deserialize(deserializer)?;
                if value == $value {
                    Ok($name)
                } else {
                    Err(serde::de::Error::custom(format!(
                        "expected `{}`, found `{value}`",
                        $value
                    )))
                }
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                other == $value
            }
        }
    };
}

use define_symbol;
