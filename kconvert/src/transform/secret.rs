use core::fmt;

use anyhow::Context;
use base64::{
    Engine as _, alphabet,
    engine::{GeneralPurpose, GeneralPurposeConfig},
};
use indexmap::IndexMap;
use serde_json::Value;

use crate::{
    manifest::{Kustomization, SecretGenerator, Str, kind},
    resource::Resource,
};

use super::{ResourceMap, Transformer};

const DEFAULT_SECRET_TYPE: &str = "Opaque";

/// Standard alphabet with padding that, like Kubernetes, accepts non-zero trailing bits.
const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Turns `Secret` resources into `secretGenerator` entries and removes them from the resources.
///
/// Each value under `data` is decoded and replaced by a shell command printing it. A `Secret`
/// without a `data` field ends the pass early, leaving every later resource untouched.
#[derive(Debug, Default)]
pub struct SecretTransformer(());

/// What to do with a single resource.
#[derive(Debug)]
enum Outcome {
    Converted(SecretGenerator),
    Skipped,
    /// Stop the pass without an error.
    Abort,
}

impl Transformer for SecretTransformer {
    #[tracing::instrument(skip_all, name = "secret_transform")]
    fn transform(
        &mut self,
        config: &mut Kustomization,
        resources: &mut ResourceMap,
    ) -> anyhow::Result<()> {
        // Iterate over a snapshot of the ids as converted resources are removed along the way.
        let ids = resources.ids().cloned().collect::<Vec<_>>();

        for id in ids {
            let outcome = convert(&resources[&id])
                .with_context(|| format!("converting secret `{id}`"))?;
            match outcome {
                Outcome::Converted(generator) => {
                    tracing::debug!(%id, name = %generator.name, "converted secret");
                    config.secret_generators.push(generator);
                    resources.remove(&id);
                }
                Outcome::Skipped => {}
                Outcome::Abort => {
                    tracing::debug!(%id, "secret has no data, skipping remaining resources");
                    return Ok(());
                }
            }
        }

        config
            .secret_generators
            .sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));

        Ok(())
    }
}

fn convert(resource: &Resource) -> Result<Outcome, DecodeError> {
    let id = resource.id();
    match resource.get_field_value("kind") {
        Ok(resource_kind) if kind::Secret == *resource_kind => {}
        _ => return Ok(Outcome::Skipped),
    }

    let name = match resource.get_field_value("metadata.name") {
        Ok(name) => name,
        Err(err) => {
            tracing::debug!(%id, %err, "skipping secret without a name");
            return Ok(Outcome::Skipped);
        }
    };

    let ty = resource
        .get_field_value("type")
        .unwrap_or_else(|_| DEFAULT_SECRET_TYPE.into());

    let data = match resource.root().get("data") {
        None => return Ok(Outcome::Abort),
        Some(Value::Object(data)) => data,
        Some(_) => {
            tracing::debug!(%id, "skipping secret with data that is not a mapping");
            return Ok(Outcome::Skipped);
        }
    };

    let mut commands = IndexMap::with_capacity(data.len());
    for (key, value) in data {
        let decoded = decode(key, value)?;
        commands.insert(Str::from(key.as_str()), Str::from(print_command(&decoded)));
    }

    Ok(Outcome::Converted(SecretGenerator {
        name,
        ty,
        commands,
    }))
}

/// Decodes a `data` value, ignoring the line breaks of wrapped base64.
fn decode(key: &str, value: &Value) -> Result<Vec<u8>, DecodeError> {
    let error = |source| DecodeError {
        key: key.into(),
        value: match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        },
        source,
    };

    let encoded = value.as_str().ok_or_else(|| error(None))?;
    BASE64
        .decode(encoded.replace(['\r', '\n'], ""))
        .map_err(|err| error(Some(err)))
}

/// A shell command printing `value` verbatim.
///
/// `printf '%s'` is used over `echo` as it neither interprets escapes nor appends a newline.
/// Bytes that are not UTF-8, and NUL which no shell argument can hold, cannot be quoted as text.
/// Such values are spelled out as octal escapes in the format string instead.
fn print_command(value: &[u8]) -> String {
    match std::str::from_utf8(value) {
        Ok(s) if !s.contains('\0') => format!("printf '%s' {}", shell_quote(s)),
        _ => format!("printf '{}'", printf_escape(value)),
    }
}

/// Escapes `bytes` for use as a `printf` format string inside single quotes.
fn printf_escape(bytes: &[u8]) -> String {
    let mut escaped = String::with_capacity(bytes.len() * 4);
    for &b in bytes {
        match b {
            b'%' => escaped.push_str("%%"),
            b' '..=b'~' if !matches!(b, b'\\' | b'\'') => escaped.push(char::from(b)),
            _ => escaped.push_str(&format!("\\{b:03o}")),
        }
    }
    escaped
}

/// Quotes `s` for a POSIX shell, leaving it as is when no character needs quoting.
fn shell_quote(s: &str) -> String {
    let is_safe = |c: char| c.is_ascii_alphanumeric() || "_-+=.,/:@%".contains(c);
    if !s.is_empty() && s.chars().all(is_safe) {
        return s.to_owned();
    }

    // A single quote cannot appear inside single quotes, close the quotes and escape it instead.
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// A `data` value of a secret that is not valid base64.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    pub key: Str,
    pub value: String,
    /// Absent when the value is not a string at all.
    pub source: Option<base64::DecodeError>,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "couldn't base64 decode the secret key `{}` with value `{}`",
            self.key, self.value
        )
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|err| err as &(dyn std::error::Error + 'static))
    }
}
