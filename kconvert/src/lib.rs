use std::path::Path;

use anyhow::Context;

pub mod image;
pub mod manifest;
pub mod resmap;
pub mod resource;
pub mod transform;
mod visit;

pub use self::manifest::Kustomization;
pub use self::resmap::ResourceMap;
pub use self::resource::{ResId, Resource};
pub use self::transform::{MultiTransformer, Transformer};

pub const KUSTOMIZATION_FILE: &str = "kustomization.yaml";
pub const RESOURCES_FILE: &str = "resources.yaml";

/// Reads every document of every file into a single `ResourceMap`, in order.
pub fn load_resources<P: AsRef<Path>>(
    paths: impl IntoIterator<Item = P>,
) -> anyhow::Result<ResourceMap> {
    let mut resources = ResourceMap::default();
    for path in paths {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading manifest {}", path.display()))?;
        let documents = ResourceMap::from_yaml_str(&contents)
            .with_context(|| format!("loading manifest {}", path.display()))?;
        tracing::debug!(path = %path.display(), resources = documents.len(), "loaded manifest");
        resources
            .merge(documents)
            .with_context(|| format!("loading manifest {}", path.display()))?;
    }

    Ok(resources)
}

/// Runs the image tag and secret passes, moving what they recognize from `resources` into
/// `config`.
pub fn convert(config: &mut Kustomization, resources: &mut ResourceMap) -> anyhow::Result<()> {
    MultiTransformer::default().transform(config, resources)
}

/// Writes `config` to `kustomization.yaml` in `dir`, and the remaining resources, if any, to
/// `resources.yaml` which is then listed under `resources`. A `resources.yaml` left over from an
/// earlier run is removed when nothing remains.
#[tracing::instrument(skip_all, fields(dir = %dir.display()))]
pub fn write_dir(
    dir: &Path,
    mut config: Kustomization,
    resources: &ResourceMap,
) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let resources_path = dir.join(RESOURCES_FILE);
    if resources.is_empty() {
        match std::fs::remove_file(&resources_path) {
            Ok(()) => tracing::debug!("removed stale {RESOURCES_FILE}"),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("removing {}", resources_path.display()));
            }
        }
    } else {
        std::fs::write(&resources_path, resources.to_string())
            .with_context(|| format!("writing {}", resources_path.display()))?;
        config.resources.push(RESOURCES_FILE.into());
    }

    let kustomization_path = dir.join(KUSTOMIZATION_FILE);
    let file = std::fs::File::create(&kustomization_path)
        .with_context(|| format!("creating {}", kustomization_path.display()))?;
    serde_yaml::to_writer(file, &config)
        .with_context(|| format!("writing {}", kustomization_path.display()))?;

    Ok(())
}
