use std::ops::ControlFlow;

use serde_json::Value;

use crate::{
    image::ImageRef,
    manifest::{ImageTag, Kustomization},
    resource::Object,
    visit::{Visit, Visitor},
};

use super::{ResourceMap, Transformer};

/// Fields holding a list of containers, in the order they are searched.
const CONTAINER_FIELDS: [&str; 2] = ["containers", "initContainers"];

/// Collects the image of every container in the resources into `images`, sorted by
/// `name:tag` (or `name@digest`). Only the first reference seen for an image name is kept.
#[derive(Debug, Default)]
pub struct ImageTagTransformer(());

impl Transformer for ImageTagTransformer {
    #[tracing::instrument(skip_all, name = "imagetag_transform")]
    fn transform(
        &mut self,
        config: &mut Kustomization,
        resources: &mut ResourceMap,
    ) -> anyhow::Result<()> {
        for resource in resources.iter() {
            let mut collector = ImageCollector {
                images: &mut config.images,
            };
            let ControlFlow::Continue(()) = resource.root().visit_with(&mut collector);
        }

        config.images.sort_by_cached_key(ImageTag::to_string);
        tracing::debug!(images = config.images.len(), "collected image tags");

        Ok(())
    }
}

/// Finds container lists anywhere in a document.
///
/// A mapping holding a container field is not searched any further: container lists are treated
/// as leaves, as they are in pod specs.
struct ImageCollector<'c> {
    images: &'c mut Vec<ImageTag>,
}

impl<'a> Visitor<'a> for ImageCollector<'_> {
    type Break = std::convert::Infallible;

    fn visit_object(&mut self, object: &'a Object) -> ControlFlow<Self::Break> {
        let mut found = false;
        for field in CONTAINER_FIELDS {
            let Some(containers) = object.get(field) else {
                continue;
            };

            found = true;
            match containers.as_array() {
                Some(containers) => containers.iter().for_each(|c| self.collect(c)),
                None => tracing::trace!(field, "skipping container field that is not a list"),
            }
        }

        if found {
            ControlFlow::Continue(())
        } else {
            self.walk_object(object)
        }
    }

    // Only mappings inside lists can hold containers, nested lists are not searched.
    fn visit_array(&mut self, array: &'a [Value]) -> ControlFlow<Self::Break> {
        for object in array.iter().filter_map(Value::as_object) {
            self.visit_object(object)?;
        }

        ControlFlow::Continue(())
    }
}

impl ImageCollector<'_> {
    fn collect(&mut self, container: &Value) {
        let Some(image) = container.get("image").and_then(Value::as_str) else {
            tracing::trace!("skipping container without an image");
            return;
        };

        let image = ImageRef::parse(image);
        if self.images.iter().any(|tag| tag.name == image.name) {
            return;
        }

        self.images.push(image.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(manifests: &str) -> Kustomization {
        let mut resources = ResourceMap::from_yaml_str(manifests).unwrap();
        let mut config = Kustomization::default();
        ImageTagTransformer::default()
            .transform(&mut config, &mut resources)
            .unwrap();
        config
    }

    fn keys(config: &Kustomization) -> Vec<String> {
        config.images.iter().map(ImageTag::to_string).collect()
    }

    #[test]
    fn nested_deployment_containers() {
        let config = run(r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: cache
spec:
  template:
    spec:
      containers:
      - name: redis
        image: redis:6
"#);

        assert_eq!(
            config.images,
            [ImageTag {
                name: "redis".into(),
                new_tag: "6".into(),
                digest: Default::default(),
            }]
        );
    }

    #[test]
    fn cronjob_and_init_containers() {
        let config = run(r#"
apiVersion: batch/v1
kind: CronJob
metadata:
  name: backup
spec:
  jobTemplate:
    spec:
      template:
        spec:
          initContainers:
          - image: busybox@sha256:abcd
          containers:
          - image: postgres:15
          - image: alpine
"#);

        assert_eq!(
            keys(&config),
            ["alpine:", "busybox@sha256:abcd", "postgres:15"]
        );
    }

    #[test]
    fn first_occurrence_of_a_name_wins() {
        let config = run(r#"
apiVersion: v1
kind: Pod
metadata:
  name: a
spec:
  containers:
  - image: nginx:1.21
  - image: nginx:1.25
---
apiVersion: v1
kind: Pod
metadata:
  name: b
spec:
  containers:
  - image: nginx@sha256:ffff
"#);

        assert_eq!(keys(&config), ["nginx:1.21"]);
    }

    #[test]
    fn existing_entries_are_kept() -> anyhow::Result<()> {
        let mut resources = ResourceMap::from_yaml_str(
            r#"
apiVersion: v1
kind: Pod
metadata:
  name: a
spec:
  containers:
  - image: nginx:1.25
  - image: envoy:1.30
"#,
        )?;
        let mut config = Kustomization::default();
        config.images.push(ImageTag {
            name: "nginx".into(),
            new_tag: "1.21".into(),
            digest: Default::default(),
        });

        ImageTagTransformer::default().transform(&mut config, &mut resources)?;
        assert_eq!(keys(&config), ["envoy:1.30", "nginx:1.21"]);
        Ok(())
    }

    #[test]
    fn sorted_by_composite_key() {
        let config = run(r#"
apiVersion: v1
kind: Pod
metadata:
  name: a
spec:
  containers:
  - image: redis:7
  - image: nginx@sha256:abcd
  - image: Zookeeper:3
  - image: nginx-exporter:1
"#);

        // plain byte ordering, `-` sorts before `@`
        assert_eq!(
            keys(&config),
            ["Zookeeper:3", "nginx-exporter:1", "nginx@sha256:abcd", "redis:7"]
        );
    }

    #[test]
    fn container_field_stops_descent() {
        let config = run(r#"
apiVersion: v1
kind: Pod
metadata:
  name: a
spec:
  containers:
  - image: app:1
  sidecars:
    containers:
    - image: hidden:1
"#);

        assert_eq!(keys(&config), ["app:1"]);
    }

    #[test]
    fn malformed_branches_are_skipped() {
        let config = run(r#"
apiVersion: v1
kind: List
metadata:
  name: a
items:
- spec:
    containers: not-a-list
- spec:
    containers:
    - name: no-image
    - image: 42
    - just-a-string
    - image: ok:1
- [[{ containers: [{ image: "nested-list:1" }] }]]
- 7
"#);

        assert_eq!(keys(&config), ["ok:1"]);
    }

    #[test]
    fn no_containers() {
        let config = run(r#"
apiVersion: v1
kind: ConfigMap
metadata:
  name: settings
data:
  image: nginx:1.21
"#);

        assert!(config.images.is_empty());
    }
}
