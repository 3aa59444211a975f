mod image;
mod secret;

pub use self::image::ImageTagTransformer;
pub use self::secret::{DecodeError, SecretTransformer};

use crate::{manifest::Kustomization, resmap::ResourceMap};

/// A single conversion pass, moving what it recognizes in `resources` into `config`.
pub trait Transformer {
    fn transform(
        &mut self,
        config: &mut Kustomization,
        resources: &mut ResourceMap,
    ) -> anyhow::Result<()>;
}

/// Runs each pass in order against the same config and resources, stopping at the first error.
pub struct MultiTransformer(Vec<Box<dyn Transformer>>);

impl MultiTransformer {
    pub fn new(transformers: Vec<Box<dyn Transformer>>) -> Self {
        Self(transformers)
    }
}

impl Default for MultiTransformer {
    fn default() -> Self {
        Self::new(vec![
            Box::new(ImageTagTransformer::default()),
            Box::new(SecretTransformer::default()),
        ])
    }
}

impl Transformer for MultiTransformer {
    #[tracing::instrument(skip_all, fields(passes = self.0.len()))]
    fn transform(
        &mut self,
        config: &mut Kustomization,
        resources: &mut ResourceMap,
    ) -> anyhow::Result<()> {
        for transformer in &mut self.0 {
            transformer.transform(config, resources)?;
        }

        Ok(())
    }
}
