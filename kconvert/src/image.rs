/// A container image reference split into its name and optional tag or digest.
///
/// Only `name[:tag]` and `name@digest` are understood. The reference is split once, so
/// `registry:5000/app:1.0` yields the name `registry` and the tag `5000/app:1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageRef<'a> {
    pub name: &'a str,
    pub tag: Option<&'a str>,
    pub digest: Option<&'a str>,
}

impl<'a> ImageRef<'a> {
    pub fn parse(image: &'a str) -> Self {
        // `@` takes precedence, the digest itself usually contains a `:`
        if let Some((name, digest)) = image.split_once('@') {
            return Self {
                name,
                tag: None,
                digest: Some(digest),
            };
        }

        match image.split_once(':') {
            Some((name, tag)) => Self {
                name,
                tag: Some(tag),
                digest: None,
            },
            None => Self {
                name: image,
                tag: None,
                digest: None,
            },
        }
    }
}
