use kconvert::{Kustomization, ResourceMap};

fn main() {
    divan::main();
}

fn manifests(n: usize) -> String {
    let mut yaml = String::new();
    for i in 0..n {
        yaml.push_str(&format!(
            r#"---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: app-{i}
spec:
  template:
    spec:
      initContainers:
      - image: migrations-{m}:1.{i}
      containers:
      - image: app-{i}:1.0
      - image: envoy@sha256:{i:064x}
---
apiVersion: v1
kind: Secret
metadata:
  name: creds-{i}
data:
  username: YWRtaW4=
  password: czNjcjN0IHBhc3M=
"#,
            m = i % 16,
        ));
    }
    yaml
}

#[divan::bench(args = [10, 100, 1000])]
fn convert(bencher: divan::Bencher, n: usize) {
    let resources = ResourceMap::from_yaml_str(&manifests(n)).unwrap();

    bencher
        .with_inputs(|| (Kustomization::default(), resources.clone()))
        .bench_values(|(mut kustomization, mut resources)| {
            kconvert::convert(&mut kustomization, &mut resources).unwrap();
            kustomization
        });
}
