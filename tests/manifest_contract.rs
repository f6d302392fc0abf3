//! Declarative contract of the shipped `site/vercel.json`

use std::path::{Path, PathBuf};

use deploy_router::deployment::{Deployment, Dispatch};
use deploy_router::manifest::{validate, BuilderKind, Manifest};
use deploy_router::routing::pattern::is_catch_all;
use deploy_router::routing::RouteTable;

fn site() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("site")
}

fn manifest() -> Manifest {
    Manifest::load(&site().join("vercel.json")).expect("shipped manifest parses")
}

fn routes() -> RouteTable {
    RouteTable::compile(&manifest().routes).expect("routes compile")
}

#[test]
fn shipped_manifest_is_valid() {
    let manifest = manifest();
    assert_eq!(manifest.version, 2);
    assert_eq!(validate(&manifest), Ok(()));
}

#[test]
fn exactly_one_catch_all_and_it_is_last() {
    let manifest = manifest();
    assert!(!manifest.routes.is_empty());

    let catch_alls: Vec<usize> = manifest
        .routes
        .iter()
        .enumerate()
        .filter(|(_, r)| is_catch_all(&r.src))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(catch_alls, vec![manifest.routes.len() - 1]);
}

#[test]
fn root_resolves_to_downloader_page() {
    let resolution = routes().resolve("/").unwrap();
    assert_eq!(resolution.route_index, 1);
    assert_eq!(resolution.destination, "/public/downloader.html");
}

#[test]
fn api_paths_resolve_to_backend() {
    let resolution = routes().resolve("/api/anything").unwrap();
    assert_eq!(resolution.route_index, 0);
    assert_eq!(resolution.destination, "api/backend.py");
    assert_eq!(resolution.first_capture(), Some("anything"));
}

#[test]
fn other_paths_fall_through_to_public() {
    let resolution = routes().resolve("/style.css").unwrap();
    assert_eq!(resolution.route_index, 2);
    assert_eq!(resolution.destination, "/public/style.css");
}

#[test]
fn every_build_is_reachable_from_a_route() {
    let deployment = Deployment::from_manifest(&site(), manifest()).unwrap();
    for build in deployment.builds().iter() {
        let reached = match build.kind {
            BuilderKind::Python => deployment.dispatch("/api/info"),
            BuilderKind::Static => deployment.dispatch("/style.css"),
        };
        let owner = match reached {
            Dispatch::Function { build_src, .. } => build_src,
            Dispatch::Static { relative, .. } => deployment
                .builds()
                .owner(&relative)
                .map(|b| b.src.clone())
                .unwrap_or_default(),
            other => panic!("unexpected dispatch {other:?}"),
        };
        assert_eq!(owner, build.src);
    }
}

#[test]
fn shipped_static_files_exist() {
    let deployment = Deployment::from_manifest(&site(), manifest()).unwrap();
    for path in ["/", "/style.css"] {
        let Dispatch::Static { relative, .. } = deployment.dispatch(path) else {
            panic!("{path} should be static");
        };
        assert!(site().join(&relative).is_file(), "{relative} is missing");
    }
}
