/// Requirement planning and child-process command construction.
use super::types::{
    LaunchInvocation, OsType, ASSETS_BUNDLE, FABRIC_ASSET_INDEX, LIBRARIES_BUNDLE,
    LIBRARIES_FABRIC_BUNDLE, LIBRARIES_LEGACY_BUNDLE, NATIVES_BUNDLE, NATIVES_LEGACY_BUNDLE,
    OFFLINE_UUID, RUNTIME_BUNDLE,
};
use crate::catalog::{Target, TargetKind, VersionFamily};
use crate::catalog::types::FABRIC_ENTRY_CLASS;
use std::path::{Path, PathBuf};

/// Cache directory of a bundle, derived from its remote name.
fn bundle_dir(bundle: &str) -> &str {
    bundle.strip_suffix(".zip").unwrap_or(bundle)
}

/// Library and native bundles for a target, keyed by (kind, version family).
/// Fabric targets use a disjoint library set; legacy standard targets use
/// the old-generation bundles.
fn bundles_for(kind: TargetKind, family: VersionFamily) -> (&'static str, &'static str) {
    match (kind, family) {
        (TargetKind::Fabric, _) => (LIBRARIES_FABRIC_BUNDLE, NATIVES_BUNDLE),
        (TargetKind::Standard, VersionFamily::Legacy) => {
            (LIBRARIES_LEGACY_BUNDLE, NATIVES_LEGACY_BUNDLE)
        }
        (TargetKind::Standard, VersionFamily::Modern) => (LIBRARIES_BUNDLE, NATIVES_BUNDLE),
    }
}

/// The ordered bundle set a target needs before its own artifact: runtime,
/// libraries, natives, assets. Later launch steps assume earlier entries
/// already exist, so the order is part of the contract.
pub fn requirement_bundles(target: &Target) -> Vec<&'static str> {
    let (libraries, natives) = bundles_for(target.kind, target.version_family());
    vec![RUNTIME_BUNDLE, libraries, natives, ASSETS_BUNDLE]
}

/// Resolve a resource directory relative to the target's cache dir.
///
/// Targets flagged `internal` bundle resources inside their own directory;
/// the internal location wins only when it actually exists, checked per
/// resource, otherwise the shared parent-relative sibling is used.
fn resolve_resource(cache_dir: &Path, dir_name: &str, internal: bool) -> PathBuf {
    if internal && cache_dir.join(dir_name).is_dir() {
        PathBuf::from(".").join(dir_name)
    } else {
        PathBuf::from("..").join(dir_name)
    }
}

/// Build the full child-process invocation for a target.
///
/// All per-kind launch differences are decided here: the Fabric kind swaps
/// in the fixed Knot entry point and pinned asset index regardless of the
/// target's own fields.
pub fn build_invocation(
    target: &Target,
    cache_dir: &Path,
    ram_mb: u32,
    nickname: &str,
    os: OsType,
) -> LaunchInvocation {
    let (libraries_bundle, natives_bundle) = bundles_for(target.kind, target.version_family());

    let libraries_dir = resolve_resource(cache_dir, bundle_dir(libraries_bundle), target.internal);
    let natives_dir = resolve_resource(cache_dir, bundle_dir(natives_bundle), target.internal);
    let assets_dir = resolve_resource(cache_dir, bundle_dir(ASSETS_BUNDLE), target.internal);

    let (entry_class, asset_index) = match target.kind {
        TargetKind::Standard => (target.entry_point.as_str(), target.version_tag.as_str()),
        TargetKind::Fabric => (FABRIC_ENTRY_CLASS, FABRIC_ASSET_INDEX),
    };

    let classpath = format!(
        "{}{}{}",
        libraries_dir.join("*").to_string_lossy(),
        os.classpath_separator(),
        PathBuf::from(".").join(target.jar_name()).to_string_lossy()
    );

    let program = PathBuf::from("..")
        .join(bundle_dir(RUNTIME_BUNDLE))
        .join("bin")
        .join(os.runtime_executable());

    let args = vec![
        "-Xverify:none".to_string(),
        format!("-Xmx{}M", ram_mb),
        format!("-Djava.library.path={}", natives_dir.to_string_lossy()),
        "-cp".to_string(),
        classpath,
        entry_class.to_string(),
        "--username".to_string(),
        nickname.to_string(),
        "--gameDir".to_string(),
        ".".to_string(),
        "--assetsDir".to_string(),
        assets_dir.to_string_lossy().to_string(),
        "--assetIndex".to_string(),
        asset_index.to_string(),
        "--uuid".to_string(),
        OFFLINE_UUID.to_string(),
        "--accessToken".to_string(),
        "0".to_string(),
        "--userType".to_string(),
        "legacy".to_string(),
        "--version".to_string(),
        target.version_tag.clone(),
    ];

    LaunchInvocation {
        program,
        args,
        current_dir: cache_dir.to_path_buf(),
    }
}
