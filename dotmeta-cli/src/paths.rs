//! Where to look for assemblies when `scan` is given no paths, and how directories are walked.

use std::{
    env,
    ffi::OsStr,
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;

/// Profile directory of a Mono installation holding the framework assemblies.
const MONO_PROFILE: &str = "lib/mono/4.5";

/// Well-known Mono prefixes, tried when `mono` is not on `PATH`.
const MONO_PREFIXES: &[&str] = &[
    "/usr",
    "/usr/local",
    "/opt/homebrew",
    "/Library/Frameworks/Mono.framework/Versions/Current",
];

/// Mono and Windows framework directories present on this machine.
pub fn default_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(mono) = mono_default_path(env::var_os("PATH").as_deref()) {
        paths.push(mono);
    }

    if let Some(windir) = env::var_os("WINDIR") {
        paths.extend(windows_frameworks(Path::new(&windir)));
    }

    paths
}

/// The Mono profile directory, derived from the `mono` binary on `search_path` or from one of
/// the well-known prefixes.
pub fn mono_default_path(search_path: Option<&OsStr>) -> Option<PathBuf> {
    let from_binary = search_path
        .into_iter()
        .flat_map(env::split_paths)
        .filter(|dir| dir.join("mono").is_file() || dir.join("mono.exe").is_file())
        .filter_map(|bin| bin.parent().map(|prefix| prefix.join(MONO_PROFILE)));

    from_binary
        .chain(MONO_PREFIXES.iter().map(|prefix| Path::new(prefix).join(MONO_PROFILE)))
        .find(|profile| profile.is_dir())
}

/// Every versioned directory under `Microsoft.NET\Framework` and `Framework64`.
pub fn windows_frameworks(windir: &Path) -> Vec<PathBuf> {
    let mut versions = Vec::new();

    for flavor in ["Framework", "Framework64"] {
        let Ok(entries) = fs::read_dir(windir.join("Microsoft.NET").join(flavor)) else {
            continue;
        };

        let mut found: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_dir()
                    && path
                        .file_name()
                        .and_then(OsStr::to_str)
                        .is_some_and(|name| name.starts_with('v'))
            })
            .collect();
        found.sort();
        versions.extend(found);
    }

    versions
}

/// Expand `roots` into a sorted list of files.
///
/// Files named directly are kept whatever their name. Directory entries are kept when their
/// name ends with `suffix`; subdirectories are only entered with `recursive`.
pub fn collect(roots: &[PathBuf], suffix: &str, recursive: bool) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for root in roots {
        if root.is_dir() {
            collect_dir(root, suffix, recursive, &mut files)?;
        } else {
            files.push(root.clone());
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

fn collect_dir(
    dir: &Path,
    suffix: &str,
    recursive: bool,
    files: &mut Vec<PathBuf>,
) -> anyhow::Result<()> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?;

    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            if recursive {
                collect_dir(&path, suffix, recursive, files)?;
            }
        } else if has_suffix(&path, suffix) {
            files.push(path);
        }
    }

    Ok(())
}

fn has_suffix(path: &Path, suffix: &str) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().ends_with(suffix))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_filters_by_suffix() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().to_path_buf();
        fs::create_dir_all(dir.join("nested")).unwrap();
        for name in ["b.dll", "a.dll", "c.exe", "nested/d.dll"] {
            fs::write(dir.join(name), b"").unwrap();
        }

        let flat = collect(&[dir.clone()], ".dll", false).unwrap();
        assert_eq!(flat, vec![dir.join("a.dll"), dir.join("b.dll")]);

        let deep = collect(&[dir.clone()], ".dll", true).unwrap();
        assert_eq!(deep.len(), 3);
        assert!(deep.contains(&dir.join("nested").join("d.dll")));

        let exe = collect(&[dir.clone(), dir.join("b.dll")], ".exe", false).unwrap();
        assert_eq!(exe, vec![dir.join("b.dll"), dir.join("c.exe")]);

        // Missing paths surface later as read errors of the scanned item
        assert_eq!(
            collect(&[dir.join("missing")], ".dll", false).unwrap(),
            vec![dir.join("missing")]
        );
    }

    #[test]
    fn frameworks() {
        let temp = tempfile::tempdir().unwrap();
        let windir = temp.path();
        let framework = windir.join("Microsoft.NET").join("Framework");
        for name in ["v4.0.30319", "v2.0.50727", "Config"] {
            fs::create_dir_all(framework.join(name)).unwrap();
        }
        fs::create_dir_all(windir.join("Microsoft.NET/Framework64/v4.0.30319")).unwrap();

        assert_eq!(
            windows_frameworks(windir),
            vec![
                framework.join("v2.0.50727"),
                framework.join("v4.0.30319"),
                windir.join("Microsoft.NET/Framework64/v4.0.30319"),
            ]
        );
        assert!(windows_frameworks(&windir.join("missing")).is_empty());
    }

    #[test]
    fn mono_from_binary() {
        let temp = tempfile::tempdir().unwrap();
        let prefix = temp.path();
        fs::create_dir_all(prefix.join("bin")).unwrap();
        fs::create_dir_all(prefix.join(MONO_PROFILE)).unwrap();
        fs::write(prefix.join("bin").join("mono"), b"").unwrap();

        let search = env::join_paths([prefix.join("bin")]).unwrap();
        assert_eq!(
            mono_default_path(Some(&search)),
            Some(prefix.join(MONO_PROFILE))
        );
    }
}
