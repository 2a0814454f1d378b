use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Resolve a command name to a file the way a typical shell would.
///
/// Behavior:
/// - A name containing `/` is tried first, as given, independent of `search_path`.
/// - Otherwise (or if that fails) each `:`-separated segment of `search_path` is tried
///   in order as `segment/name`; an empty segment means the current directory and yields `./name`.
/// - Only regular files match. Whether they are executable is left to the executor.
/// - Missing `search_path` or empty name: `None`.
///
/// Returns either a borrowed reference to the provided `name` or an owned `PathBuf`
/// when the result is discovered via the search path.
pub fn resolve<'a>(search_path: Option<&str>, name: &'a str) -> Option<Cow<'a, Path>> {
    if name.is_empty() {
        return None;
    }

    let path = Path::new(name);
    if name.contains('/') && is_regular_file(path) {
        return Some(Cow::Borrowed(path));
    }

    let found: Option<Cow<'a, Path>> = find_in_path(search_path?, name).map(Cow::Owned);
    match &found {
        Some(p) => log::debug!("resolved {name} to {}", p.display()),
        None => log::debug!("{name} not found on search path"),
    }
    found
}

fn find_in_path(search_path: &str, name: &str) -> Option<PathBuf> {
    search_path
        .split(':')
        .map(|segment| {
            // `./name`; a bare name would be looked up on the child's PATH.
            if segment.is_empty() {
                Path::new(".").join(name)
            } else {
                Path::new(segment).join(name)
            }
        })
        .find(|candidate| is_regular_file(candidate))
}

/// Whether `path` exists and is a regular file, following symlinks.
pub fn is_regular_file(path: &Path) -> bool {
    path.metadata().map(|m| m.is_file()).unwrap_or(false)
}
