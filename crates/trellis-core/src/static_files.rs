//! Serving files from a directory under a `*filepath` route.

use std::path::{Component, Path, PathBuf};

use crate::context::Context;
use crate::response::{StatusCode, mime_type_for_extension};

/// Map a captured `filepath` onto `root`, refusing anything that could
/// leave it.
fn resolve_file(root: &Path, filepath: &str) -> Option<PathBuf> {
    let relative = Path::new(filepath);
    if filepath.is_empty() || !relative.components().all(|c| matches!(c, Component::Normal(_))) {
        return None;
    }
    Some(root.join(relative))
}

pub(crate) fn handler(root: PathBuf) -> impl Fn(&mut Context<'_>) + Send + Sync + 'static {
    move |c: &mut Context<'_>| {
        let Some(file) = c.param("filepath").and_then(|p| resolve_file(&root, p)) else {
            c.status(StatusCode::NOT_FOUND);
            return;
        };
        match std::fs::read(&file) {
            Ok(bytes) => {
                let ext = file.extension().and_then(|e| e.to_str()).unwrap_or_default();
                c.set_header("content-type", mime_type_for_extension(ext));
                c.data(StatusCode::OK, &bytes);
            }
            Err(err) => {
                tracing::debug!(file = %file.display(), error = %err, "static file unavailable");
                c.status(StatusCode::NOT_FOUND);
            }
        }
    }
}
