use crate::error::{Error, ErrorType};

/// First `/api/` segments owned by the static CRUD surface. Endpoints may
/// not be created under them; at dispatch time they can never collide
/// because the static router matches first.
pub(crate) const RESERVED_API_SEGMENTS: &[&str] =
    &["projects", "pages", "endpoints", "debug", "auth"];

/// Canonical form of a request or user-supplied path: leading `/`, one
/// trailing `/` stripped unless the path is exactly `/`.
pub(crate) fn normalize_path(path: &str) -> String {
    let trimmed = path.trim();
    let mut path = if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    };
    if path.len() > 1 && path.ends_with('/') {
        path.pop();
    }
    path
}

/// Anchor a user-supplied endpoint path under `/api/<slug>/`.
///
/// Generator-proposed paths sometimes arrive fully anchored; a leading
/// `/api` and a duplicated `<slug>/<slug>` prefix are collapsed rather
/// than rejected, so `/api/s/b` under project `s` lands at `/api/s/b`.
pub(crate) fn compose_endpoint_path(slug: &str, raw: &str) -> Result<String, Error> {
    if slug.is_empty() {
        return Err(ErrorType::BadRequest(
            "Project name does not produce a usable URL slug".into(),
        )
        .into());
    }

    let mut path = normalize_path(raw);
    if path == "/api" {
        path = "/".to_string();
    } else if let Some(rest) = path.strip_prefix("/api/") {
        path = format!("/{rest}");
    }

    let slug_segment = format!("/{slug}");
    let nested = format!("{slug_segment}/");
    let path = if path == slug_segment || path.starts_with(&nested) {
        let rest = &path[slug_segment.len()..];
        let rest = if rest == slug_segment || rest.starts_with(&nested) {
            &rest[slug_segment.len()..]
        } else {
            rest
        };
        format!("{slug_segment}{rest}")
    } else if path == "/" {
        slug_segment.clone()
    } else {
        format!("{slug_segment}{path}")
    };

    let full = format!("/api{path}");
    let first_segment = path.trim_start_matches('/').split('/').next().unwrap_or_default();
    if RESERVED_API_SEGMENTS.contains(&first_segment) {
        return Err(ErrorType::ReservedPath { path: full }.into());
    }
    Ok(full)
}

/// Anchor a user-supplied page path under `/<slug>/`. Pages may not live
/// under `/api/` in any form.
pub(crate) fn compose_page_path(slug: &str, raw: &str) -> Result<String, Error> {
    if slug.is_empty() {
        return Err(ErrorType::BadRequest(
            "Project name does not produce a usable URL slug".into(),
        )
        .into());
    }

    let path = normalize_path(raw);
    if path == "/api" || path.starts_with("/api/") {
        return Err(ErrorType::PageUnderApi { path }.into());
    }

    let slug_segment = format!("/{slug}");
    let nested = format!("{slug_segment}/");
    let path = if path == slug_segment || path.starts_with(&nested) {
        path
    } else if path == "/" {
        slug_segment.clone()
    } else {
        format!("{slug_segment}{path}")
    };

    // A project literally named "api" cannot host pages.
    if path == "/api" || path.starts_with("/api/") {
        return Err(ErrorType::PageUnderApi { path }.into());
    }
    Ok(path)
}
