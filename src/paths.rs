//! Identifier sanitization producing safe storage-relative paths.

/// Characters removed from identifiers before they are used as storage
/// paths. Everything in this list is unsafe in a URL, a filesystem path, or
/// both.
pub const UNSAFE_CHARACTERS: &[char] = &[
    '<', '>', ':', '"', '|', '?', '\0', '*', '`', ';', '\'', '+',
];

const PROTOCOL_MARKERS: &[&str] = &["https://", "http://", "://"];

/// Map an arbitrary asset identifier to a safe path under `base_path`.
///
/// The transform is a single deterministic pass: strip the `project_root`
/// prefix when present, strip protocol markers, drop every character in
/// [`UNSAFE_CHARACTERS`], normalize backslashes to forward slashes, and
/// discard empty, `.` and `..` segments so the result can never escape the
/// base path. There are no error conditions; malformed input still yields
/// best-effort-safe output.
pub fn resolve_storage_path(identifier: &str, base_path: &str, project_root: &str) -> String {
    let mut remainder = identifier;
    if !project_root.is_empty()
        && let Some(stripped) = remainder.strip_prefix(project_root)
    {
        remainder = stripped;
    }

    let mut cleaned = remainder.to_string();
    for marker in PROTOCOL_MARKERS {
        cleaned = cleaned.replace(marker, "");
    }
    cleaned.retain(|c| !UNSAFE_CHARACTERS.contains(&c));
    let cleaned = cleaned.replace('\\', "/");

    let segments: Vec<&str> = cleaned
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
        .collect();

    let base = normalize_base_path(base_path);
    if segments.is_empty() {
        return base.trim_end_matches('/').to_string();
    }
    format!("{}{}", base, segments.join("/"))
}

/// Normalize a base path to end with exactly one separator; an empty base
/// stays empty.
pub fn normalize_base_path(base_path: &str) -> String {
    let trimmed = base_path.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_remote_identifier_under_base_path() {
        let resolved = resolve_storage_path("https://cdn.example.com/lib.js", "internalized", "");
        assert_eq!(resolved, "internalized/cdn.example.com/lib.js");
    }

    #[test]
    fn strips_project_root_prefix() {
        let resolved =
            resolve_storage_path("/srv/app/public/css/app.css", "internalized", "/srv/app");
        assert_eq!(resolved, "internalized/public/css/app.css");
    }

    #[test]
    fn removes_unsafe_characters() {
        let resolved = resolve_storage_path("cdn<>:\"|?*`;'+lib.js", "internalized", "");
        assert_eq!(resolved, "internalized/cdnlib.js");
    }

    #[test]
    fn discards_traversal_segments() {
        let resolved = resolve_storage_path("../../etc/passwd", "internalized", "");
        assert_eq!(resolved, "internalized/etc/passwd");
    }

    #[test]
    fn normalizes_backslashes() {
        let resolved = resolve_storage_path("vendor\\widgets\\lib.js", "internalized", "");
        assert_eq!(resolved, "internalized/vendor/widgets/lib.js");
    }

    #[test]
    fn collapses_protocol_relative_identifiers() {
        let resolved = resolve_storage_path("//cdn.example.com/lib.js", "internalized", "");
        assert_eq!(resolved, "internalized/cdn.example.com/lib.js");
    }

    #[test]
    fn output_never_contains_unsafe_sequences() {
        let hostile = [
            "https://cdn.example.com/../../secret?token=1",
            "..\\..\\windows\\system32",
            "<script>alert('x')</script>",
            "://odd;proto`with+every'char|known",
            "/..//.//|nested*..",
        ];
        for identifier in hostile {
            let resolved = resolve_storage_path(identifier, "internalized", "");
            assert!(resolved.starts_with("internalized"), "{resolved}");
            assert!(
                !resolved.split('/').any(|segment| segment == ".." || segment.is_empty()),
                "{resolved}"
            );
            assert!(!resolved.contains("://"), "{resolved}");
            for c in UNSAFE_CHARACTERS {
                assert!(!resolved.contains(*c), "{resolved} contains {c:?}");
            }
        }
    }

    #[test]
    fn empty_identifier_resolves_to_the_base_path() {
        assert_eq!(resolve_storage_path("", "internalized", ""), "internalized");
    }

    #[test]
    fn normalizes_base_paths_to_one_trailing_separator() {
        assert_eq!(normalize_base_path("internalized"), "internalized/");
        assert_eq!(normalize_base_path("/internalized/"), "internalized/");
        assert_eq!(normalize_base_path(""), "");
    }
}
