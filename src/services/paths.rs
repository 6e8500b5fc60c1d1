use uuid::Uuid;

/// Convert free text (a street address, a category name) into a
/// filesystem/URL-safe path segment.
///
/// Lowercases, maps whitespace and underscores to hyphens, drops everything
/// outside `[a-z0-9-]`, collapses hyphen runs and trims the ends. May return
/// an empty string when the input has no alphanumeric content; callers
/// validate against that before deriving paths.
pub fn sanitize(input: &str) -> String {
    input
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() || c == '_' { '-' } else { c })
        .filter(|c| matches!(c, 'a'..='z' | '0'..='9' | '-'))
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// First 8 characters of an id's string form; the whole id if shorter.
pub fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

/// Folder shared by a job's photos and its report: `jobs/{address-slug}_{short-id}`.
fn job_folder(address: &str, job_id: &str) -> String {
    format!("jobs/{}_{}", sanitize(address), short_id(job_id))
}

/// Object path for a newly uploaded photo. The trailing UUID makes each
/// upload unique; the rest of the path is deterministic so related objects
/// group under one folder per job.
pub fn photo_object_path(address: &str, job_id: &str, category_name: &str, extension: &str) -> String {
    format!(
        "{}/{}/{}.{}",
        job_folder(address, job_id),
        sanitize(category_name),
        Uuid::new_v4(),
        extension
    )
}

/// Object path for a job's generated PDF report. Fully deterministic:
/// re-approving a job overwrites the previous report object.
pub fn report_object_path(address: &str, job_id: &str) -> String {
    let folder = job_folder(address, job_id);
    format!(
        "{}/{}_{}.pdf",
        folder,
        sanitize(address),
        short_id(job_id)
    )
}

/// Recover the bucket-relative object path from a public URL produced by
/// [`crate::services::storage::ObjectStore::url_for`]. Returns `None` for
/// URLs that don't belong to this bucket.
pub fn object_path_from_url(public_base_url: &str, bucket: &str, url: &str) -> Option<String> {
    let prefix = format!("{}/{}/", public_base_url.trim_end_matches('/'), bucket);
    url.strip_prefix(&prefix)
        .filter(|rest| !rest.is_empty())
        .map(|rest| rest.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_basic() {
        assert_eq!(sanitize("123 Main St"), "123-main-st");
        assert_eq!(sanitize("Foo_Bar Baz"), "foo-bar-baz");
    }

    #[test]
    fn test_sanitize_strips_punctuation() {
        assert_eq!(sanitize("42 O'Brien Ave., Apt #7"), "42-obrien-ave-apt-7");
    }

    #[test]
    fn test_sanitize_collapses_and_trims_hyphens() {
        assert_eq!(sanitize("  --a   b--  "), "a-b");
        assert_eq!(sanitize("a___b"), "a-b");
    }

    #[test]
    fn test_sanitize_empty_results() {
        assert_eq!(sanitize(""), "");
        assert_eq!(sanitize("###!!!"), "");
        assert_eq!(sanitize("   "), "");
    }

    #[test]
    fn test_sanitize_idempotent() {
        for input in ["123 Main St", "Foo_Bar", "##x##", "A  B  C", "déjà vu"] {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_sanitize_output_charset() {
        for input in ["Hello, World!", "a_b c-d", "ümlaut Straße 9", "\t\n"] {
            let out = sanitize(input);
            assert!(
                out.is_empty()
                    || (out.chars().all(|c| matches!(c, 'a'..='z' | '0'..='9' | '-'))
                        && !out.starts_with('-')
                        && !out.ends_with('-')
                        && !out.contains("--")),
                "bad output {out:?} for {input:?}"
            );
        }
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("123e4567-e89b-12d3-a456-426614174000"), "123e4567");
        assert_eq!(short_id("abc"), "abc");
    }

    #[test]
    fn test_report_path_deterministic() {
        let a = report_object_path("123 Main St", "123e4567-e89b-12d3-a456-426614174000");
        let b = report_object_path("123 Main St", "123e4567-e89b-12d3-a456-426614174000");
        assert_eq!(a, b);
        assert_eq!(a, "jobs/123-main-st_123e4567/123-main-st_123e4567.pdf");
    }

    #[test]
    fn test_report_path_differs_by_job_id() {
        let a = report_object_path("123 Main St", "aaaaaaaa-0000-0000-0000-000000000000");
        let b = report_object_path("123 Main St", "bbbbbbbb-0000-0000-0000-000000000000");
        assert_ne!(a, b);
    }

    #[test]
    fn test_photo_path_shape() {
        let path = photo_object_path("123 Main St", "123e4567-e89b-12d3-a456-426614174000", "Front Yard", "jpg");
        assert!(path.starts_with("jobs/123-main-st_123e4567/front-yard/"));
        assert!(path.ends_with(".jpg"));
    }

    #[test]
    fn test_object_path_from_url_round_trip() {
        let base = "https://cdn.example.com";
        let bucket = "job-photos";
        let path = "jobs/123-main-st_123e4567/front-yard/abc.jpg";
        let url = format!("{base}/{bucket}/{path}");
        assert_eq!(object_path_from_url(base, bucket, &url), Some(path.to_string()));
        assert_eq!(object_path_from_url(base, "other-bucket", &url), None);
        assert_eq!(object_path_from_url(base, bucket, "https://elsewhere/x"), None);
    }
}
