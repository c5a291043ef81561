/// Derive a URL-safe slug from a title: lowercase, runs of
/// non-alphanumeric characters collapsed to a single `-`, leading and
/// trailing separators stripped.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_sep = false;

    for c in title.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(c);
            pending_sep = false;
        } else {
            pending_sep = true;
        }
    }

    slug
}
