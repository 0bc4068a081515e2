/// Splits `uri` into its namespace and local name.
///
/// The split happens right after the last `/` or `#`, and only when what
/// follows is a plain local name (`[A-Za-z0-9_-]+`).
pub fn split_uri(uri: &str) -> Option<(&str, &str)> {
    let at = uri.rfind(['/', '#'])? + 1;
    let (base, leaf) = uri.split_at(at);

    is_local_name(leaf).then_some((base, leaf))
}

fn is_local_name(leaf: &str) -> bool {
    !leaf.is_empty()
        && leaf
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
