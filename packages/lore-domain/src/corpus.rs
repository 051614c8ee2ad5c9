/// Trims a caller supplied corpus id and strips the first matching file extension.
///
/// Returns `None` when nothing is left, which callers treat as "no corpus filter".
pub fn normalize_corpus_id(raw: &str, extensions: &[String]) -> Option<String> {
	let trimmed = raw.trim();
	let stripped = extensions
		.iter()
		.filter(|ext| !ext.is_empty())
		.find_map(|ext| trimmed.strip_suffix(ext.as_str()))
		.unwrap_or(trimmed)
		.trim();

	if stripped.is_empty() { None } else { Some(stripped.to_string()) }
}
