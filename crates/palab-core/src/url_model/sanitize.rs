//! Filesystem-safe name sanitization.

/// Linux NAME_MAX in bytes.
pub(crate) const NAME_MAX: usize = 255;

/// Turns a repository path or URL segment into a single safe file name.
///
/// Path separators, NUL, control characters and whitespace become `_`, runs
/// of `_` collapse to one, leading/trailing dots and underscores are trimmed
/// (no hidden files, no `..`), and the result is cut to 255 bytes on a char
/// boundary.
pub fn sanitize_filename_for_linux(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let c = match c {
            '/' | '\\' | '\0' => '_',
            c if c.is_control() || c.is_whitespace() => '_',
            c => c,
        };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }

    let trimmed = out.trim_matches(|c| c == '.' || c == '_');
    let mut end = trimmed.len().min(NAME_MAX);
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    trimmed[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separators_become_underscores() {
        assert_eq!(
            sanitize_filename_for_linux("clips/fa\\train.tar"),
            "clips_fa_train.tar"
        );
    }

    #[test]
    fn no_hidden_or_parent_names() {
        assert_eq!(sanitize_filename_for_linux(".gitattributes"), "gitattributes");
        assert_eq!(sanitize_filename_for_linux("../../etc/passwd"), "etc_passwd");
    }

    #[test]
    fn whitespace_and_control_chars_collapse() {
        assert_eq!(
            sanitize_filename_for_linux("voice  model\x00v2.onnx"),
            "voice_model_v2.onnx"
        );
    }

    #[test]
    fn persian_names_survive_and_length_is_capped() {
        assert_eq!(sanitize_filename_for_linux("متن.txt"), "متن.txt");
        let long = "د".repeat(200);
        let out = sanitize_filename_for_linux(&long);
        assert!(out.len() <= NAME_MAX);
        assert!(out.chars().all(|c| c == 'د'));
    }
}
