use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

pub const ALLOWED_IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

// 경로 구분자, 제어 문자, 윈도우 예약 문자
static UNSAFE_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\\/\x00-\x1F:*?"<>|]"#).expect("valid regex"));

/// 클라이언트가 보낸 파일명을 이미지 디렉터리 밖을 가리킬 수 없는 이름으로 바꾼다.
pub fn sanitize_filename(original: &str) -> String {
    let cleaned = UNSAFE_FILENAME_CHARS.replace_all(original.trim(), "_");
    match cleaned.as_ref() {
        "" | "." | ".." => "upload".to_string(),
        name => name.to_string(),
    }
}

fn extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

pub fn is_allowed_image(filename: &str) -> bool {
    extension(filename).is_some_and(|e| ALLOWED_IMAGE_EXTENSIONS.contains(&e.as_str()))
}

pub fn image_content_type(filename: &str) -> &'static str {
    match extension(filename).as_deref() {
        Some("png") => "image/png",
        _ => "image/jpeg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_path_components() {
        assert_eq!(sanitize_filename("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_filename(r"C:\photos\fire.jpg"), "C__photos_fire.jpg");
        assert_eq!(sanitize_filename(".."), "upload");
    }

    #[test]
    fn keeps_ordinary_names() {
        assert_eq!(sanitize_filename("block b smoke.JPG"), "block b smoke.JPG");
    }

    #[test]
    fn image_extension_check_is_case_insensitive() {
        assert!(is_allowed_image("a.JPG"));
        assert!(is_allowed_image("a.jpeg"));
        assert!(is_allowed_image("a.png"));
        assert!(!is_allowed_image("a.gif"));
        assert!(!is_allowed_image("png"));
    }

    #[test]
    fn content_type_follows_extension() {
        assert_eq!(image_content_type("x.PNG"), "image/png");
        assert_eq!(image_content_type("x.jpeg"), "image/jpeg");
    }
}
