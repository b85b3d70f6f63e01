const PDF_SUFFIX: &str = ".pdf";

/// `resume.pdf` -> `resume.png`, `Resume.PDF` -> `Resume.png`,
/// `notes.txt` -> `notes.txt.png`.
pub fn png_file_name(source_name: &str) -> String {
    let stem = source_name
        .len()
        .checked_sub(PDF_SUFFIX.len())
        .and_then(|split| {
            let suffix = source_name.get(split..)?;
            suffix
                .eq_ignore_ascii_case(PDF_SUFFIX)
                .then(|| &source_name[..split])
        })
        .unwrap_or(source_name);
    format!("{stem}.png")
}

#[cfg(test)]
mod tests {
    use super::png_file_name;

    #[test]
    fn strips_pdf_suffix_case_insensitively() {
        assert_eq!(png_file_name("resume.pdf"), "resume.png");
        assert_eq!(png_file_name("Resume.PDF"), "Resume.png");
        assert_eq!(png_file_name("cv.Pdf"), "cv.png");
    }

    #[test]
    fn keeps_other_names_whole() {
        assert_eq!(png_file_name("notes.txt"), "notes.txt.png");
        assert_eq!(png_file_name("pdf"), "pdf.png");
        assert_eq!(png_file_name("resume.pdf.bak"), "resume.pdf.bak.png");
    }

    #[test]
    fn handles_multibyte_names() {
        assert_eq!(png_file_name("résumé.pdf"), "résumé.png");
        assert_eq!(png_file_name("履歴書"), "履歴書.png");
    }
}
