// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer — owns the extractor and runs each request on an
// isolated worker with a deadline.
//
// The extractor holds no per-document state, so one `Arc<Extractor>` is
// shared by every request.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use keiyaku_compare::{MarkerStyle, compare_texts};
use keiyaku_core::{ExtractorConfig, KeiyakuError};
use keiyaku_core::error::Result;
use keiyaku_document::Extractor;
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

use super::report::{ComparisonReport, ExtractionReport};
use super::worker::{RequestKind, run_isolated};

#[derive(Clone)]
pub struct AppServices {
    extractor: Arc<Extractor>,
    timeout: Duration,
}

impl AppServices {
    /// Services backed by the default engines.
    pub fn init(config: ExtractorConfig, timeout: Duration) -> Result<Self> {
        Ok(Self::with_extractor(Extractor::new(config)?, timeout))
    }

    /// Services backed by a preassembled extractor (custom engines).
    pub fn with_extractor(extractor: Extractor, timeout: Duration) -> Self {
        Self {
            extractor: Arc::new(extractor),
            timeout,
        }
    }

    // -- Extraction ----------------------------------------------------------

    pub async fn extract(&self, path: &Path) -> Result<ExtractionReport> {
        let request_id = Uuid::new_v4();
        let file = path.display().to_string();
        let extractor = Arc::clone(&self.extractor);
        let owned: PathBuf = path.to_path_buf();

        async move {
            let result =
                run_isolated(RequestKind::Extraction, &file, self.timeout, move || {
                    extractor.extract_path(&owned)
                })
                .await?;
            info!(kind = ?result.detected_kind, "extract request done");
            Ok::<_, KeiyakuError>(ExtractionReport::new(request_id, file, result))
        }
        .instrument(info_span!("extract", request_id = %request_id))
        .await
    }

    // -- Comparison ----------------------------------------------------------

    /// Extract both documents (A first), normalize, and align.
    pub async fn compare(
        &self,
        path_a: &Path,
        path_b: &Path,
        style: MarkerStyle,
    ) -> Result<ComparisonReport> {
        let request_id = Uuid::new_v4();
        let file_a = path_a.display().to_string();
        let file_b = path_b.display().to_string();
        let subject = format!("{file_a} vs {file_b}");
        let extractor = Arc::clone(&self.extractor);
        let (owned_a, owned_b) = (path_a.to_path_buf(), path_b.to_path_buf());

        async move {
            let (result_a, result_b, comparison) =
                run_isolated(RequestKind::Comparison, &subject, self.timeout, move || {
                    let result_a = extractor.extract_path(&owned_a)?;
                    let result_b = extractor.extract_path(&owned_b)?;
                    let comparison = compare_texts(&result_a.raw_text, &result_b.raw_text, style)?;
                    Ok((result_a, result_b, comparison))
                })
                .await?;
            info!(
                identical = comparison.is_identical(),
                "compare request done"
            );
            Ok::<_, KeiyakuError>(ComparisonReport {
                request_id,
                processed_at: chrono::Utc::now(),
                file_a,
                file_b,
                kind_a: result_a.kind_label,
                kind_b: result_b.kind_label,
                comparison,
            })
        }
        .instrument(info_span!("compare", request_id = %request_id))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keiyaku_core::DetectedKind;

    fn services() -> AppServices {
        AppServices::init(ExtractorConfig::default(), Duration::from_secs(30)).unwrap()
    }

    fn write_docx(dir: &Path, name: &str, paragraphs: &[&str]) -> PathBuf {
        use std::io::Write;

        let body: String = paragraphs
            .iter()
            .map(|p| format!("<w:p><w:r><w:t>{p}</w:t></w:r></w:p>"))
            .collect();
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        );
        let path = dir.join(name);
        let file = std::fs::File::create(&path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap();
        path
    }

    #[tokio::test]
    async fn extracts_a_word_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_docx(dir.path(), "a.docx", &["第1条(目的)", "本契約は以下の通り。"]);

        let report = services().extract(&path).await.unwrap();
        assert_eq!(report.result.detected_kind, DetectedKind::WordDoc);
        assert_eq!(report.result.raw_text, "第1条(目的)\n本契約は以下の通り。\n");
        assert_eq!(report.char_count, report.result.raw_text.chars().count());
    }

    #[tokio::test]
    async fn compares_two_word_documents() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_docx(dir.path(), "a.docx", &["第1条(総則)", "本契約は以下の通り。"]);
        let b = write_docx(dir.path(), "b.docx", &["第１条（総則）", "本契約は以下のとおり。"]);

        let report = services().compare(&a, &b, MarkerStyle::Plain).await.unwrap();
        assert_eq!(report.kind_a, "Word document (.docx)");
        assert_eq!(report.comparison.summary.equal_lines, 1);
        assert_eq!(report.comparison.left[1].content, "本契約は以下の[~通~]り。");
        assert_eq!(report.comparison.right[1].content, "本契約は以下の[~とお~]り。");
    }

    #[tokio::test]
    async fn unsupported_input_fails_before_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let notes = dir.path().join("notes.txt");
        std::fs::write(&notes, "本文").unwrap();

        let err = services().extract(&notes).await.unwrap_err();
        assert!(matches!(err, KeiyakuError::UnsupportedFormat(_)));

        let docx = write_docx(dir.path(), "a.docx", &["本文"]);
        let err = services()
            .compare(&docx, &notes, MarkerStyle::Html)
            .await
            .unwrap_err();
        assert!(matches!(err, KeiyakuError::UnsupportedFormat(_)));
    }
}
