// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Test fixtures: lopdf-built PDFs, an in-process structural codec and a
// scripted correction service.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use lopdf::{Dictionary, Document, Object, Stream, dictionary};
use pagewerk_core::error::{PagewerkError, Result};
use pagewerk_correct::CorrectionService;
use pagewerk_structure::{StructuralCodec, StructuralDocument, TextStreamExtractor};

// -- PDFs ---------------------------------------------------------------------

/// Content stream drawing `text` in Helvetica.
pub fn text_content(text: &str) -> Vec<u8> {
    format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET").into_bytes()
}

/// A document with one page per entry of `contents`; `None` makes a page
/// without a content stream. The font resource sits on the /Pages node.
pub fn pdf_with_contents(contents: &[Option<Vec<u8>>]) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids = Vec::with_capacity(contents.len());
    for content in contents {
        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
        };
        if let Some(content) = content {
            let content_id = doc.add_object(Stream::new(Dictionary::new(), content.clone()));
            page.set("Contents", Object::Reference(content_id));
        }
        kids.push(Object::Reference(doc.add_object(page)));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => Object::Integer(kids.len() as i64),
            "Kids" => kids,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ],
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => Object::Reference(font_id) },
            },
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));
    doc
}

/// One page per entry; an empty string makes a page with no content stream.
pub fn text_pdf(texts: &[&str]) -> Document {
    let contents: Vec<Option<Vec<u8>>> = texts
        .iter()
        .map(|text| (!text.is_empty()).then(|| text_content(text)))
        .collect();
    pdf_with_contents(&contents)
}

pub fn write_text_pdf(path: &Path, texts: &[&str]) {
    let mut doc = text_pdf(texts);
    doc.save(path).expect("save fixture PDF");
}

/// Content of every page, in page order.
pub fn page_contents(doc: &Document) -> Vec<String> {
    doc.get_pages()
        .into_values()
        .map(|page_id| {
            let content = doc.get_page_content(page_id).expect("page content");
            String::from_utf8_lossy(&content).into_owned()
        })
        .collect()
}

// -- Codec --------------------------------------------------------------------

/// Structural codec working directly on lopdf documents.
///
/// Encoding a page yields one stream object holding its content stream, or
/// no stream at all for a page without content. Decoding writes a one-page
/// PDF whose content is the extracted stream text.
#[derive(Default)]
pub struct FakeCodec {
    pub fail_encode_for: Vec<usize>,
    pub fail_decode: bool,
    pub hang_encode: bool,
    pub encode_calls: Arc<AtomicU32>,
}

#[async_trait]
impl StructuralCodec for FakeCodec {
    async fn encode(&self, pdf_path: &Path, page_index: usize) -> Result<StructuralDocument> {
        self.encode_calls.fetch_add(1, Ordering::SeqCst);
        if self.hang_encode {
            std::future::pending::<()>().await;
        }
        if self.fail_encode_for.contains(&page_index) {
            return Err(PagewerkError::ConversionError(format!("cannot encode page {page_index}")));
        }

        let doc = Document::load(pdf_path)
            .map_err(|err| PagewerkError::ConversionError(err.to_string()))?;
        let page_id = doc
            .get_pages()
            .into_values()
            .nth(page_index)
            .ok_or_else(|| PagewerkError::ConversionError(format!("no page {page_index}")))?;
        let content = doc
            .get_page_content(page_id)
            .map_err(|err| PagewerkError::ConversionError(err.to_string()))?;

        let mut structure =
            StructuralDocument::new().with_value("1 0", serde_json::json!({"Type": "/Page"}));
        if !content.is_empty() {
            let text = String::from_utf8_lossy(&content).into_owned();
            structure = structure.with_stream("2 0", None, text);
        }
        Ok(structure)
    }

    async fn decode_to_file(
        &self,
        document: &StructuralDocument,
        output_path: &Path,
    ) -> Result<()> {
        if self.fail_decode {
            return Err(PagewerkError::ReconstructionError("decoder refused".into()));
        }
        let content = TextStreamExtractor::extract(document).into_bytes();
        let mut doc = pdf_with_contents(&[Some(content)]);
        doc.save(output_path)
            .map_err(|err| PagewerkError::ReconstructionError(err.to_string()))?;
        Ok(())
    }
}

// -- Correction service -------------------------------------------------------

/// What the scripted service answers.
#[derive(Debug, Clone)]
pub enum Script {
    /// Diff replacing every "eror" with "error"; empty diff when none found.
    FixTypos,
    Fail,
    /// Fails with an error that is not a service error.
    MissingClient,
    Hang,
    Reply(String),
}

pub struct ScriptedService {
    script: Script,
    pub calls: Arc<AtomicU32>,
}

impl ScriptedService {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Call counter that stays readable after the service is boxed away.
    pub fn counter(&self) -> Arc<AtomicU32> {
        self.calls.clone()
    }
}

/// Unified diff fixing "eror" line by line, or an empty string.
pub fn typo_diff(text: &str) -> String {
    if !text.contains("eror") {
        return String::new();
    }
    let mut diff = vec!["--- original".to_string(), "+++ corrected".to_string()];
    for line in text.split('\n') {
        if line.contains("eror") {
            diff.push(format!("-{line}"));
            diff.push(format!("+{}", line.replace("eror", "error")));
        } else {
            diff.push(format!(" {line}"));
        }
    }
    diff.join("\n")
}

#[async_trait]
impl CorrectionService for ScriptedService {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn enhance_pdf_structure(&self, text: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::FixTypos => Ok(typo_diff(text)),
            Script::Fail => Err(PagewerkError::ServiceError("exit status 1".into())),
            Script::MissingClient => Err(PagewerkError::ToolNotFound("claude".into())),
            Script::Hang => std::future::pending().await,
            Script::Reply(reply) => Ok(reply.clone()),
        }
    }

    async fn is_available(&self) -> bool {
        true
    }
}
