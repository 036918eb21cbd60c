// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output assembly: a fresh document that receives, in page order, either the
// untouched source page or the first page of a rebuilt single-page PDF.

use std::collections::HashMap;
use std::path::Path;

use lopdf::{Document, Object, ObjectId, dictionary};
use pagewerk_core::error::{PagewerkError, Result};
use tracing::{debug, info, instrument, warn};

use super::clone::PageCloner;
use super::source::SourcePdf;

/// Builds the output document page by page.
pub struct OutputAssembler {
    document: Document,
    pages_id: ObjectId,
    kids: Vec<ObjectId>,
    /// Source objects already copied, shared by every original page so
    /// common fonts and images are written once.
    source_copies: HashMap<ObjectId, ObjectId>,
}

impl OutputAssembler {
    // -- Construction ---------------------------------------------------------

    /// Empty output with its own catalog and page tree, carrying over the
    /// source's PDF version and document information dictionary.
    pub fn for_source(source: &SourcePdf) -> Self {
        let mut assembler = Self::with_version(source.document().version.clone());

        let info = source
            .document()
            .trailer
            .get(b"Info")
            .and_then(|info| info.as_reference());
        if let Ok(info_id) = info {
            let mut cloner = PageCloner::new(source.document(), &mut assembler.source_copies);
            match cloner.clone_root(&mut assembler.document, info_id) {
                Ok(new_id) => assembler.document.trailer.set("Info", Object::Reference(new_id)),
                Err(err) => warn!(%err, "document info not carried over"),
            }
        }
        assembler
    }

    pub fn with_version(version: impl Into<String>) -> Self {
        let mut document = Document::with_version(version);
        let pages_id = document.new_object_id();
        document.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => Vec::<Object>::new(),
                "Count" => Object::Integer(0),
            }),
        );
        let catalog_id = document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        document.trailer.set("Root", Object::Reference(catalog_id));

        Self {
            document,
            pages_id,
            kids: Vec::new(),
            source_copies: HashMap::new(),
        }
    }

    // -- Appending ------------------------------------------------------------

    /// Append source page `page_id` unmodified.
    pub fn append_original(&mut self, source: &SourcePdf, page_id: ObjectId) -> Result<()> {
        let mut cloner = PageCloner::new(source.document(), &mut self.source_copies);
        let new_id = cloner.clone_page(&mut self.document, page_id, self.pages_id)?;
        self.kids.push(new_id);
        Ok(())
    }

    /// Append the first page of `rebuilt`.
    pub fn append_rebuilt(&mut self, rebuilt: &Document) -> Result<()> {
        let page_id = rebuilt
            .get_pages()
            .into_values()
            .next()
            .ok_or_else(|| PagewerkError::ReconstructionError("rebuilt PDF has no pages".into()))?;

        let mut copies = HashMap::new();
        let mut cloner = PageCloner::new(rebuilt, &mut copies);
        let new_id = cloner.clone_page(&mut self.document, page_id, self.pages_id)?;
        self.kids.push(new_id);
        Ok(())
    }

    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    // -- Output ---------------------------------------------------------------

    /// Finalise the page tree and return the document.
    pub fn into_document(mut self) -> Document {
        self.finalize();
        self.document
    }

    /// Finalise and write the document to `path`.
    #[instrument(skip_all, fields(path = %path.display(), pages = self.kids.len()))]
    pub fn save(mut self, path: &Path) -> Result<()> {
        self.finalize();
        self.document.save(path).map_err(|err| {
            PagewerkError::DocumentSaveError(format!("failed to write {}: {}", path.display(), err))
        })?;
        info!("output PDF written");
        Ok(())
    }

    fn finalize(&mut self) {
        let kids: Vec<Object> = self.kids.iter().copied().map(Object::Reference).collect();
        let count = kids.len() as i64;
        if let Ok(Object::Dictionary(pages)) = self.document.get_object_mut(self.pages_id) {
            pages.set("Kids", kids);
            pages.set("Count", Object::Integer(count));
        }

        // Objects copied by an append that failed halfway are unreachable.
        let pruned = self.document.prune_objects();
        if !pruned.is_empty() {
            debug!(pruned = pruned.len(), "dropped unreferenced objects");
        }
    }
}
