// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Deep page cloning between lopdf documents.
//
// Every object reachable from a page is copied into the target exactly once
// per source document, so pages sharing fonts or images keep sharing them and
// reference cycles (annotation /P back-pointers) terminate.

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object, ObjectId};
use pagewerk_core::error::{PagewerkError, Result};
use tracing::warn;

/// Page attributes that may live on an ancestor /Pages node.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guards against malformed page trees whose /Parent chain loops.
const MAX_TREE_DEPTH: usize = 64;

/// Copies pages from `source` into a target document, remembering which
/// source objects were already copied.
pub struct PageCloner<'a> {
    source: &'a Document,
    copied: &'a mut HashMap<ObjectId, ObjectId>,
}

impl<'a> PageCloner<'a> {
    pub fn new(source: &'a Document, copied: &'a mut HashMap<ObjectId, ObjectId>) -> Self {
        Self { source, copied }
    }

    /// Clone page `page_id` into `target` under the /Pages node `parent`,
    /// returning the new page's object id. Inherited attributes are resolved
    /// onto the copy since its new parent does not carry them.
    pub fn clone_page(
        &mut self,
        target: &mut Document,
        page_id: ObjectId,
        parent: ObjectId,
    ) -> Result<ObjectId> {
        let source = self.source;
        let page = source.get_dictionary(page_id).map_err(|err| {
            PagewerkError::ReconstructionError(format!(
                "cannot read page object {:?}: {}",
                page_id, err
            ))
        })?;

        let new_id = match self.copied.get(&page_id) {
            Some(&existing) => existing,
            None => {
                let id = target.new_object_id();
                self.copied.insert(page_id, id);
                id
            }
        };

        let mut cloned = self.clone_dictionary(target, page)?;
        for key in INHERITABLE {
            if page.has(key) {
                continue;
            }
            if let Some(value) = inherited_attribute(source, page, key) {
                let value = self.clone_object(target, value)?;
                cloned.set(key.to_vec(), value);
            }
        }
        cloned.set("Parent", Object::Reference(parent));

        target.objects.insert(new_id, Object::Dictionary(cloned));
        Ok(new_id)
    }

    /// Clone object `id` and everything it references, returning its new id.
    pub fn clone_root(&mut self, target: &mut Document, id: ObjectId) -> Result<ObjectId> {
        self.clone_reference(target, id)
    }

    fn clone_object(&mut self, target: &mut Document, object: &Object) -> Result<Object> {
        match object {
            Object::Reference(id) => Ok(Object::Reference(self.clone_reference(target, *id)?)),
            Object::Dictionary(dict) => {
                Ok(Object::Dictionary(self.clone_dictionary(target, dict)?))
            }
            Object::Array(items) => {
                let mut cloned = Vec::with_capacity(items.len());
                for item in items {
                    cloned.push(self.clone_object(target, item)?);
                }
                Ok(Object::Array(cloned))
            }
            Object::Stream(stream) => {
                let mut cloned = stream.clone();
                cloned.dict = self.clone_dictionary(target, &stream.dict)?;
                Ok(Object::Stream(cloned))
            }
            other => Ok(other.clone()),
        }
    }

    /// Skips /Parent: the page-tree back-pointer is re-created by the caller.
    fn clone_dictionary(&mut self, target: &mut Document, dict: &Dictionary) -> Result<Dictionary> {
        let mut cloned = Dictionary::new();
        for (key, value) in dict.iter() {
            if key == b"Parent" {
                continue;
            }
            cloned.set(key.clone(), self.clone_object(target, value)?);
        }
        Ok(cloned)
    }

    fn clone_reference(&mut self, target: &mut Document, id: ObjectId) -> Result<ObjectId> {
        if let Some(&existing) = self.copied.get(&id) {
            return Ok(existing);
        }

        // Reserve the id first so cycles resolve to it.
        let new_id = target.new_object_id();
        self.copied.insert(id, new_id);

        let source = self.source;
        let cloned = match source.get_object(id) {
            Ok(object) => self.clone_object(target, object)?,
            Err(err) => {
                warn!(?id, %err, "cannot resolve reference, using Null");
                Object::Null
            }
        };
        target.objects.insert(new_id, cloned);
        Ok(new_id)
    }
}

/// Look up `key` on the ancestors of `page`.
fn inherited_attribute<'d>(
    source: &'d Document,
    page: &'d Dictionary,
    key: &[u8],
) -> Option<&'d Object> {
    let mut next = page.get(b"Parent").and_then(|parent| parent.as_reference()).ok();
    let mut depth = 0;

    while let Some(node_id) = next {
        if depth >= MAX_TREE_DEPTH {
            warn!(?node_id, "page tree deeper than expected, giving up on inheritance");
            return None;
        }
        let node = source.get_dictionary(node_id).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value);
        }
        next = node.get(b"Parent").and_then(|parent| parent.as_reference()).ok();
        depth += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Stream, dictionary};

    /// Source with MediaBox and Resources on the /Pages node and an annotation
    /// pointing back at its page.
    fn source_with_inheritance() -> (Document, ObjectId) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let content = b"BT /F1 12 Tf (Hi) Tj ET".to_vec();
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.new_object_id();
        let annot_id = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Text",
            "P" => Object::Reference(page_id),
        });
        doc.objects.insert(
            page_id,
            Object::Dictionary(dictionary! {
                "Type" => "Page",
                "Parent" => Object::Reference(pages_id),
                "Contents" => Object::Reference(content_id),
                "Annots" => vec![Object::Reference(annot_id)],
            }),
        );
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => Object::Integer(1),
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
        (doc, page_id)
    }

    #[test]
    fn inherited_attributes_are_copied_onto_page() {
        let (source, page_id) = source_with_inheritance();
        let mut target = Document::with_version("1.5");
        let parent = target.new_object_id();

        let mut copied = HashMap::new();
        let new_page = PageCloner::new(&source, &mut copied)
            .clone_page(&mut target, page_id, parent)
            .expect("clone");

        let page = target.get_dictionary(new_page).expect("page dict");
        assert!(page.has(b"MediaBox"));
        assert!(page.has(b"Resources"));
        assert_eq!(page.get(b"Parent").and_then(|p| p.as_reference()).ok(), Some(parent));
    }

    #[test]
    fn back_reference_cycle_terminates_and_points_at_copy() {
        let (source, page_id) = source_with_inheritance();
        let mut target = Document::with_version("1.5");
        let parent = target.new_object_id();

        let mut copied = HashMap::new();
        let new_page = PageCloner::new(&source, &mut copied)
            .clone_page(&mut target, page_id, parent)
            .expect("clone");

        let page = target.get_dictionary(new_page).expect("page dict");
        let annots = page.get(b"Annots").and_then(|a| a.as_array()).expect("annots");
        let annot_id = annots[0].as_reference().expect("annot ref");
        let annot = target.get_dictionary(annot_id).expect("annot dict");
        assert_eq!(annot.get(b"P").and_then(|p| p.as_reference()).ok(), Some(new_page));
    }

    #[test]
    fn shared_objects_are_copied_once() {
        let (source, page_id) = source_with_inheritance();
        let mut target = Document::with_version("1.5");
        let parent = target.new_object_id();

        let mut copied = HashMap::new();
        PageCloner::new(&source, &mut copied)
            .clone_page(&mut target, page_id, parent)
            .expect("first clone");
        let after_first = target.objects.len();

        // A different source has its own memo, so everything is copied again.
        let (other_source, other_page) = source_with_inheritance();
        let mut other_copied = HashMap::new();
        PageCloner::new(&other_source, &mut other_copied)
            .clone_page(&mut target, other_page, parent)
            .expect("second clone");
        assert_eq!(target.objects.len(), after_first * 2);

        // Re-cloning through the same memo reuses every dependency.
        let before = target.objects.len();
        PageCloner::new(&source, &mut copied)
            .clone_page(&mut target, page_id, parent)
            .expect("re-clone");
        assert_eq!(target.objects.len(), before);
    }
}
