//! Copying pages between lopdf documents.
//!
//! Pages are deep-copied together with every object they reference, with
//! object ids remapped into the output document. The source page tree is
//! never copied: each page is re-parented under a fresh `/Pages` root and
//! the inheritable attributes it relied on are written onto the page itself.

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::collections::{HashMap, VecDeque};
use std::io::{Read, Write};

/// Page attributes a page may inherit from its ancestors in the page tree
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic `/Parent` chains in broken files
const MAX_TREE_DEPTH: usize = 256;

/// Builds an output document one page at a time
pub struct OutputBuilder {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
    /// Source object id -> output object id
    id_map: HashMap<ObjectId, ObjectId>,
    /// Objects allocated in the output but not yet filled in
    pending: VecDeque<(ObjectId, ObjectId)>,
}

impl OutputBuilder {
    /// Create an empty output for `source`.
    ///
    /// Output ids are reserved for every source page up front so that
    /// references between pages (link annotations, destinations) resolve
    /// to the copied page regardless of the order pages are added in.
    pub fn for_source(source: &Document) -> Self {
        let mut doc = Document::with_version(source.version.clone());
        let pages_id = doc.new_object_id();

        let mut id_map = HashMap::new();
        for page_id in source.get_pages().into_values() {
            id_map.insert(page_id, doc.new_object_id());
        }

        let mut builder = OutputBuilder {
            doc,
            pages_id,
            kids: Vec::new(),
            id_map,
            pending: VecDeque::new(),
        };

        if let Ok(info) = source.trailer.get(b"Info") {
            let info = builder.map_object(source, info);
            builder.drain_pending(source);
            if !info.is_null() {
                builder.doc.trailer.set("Info", info);
            }
        }

        builder
    }

    /// Copy page `page_id` of `source` to the end of the output and
    /// recompress its content streams at `level`.
    pub fn add_page(&mut self, source: &Document, page_id: ObjectId, level: Compression) -> lopdf::Result<ObjectId> {
        let page = source.get_dictionary(page_id)?;

        let new_id = match self.id_map.get(&page_id) {
            Some(id) => *id,
            None => {
                let id = self.doc.new_object_id();
                self.id_map.insert(page_id, id);
                id
            }
        };

        let mut copied = Dictionary::new();
        for (key, value) in page.iter() {
            if key.as_slice() == b"Parent" {
                continue;
            }
            let value = self.map_object(source, value);
            copied.set(key.clone(), value);
        }

        for key in INHERITABLE_KEYS {
            if copied.has(key) {
                continue;
            }
            if let Some(value) = inherited_attribute(source, page, key) {
                let value = self.map_object(source, &value);
                copied.set(key.to_vec(), value);
            }
        }

        copied.set("Parent", self.pages_id);
        self.doc.objects.insert(new_id, Object::Dictionary(copied));
        self.kids.push(Object::Reference(new_id));

        self.drain_pending(source);
        self.recompress_contents(new_id, level);

        Ok(new_id)
    }

    /// Close the page tree and hand out the finished document.
    pub fn into_document(mut self) -> Document {
        let count = self.kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => self.kids,
                "Count" => count,
            }),
        );

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        log::debug!("Output document holds {} objects", self.doc.objects.len());
        self.doc
    }

    /// Translate a source object into the output, allocating ids for any
    /// references it holds. Referenced objects are queued, not copied here.
    fn map_object(&mut self, source: &Document, object: &Object) -> Object {
        match object {
            Object::Reference(id) => self.map_reference(source, *id),
            Object::Array(items) => Object::Array(items.iter().map(|item| self.map_object(source, item)).collect()),
            Object::Dictionary(dict) => Object::Dictionary(self.map_dictionary(source, dict)),
            Object::Stream(stream) => {
                let mut copied = stream.clone();
                copied.dict = self.map_dictionary(source, &stream.dict);
                Object::Stream(copied)
            }
            other => other.clone(),
        }
    }

    fn map_dictionary(&mut self, source: &Document, dict: &Dictionary) -> Dictionary {
        let mut copied = Dictionary::new();
        for (key, value) in dict.iter() {
            let value = self.map_object(source, value);
            copied.set(key.clone(), value);
        }
        copied
    }

    fn map_reference(&mut self, source: &Document, id: ObjectId) -> Object {
        if let Some(new_id) = self.id_map.get(&id) {
            return Object::Reference(*new_id);
        }

        let object = match source.get_object(id) {
            Ok(object) => object,
            Err(_) => {
                log::debug!("Dropping dangling reference {:?}", id);
                return Object::Null;
            }
        };

        // Pulling in a page tree node would drag the whole source tree along
        if is_page_tree_node(object) {
            return Object::Null;
        }

        let new_id = self.doc.new_object_id();
        self.id_map.insert(id, new_id);
        self.pending.push_back((id, new_id));
        Object::Reference(new_id)
    }

    fn drain_pending(&mut self, source: &Document) {
        while let Some((source_id, new_id)) = self.pending.pop_front() {
            let copied = match source.get_object(source_id) {
                Ok(object) => self.map_object(source, object),
                Err(_) => Object::Null,
            };
            self.doc.objects.insert(new_id, copied);
        }
    }

    fn recompress_contents(&mut self, page_id: ObjectId, level: Compression) {
        let content_ids: Vec<ObjectId> = match self.doc.get_dictionary(page_id).and_then(|page| page.get(b"Contents")) {
            Ok(Object::Reference(id)) => vec![*id],
            Ok(Object::Array(items)) => items.iter().filter_map(|item| item.as_reference().ok()).collect(),
            _ => Vec::new(),
        };

        for id in content_ids {
            if let Some(Object::Stream(stream)) = self.doc.objects.get_mut(&id) {
                let before = stream.content.len();
                if recompress_stream(stream, level) {
                    log::debug!("Content stream {:?}: {} -> {} bytes", id, before, stream.content.len());
                }
            }
        }
    }
}

fn is_page_tree_node(object: &Object) -> bool {
    match object {
        Object::Dictionary(dict) => matches!(dict.get(b"Type").and_then(Object::as_name), Ok(name) if name == b"Pages"),
        _ => false,
    }
}

/// Look up an inheritable attribute on the ancestors of `page`
fn inherited_attribute(source: &Document, page: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut depth = 0;

    while let Some(id) = parent {
        if depth >= MAX_TREE_DEPTH {
            log::warn!("Page tree deeper than {} levels, giving up on inherited attributes", MAX_TREE_DEPTH);
            return None;
        }
        let node = source.get_dictionary(id).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
        depth += 1;
    }

    None
}

/// Filter names declared on a stream, in decode order
fn stream_filters(stream: &Stream) -> Vec<String> {
    match stream.dict.get(b"Filter") {
        Ok(Object::Name(n)) => vec![String::from_utf8_lossy(n).to_string()],
        Ok(Object::Array(arr)) => arr
            .iter()
            .filter_map(|f| match f {
                Object::Name(n) => Some(String::from_utf8_lossy(n).to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Re-encode a stream with Flate at `level`.
///
/// Only unfiltered and plain Flate streams are touched; streams with other
/// filters or with `/DecodeParms` are left as-is, as are Flate streams that
/// do not inflate cleanly. The new encoding is kept only when it is smaller
/// than the current one. Returns whether the stream was replaced.
pub fn recompress_stream(stream: &mut Stream, level: Compression) -> bool {
    if stream.dict.has(b"DecodeParms") {
        return false;
    }

    let filters = stream_filters(stream);
    let plain = match filters.as_slice() {
        [] => stream.content.clone(),
        [only] if only == "FlateDecode" => {
            let mut decoder = ZlibDecoder::new(&stream.content[..]);
            let mut decoded = Vec::new();
            if let Err(e) = decoder.read_to_end(&mut decoded) {
                log::warn!("Leaving undecodable content stream as-is: {}", e);
                return false;
            }
            decoded
        }
        _ => return false,
    };

    let mut encoder = ZlibEncoder::new(Vec::new(), level);
    if let Err(e) = encoder.write_all(&plain) {
        log::warn!("Flate encoding failed: {}", e);
        return false;
    }
    let encoded = match encoder.finish() {
        Ok(data) => data,
        Err(e) => {
            log::warn!("Flate encoding failed: {}", e);
            return false;
        }
    };

    if encoded.len() >= stream.content.len() {
        return false;
    }

    stream.dict.set("Filter", "FlateDecode");
    stream.set_content(encoded);
    true
}
