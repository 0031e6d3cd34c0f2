use crate::chunk::{BoundingBox, Chunk, ChunkIndex};

/// Ticket handed out for every chunk load; only the newest one may land.
pub type LoadTicket = u64;

/// Chunk list of the active document.
///
/// Owns exactly one list at a time. A successful load swaps the whole list
/// in one step; a failed load leaves it alone and the owner decides whether
/// to [`clear`](ChunkStore::clear) it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChunkStore {
    doc_id: Option<String>,
    chunks: Vec<Chunk>,
    last_ticket: LoadTicket,
}

impl ChunkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a ticket for a new load. Earlier tickets become stale.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.last_ticket += 1;
        self.last_ticket
    }

    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        ticket == self.last_ticket
    }

    /// Replace the list if `ticket` is still current. Returns whether it landed.
    pub fn complete_load(&mut self, ticket: LoadTicket, doc_id: &str, chunks: Vec<Chunk>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.doc_id = Some(doc_id.to_string());
        self.chunks = chunks;
        true
    }

    pub fn clear(&mut self) {
        self.doc_id = None;
        self.chunks.clear();
    }

    /// Document whose chunks are currently held.
    pub fn doc_id(&self) -> Option<&str> {
        self.doc_id.as_deref()
    }

    pub fn holds(&self, doc_id: &str) -> bool {
        self.doc_id() == Some(doc_id)
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn get(&self, index: ChunkIndex) -> Option<&Chunk> {
        self.chunks.get(index)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Linear lookup of a chunk key in the current list.
    pub fn index_of(&self, key: &str) -> Option<ChunkIndex> {
        self.chunks.iter().position(|chunk| chunk.key == key)
    }

    /// Chunks that can be drawn as overlays on `page` (0-indexed).
    pub fn overlays_on_page(
        &self,
        page: u32,
    ) -> impl Iterator<Item = (ChunkIndex, BoundingBox)> + '_ {
        self.chunks
            .iter()
            .enumerate()
            .filter_map(move |(index, chunk)| match chunk.overlay() {
                Some((chunk_page, bbox)) if chunk_page == page => Some((index, bbox)),
                _ => None,
            })
    }

    /// Highest grounded page + 1, or 0 when nothing is grounded.
    pub fn grounded_page_span(&self) -> u32 {
        self.chunks
            .iter()
            .filter_map(Chunk::page)
            .max()
            .map_or(0, |page| page.saturating_add(1))
    }
}
