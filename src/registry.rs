//! Tileset registry - dedup across chunks and global tile-ID assignment
//!
//! Two tileset references are the same tileset when their structural
//! identity matches, even across different source documents. Identity is an
//! explicit value type rather than a serialized string so equality can never
//! depend on field order.

use crate::models::{MapChunk, TilesetRef};
use std::collections::HashMap;

/// Flip flags stored in the top three bits of a global tile ID.
pub const FLIPPED_HORIZONTALLY: u32 = 0x8000_0000;
pub const FLIPPED_VERTICALLY: u32 = 0x4000_0000;
pub const FLIPPED_DIAGONALLY: u32 = 0x2000_0000;

/// Mask selecting the tile ID itself, without flip flags.
pub const GID_MASK: u32 = 0x1FFF_FFFF;
const FLAG_MASK: u32 = !GID_MASK;

/// Structural identity of a tileset, used as the dedup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TilesetKey {
    pub source: Option<String>,
    pub name: Option<String>,
    pub image: Option<String>,
    pub tilewidth: Option<u32>,
    pub tileheight: Option<u32>,
    pub tilecount: Option<u32>,
    pub columns: Option<u32>,
}

impl TilesetKey {
    pub fn of(ts: &TilesetRef) -> Self {
        Self {
            source: ts.source.clone(),
            name: ts.name.clone(),
            image: ts.image.clone(),
            tilewidth: ts.tilewidth,
            tileheight: ts.tileheight,
            tilecount: ts.tilecount,
            columns: ts.columns,
        }
    }
}

/// Per-chunk mapping from old global tile IDs to merged ones.
///
/// Built once per merge and consumed read-only. IDs absent from the map
/// pass through unchanged; flip flags are preserved across the lookup.
#[derive(Debug, Clone, Default)]
pub struct GidRemap {
    map: HashMap<u32, u32>,
}

impl GidRemap {
    fn insert(&mut self, old: u32, new: u32) {
        self.map.insert(old, new);
    }

    /// Remap a raw cell value, carrying its flip flags over.
    pub fn apply(&self, gid: u32) -> u32 {
        let flags = gid & FLAG_MASK;
        let base = gid & GID_MASK;
        let mapped = self.map.get(&base).copied().unwrap_or(base);
        mapped | flags
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }
}

/// Result of merging tilesets across chunks.
#[derive(Debug, Clone)]
pub struct MergedTilesets {
    /// Deduplicated tilesets in first-seen order, renumbered from 1.
    pub tilesets: Vec<TilesetRef>,
    /// One remap per input chunk, in input order.
    pub remaps: Vec<GidRemap>,
}

/// Deduplicate the chunks' tilesets into one global tile-ID space.
///
/// Chunks are processed in input order, and within each chunk tilesets in
/// their listed order; first-seen order determines the merged document's
/// tileset ordering. The `firstgid` counter starts at 1 and advances by the
/// tileset's `tilecount` after each newly registered set. A tileset without
/// `tilecount` contributes no remap entries but still advances the counter
/// by 1, so registered ranges never overlap.
pub fn merge_tilesets(chunks: &[MapChunk]) -> MergedTilesets {
    let mut index_by_key: HashMap<TilesetKey, usize> = HashMap::new();
    let mut tilesets: Vec<TilesetRef> = Vec::new();
    let mut remaps: Vec<GidRemap> = Vec::with_capacity(chunks.len());
    let mut next_firstgid: u32 = 1;

    for chunk in chunks {
        let mut remap = GidRemap::default();

        for ts in &chunk.document.tilesets {
            let key = TilesetKey::of(ts);
            let index = match index_by_key.get(&key) {
                Some(&index) => index,
                None => {
                    let mut global = ts.clone();
                    global.firstgid = next_firstgid;
                    next_firstgid += ts.tilecount.unwrap_or(1).max(1);
                    let index = tilesets.len();
                    index_by_key.insert(key, index);
                    tilesets.push(global);
                    index
                }
            };

            let global_firstgid = tilesets[index].firstgid;
            for local in 0..ts.tilecount.unwrap_or(0) {
                remap.insert(ts.firstgid + local, global_firstgid + local);
            }
        }

        remaps.push(remap);
    }

    MergedTilesets { tilesets, remaps }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MapDocument;

    fn tileset(firstgid: u32, name: &str, tilecount: u32) -> TilesetRef {
        serde_json::from_str(&format!(
            r#"{{"firstgid": {}, "name": "{}", "image": "{}.png",
                "tilewidth": 16, "tileheight": 16, "tilecount": {}, "columns": 2}}"#,
            firstgid, name, name, tilecount
        ))
        .unwrap()
    }

    fn chunk_with_tilesets(id: &str, tilesets: Vec<TilesetRef>) -> MapChunk {
        let mut doc: MapDocument = serde_json::from_str(
            r#"{"width": 4, "height": 4, "tilewidth": 16, "tileheight": 16}"#,
        )
        .unwrap();
        doc.tilesets = tilesets;
        MapChunk::new(id, doc)
    }

    #[test]
    fn test_identical_tilesets_dedup_to_one() {
        let chunks = vec![
            chunk_with_tilesets("a", vec![tileset(1, "terrain", 4)]),
            chunk_with_tilesets("b", vec![tileset(1, "terrain", 4)]),
        ];
        let merged = merge_tilesets(&chunks);
        assert_eq!(merged.tilesets.len(), 1);
        assert_eq!(merged.tilesets[0].firstgid, 1);
        assert_eq!(merged.remaps.len(), 2);
        // Same tileset, same numbering: the remap is the identity
        for gid in 1..=4 {
            assert_eq!(merged.remaps[1].apply(gid), gid);
        }
    }

    #[test]
    fn test_distinct_tilesets_get_disjoint_ranges() {
        let chunks = vec![
            chunk_with_tilesets("a", vec![tileset(1, "terrain", 4)]),
            chunk_with_tilesets("b", vec![tileset(1, "props", 6)]),
        ];
        let merged = merge_tilesets(&chunks);
        assert_eq!(merged.tilesets.len(), 2);
        assert_eq!(merged.tilesets[0].firstgid, 1);
        assert_eq!(merged.tilesets[1].firstgid, 5);
        // Chunk b's local gid 1 (props tile 0) now lives at 5
        assert_eq!(merged.remaps[1].apply(1), 5);
        assert_eq!(merged.remaps[1].apply(6), 10);
    }

    #[test]
    fn test_first_seen_order_is_preserved() {
        let chunks = vec![
            chunk_with_tilesets("a", vec![tileset(1, "zebra", 2), tileset(3, "apple", 2)]),
            chunk_with_tilesets("b", vec![tileset(1, "mango", 2)]),
        ];
        let merged = merge_tilesets(&chunks);
        let names: Vec<_> =
            merged.tilesets.iter().map(|t| t.name.clone().unwrap()).collect();
        assert_eq!(names, ["zebra", "apple", "mango"]);
        assert_eq!(merged.tilesets[2].firstgid, 5);
    }

    #[test]
    fn test_tile_identity_preserved_across_remap() {
        // Chunk b's tileset starts at a different local firstgid
        let chunks = vec![
            chunk_with_tilesets("a", vec![tileset(1, "terrain", 4)]),
            chunk_with_tilesets("b", vec![tileset(7, "props", 6)]),
        ];
        let merged = merge_tilesets(&chunks);
        let props = &merged.tilesets[1];
        for local in 0..6 {
            let old = 7 + local;
            let new = merged.remaps[1].apply(old);
            assert_eq!(new - props.firstgid, old - 7);
        }
    }

    #[test]
    fn test_unmapped_gid_passes_through() {
        let chunks = vec![chunk_with_tilesets("a", vec![tileset(1, "terrain", 4)])];
        let merged = merge_tilesets(&chunks);
        assert_eq!(merged.remaps[0].apply(99), 99);
        assert_eq!(merged.remaps[0].apply(0), 0);
    }

    #[test]
    fn test_flip_flags_survive_remap() {
        let chunks = vec![
            chunk_with_tilesets("a", vec![tileset(1, "terrain", 4)]),
            chunk_with_tilesets("b", vec![tileset(1, "props", 6)]),
        ];
        let merged = merge_tilesets(&chunks);
        let flipped = 2 | FLIPPED_HORIZONTALLY | FLIPPED_DIAGONALLY;
        let out = merged.remaps[1].apply(flipped);
        assert_eq!(out & GID_MASK, 6);
        assert_ne!(out & FLIPPED_HORIZONTALLY, 0);
        assert_ne!(out & FLIPPED_DIAGONALLY, 0);
        assert_eq!(out & FLIPPED_VERTICALLY, 0);
    }

    #[test]
    fn test_missing_tilecount_still_owns_a_range() {
        let mut bare = tileset(1, "mystery", 1);
        bare.tilecount = None;
        let chunks = vec![
            chunk_with_tilesets("a", vec![bare]),
            chunk_with_tilesets("b", vec![tileset(1, "terrain", 4)]),
        ];
        let merged = merge_tilesets(&chunks);
        assert_eq!(merged.tilesets[0].firstgid, 1);
        // The bare tileset reserved one gid; terrain does not collide with it
        assert_eq!(merged.tilesets[1].firstgid, 2);
        assert!(merged.remaps[0].is_empty());
    }

    #[test]
    fn test_differing_tile_size_is_a_different_tileset() {
        let mut other = tileset(1, "terrain", 4);
        other.tilewidth = Some(32);
        other.tileheight = Some(32);
        let chunks = vec![
            chunk_with_tilesets("a", vec![tileset(1, "terrain", 4)]),
            chunk_with_tilesets("b", vec![other]),
        ];
        let merged = merge_tilesets(&chunks);
        assert_eq!(merged.tilesets.len(), 2);
    }
}
