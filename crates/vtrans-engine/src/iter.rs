// crates/vtrans-engine/src/iter.rs
//
// Traversal helpers over the stream graph. spec.md §3 fixes `(file_index,
// index)` lexicographic order as the contract every iterator, chooser, and
// packet-routing table relies on; `StreamId`'s derived `Ord` already sorts
// that way, so these just walk the nested `Vec<File>.streams` arrays in the
// order they're stored (construction always appends, never reorders).

use vtrans_core::{InputFile, InputStream, OutputFile, OutputStream, StreamId};

/// Every `InputStream` across every `InputFile`, in `(file_index, index)` order.
pub fn ist_iter(files: &[InputFile]) -> impl Iterator<Item = &InputStream> {
    files.iter().flat_map(|f| f.streams.iter())
}

/// Every `OutputStream` across every `OutputFile`, in `(file_index, index)` order.
pub fn ost_iter(files: &[OutputFile]) -> impl Iterator<Item = &OutputStream> {
    files.iter().flat_map(|f| f.streams.iter())
}

/// Mutable variant of [`ost_iter`].
pub fn ost_iter_mut(files: &mut [OutputFile]) -> impl Iterator<Item = &mut OutputStream> {
    files.iter_mut().flat_map(|f| f.streams.iter_mut())
}

pub fn find_ist<'a>(files: &'a [InputFile], id: StreamId) -> Option<&'a InputStream> {
    files.get(id.file_index)?.streams.get(id.index)
}

pub fn find_ist_mut<'a>(files: &'a mut [InputFile], id: StreamId) -> Option<&'a mut InputStream> {
    files.get_mut(id.file_index)?.streams.get_mut(id.index)
}

pub fn find_ost<'a>(files: &'a [OutputFile], id: StreamId) -> Option<&'a OutputStream> {
    files.get(id.file_index)?.streams.get(id.index)
}

pub fn find_ost_mut<'a>(files: &'a mut [OutputFile], id: StreamId) -> Option<&'a mut OutputStream> {
    files.get_mut(id.file_index)?.streams.get_mut(id.index)
}
