//! Identity Rewriter: synthetic headers and the original header they replace.

use crate::source::SeqRecord;

/// `<annotation>___seq_<ordinal>`. `ordinal` is 1-based.
pub fn synthetic_header(annotation: &str, ordinal: u64) -> String {
    format!("{annotation}___seq_{ordinal}")
}

/// `name`, or `name comment` when the record has a comment.
pub fn original_header(record: &SeqRecord) -> Vec<u8> {
    match &record.comment {
        Some(comment) => {
            let mut header = Vec::with_capacity(record.name.len() + 1 + comment.len());
            header.extend_from_slice(&record.name);
            header.push(b' ');
            header.extend_from_slice(comment);
            header
        }
        None => record.name.clone(),
    }
}

/// Both headers of a kept record. `kept_ordinal` is the 0-based position
/// of the record among kept records.
pub fn rewrite(record: &SeqRecord, annotation: &str, kept_ordinal: u64) -> (String, Vec<u8>) {
    (
        synthetic_header(annotation, kept_ordinal + 1),
        original_header(record),
    )
}
