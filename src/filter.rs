use crate::source::SeqRecord;

/// Length filter: keep a record iff its sequence is at least `min_len` long.
/// A `min_len` of zero or below keeps everything.
pub fn keep(record: &SeqRecord, min_len: i64) -> bool {
    match usize::try_from(min_len) {
        Ok(min) => record.sequence.len() >= min,
        Err(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(len: usize) -> SeqRecord {
        SeqRecord::from_header(b"r", vec![b'A'; len], None)
    }

    #[test]
    fn boundary_is_inclusive() {
        assert!(keep(&rec(5), 5));
        assert!(!keep(&rec(4), 5));
        assert!(keep(&rec(6), 5));
    }

    #[test]
    fn non_positive_min_len_keeps_all() {
        assert!(keep(&rec(0), 0));
        assert!(keep(&rec(0), -10));
        assert!(keep(&rec(3), i64::MIN));
    }
}
