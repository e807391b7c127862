//! Byte-offset to 1-indexed line number lookup, built once per file and
//! reused for every span produced while walking that file's tree.

pub struct LineIndex {
    /// Byte offset of the first byte of each line. `line_starts[0] == 0`.
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts }
    }

    /// 1-indexed line number containing `byte_offset`.
    pub fn line_of(&self, byte_offset: usize) -> u32 {
        match self.line_starts.binary_search(&byte_offset) {
            Ok(idx) => idx as u32 + 1,
            Err(idx) => idx as u32,
        }
    }

    pub fn line_count(&self) -> u32 {
        self.line_starts.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line_file() {
        let idx = LineIndex::new("class Foo {}");
        assert_eq!(idx.line_of(0), 1);
        assert_eq!(idx.line_of(11), 1);
    }

    #[test]
    fn multi_line_offsets() {
        let src = "a\nbb\nccc\n";
        let idx = LineIndex::new(src);
        assert_eq!(idx.line_of(0), 1); // 'a'
        assert_eq!(idx.line_of(2), 2); // 'b'
        assert_eq!(idx.line_of(5), 3); // 'c'
    }

    #[test]
    fn line_count_matches_newlines_plus_one() {
        let idx = LineIndex::new("a\nb\nc");
        assert_eq!(idx.line_count(), 3);
    }
}
