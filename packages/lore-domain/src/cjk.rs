/// Unified ideographs in the basic block, the range used for bigram keywords.
pub fn is_han(c: char) -> bool {
	matches!(c as u32, 0x4E00..=0x9FA5)
}
