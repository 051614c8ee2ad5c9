//! Offline feature-hashing embedder.
//!
//! Words (ASCII alphanumeric runs, lower-cased) and overlapping ideograph bigrams are hashed with
//! BLAKE3 into signed buckets, and the result is L2-normalised. Identical input always maps to an
//! identical vector, which makes this embedder usable in tests and air-gapped setups.

use lore_domain::cjk;

#[derive(Debug, Clone)]
pub struct HashEmbedder {
	dimensions: usize,
}

impl HashEmbedder {
	pub fn new(dimensions: usize) -> Self {
		Self { dimensions: dimensions.max(1) }
	}

	pub fn embed(&self, text: &str) -> Vec<f32> {
		let mut vec = vec![0.0_f32; self.dimensions];

		for feature in features(text) {
			let hash = blake3::hash(feature.as_bytes());
			let bytes = hash.as_bytes();
			let mut bucket = [0_u8; 8];

			bucket.copy_from_slice(&bytes[..8]);

			let index = (u64::from_le_bytes(bucket) % self.dimensions as u64) as usize;
			let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };

			vec[index] += sign;
		}

		let norm = vec.iter().map(|v| v * v).sum::<f32>().sqrt();

		if norm > 0.0 {
			for value in &mut vec {
				*value /= norm;
			}
		}

		vec
	}
}

fn features(text: &str) -> Vec<String> {
	let mut out = Vec::new();
	let mut word = String::new();
	let mut han: Vec<char> = Vec::new();

	for ch in text.chars() {
		if ch.is_ascii_alphanumeric() {
			word.push(ch.to_ascii_lowercase());
		} else if !word.is_empty() {
			out.push(std::mem::take(&mut word));
		}

		if cjk::is_han(ch) {
			han.push(ch);
		} else {
			flush_han(&mut han, &mut out);
		}
	}

	if !word.is_empty() {
		out.push(word);
	}

	flush_han(&mut han, &mut out);

	out
}

fn flush_han(run: &mut Vec<char>, out: &mut Vec<String>) {
	match run.len() {
		0 => {},
		1 => out.push(run[0].to_string()),
		_ =>
			for pair in run.windows(2) {
				out.push(pair.iter().collect());
			},
	}

	run.clear();
}
