// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Opaque bearer tokens for authentication sessions.

/// Generates a cryptographically secure random session token.
pub fn generate_session_token() -> String {
	use rand::Rng;
	let mut rng = rand::thread_rng();
	let bytes: [u8; 32] = rng.gen();
	hex::encode(bytes)
}

/// SHA-256 hex digest of a token. Only the digest is ever stored.
pub fn hash_token(token: &str) -> String {
	use sha2::{Digest, Sha256};
	let mut hasher = Sha256::new();
	hasher.update(token.as_bytes());
	hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn tokens_are_64_hex_chars() {
		let token = generate_session_token();
		assert_eq!(token.len(), 64);
		assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
	}

	#[test]
	fn tokens_are_unique() {
		assert_ne!(generate_session_token(), generate_session_token());
	}

	#[test]
	fn hash_is_deterministic() {
		assert_eq!(hash_token("abc"), hash_token("abc"));
		assert_ne!(hash_token("abc"), hash_token("abd"));
		assert_eq!(
			hash_token("abc"),
			"ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
		);
	}
}
