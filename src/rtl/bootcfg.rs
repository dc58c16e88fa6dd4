/*
 * Copyright 2026 The Boron Project
 *
 * This file is part of Boron.
 *
 * Boron is free software: you can redistribute it and/or modify it under the
 * terms of the GNU General Public License as published by the Free Software
 * Foundation, either version 3 of the License, or (at your option) any later
 * version.
 *
 * Boron is distributed in the hope that it will be useful, but WITHOUT ANY
 * WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR
 * A PARTICULAR PURPOSE. See the GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License along with
 * Boron. If not, see <https://www.gnu.org/licenses/>.
 */

//! Boot command-line parsing.
//!
//! **[ADDED]** — this feature is not named by the distilled spec, but
//! `original_source/boron/source/ex/bootcfg.c` implements it and `ps::init`
//! depends on the `Root=`/`Init=` keys it parses, so it is carried forward
//! as a supplement (see `SPEC_FULL.md` section 2).
//!
//! Grammar, transcribed from the original comment block:
//!
//! ```text
//! Root=/Mount/Nvme0Disk1Part0
//! Root="/Mount/Nvme0Disk1Part0"
//! Root="/Mount/Nvme0Disk1Part0/My Folder"
//! Root=/Mount/Nvme0Disk1Part0/My\ Folder
//! SomeFlag                      -- a key with no '=' gets the value "yes"
//! ```
//!
//! Unlike the original (a fixed-size scratch buffer plus a crash on
//! overflow or malformed quoting), this returns a `Result` so a malformed
//! command line is reported as [`Status::InvalidParameter`] instead of
//! taking down the kernel during early bring-up.

use crate::status::{EResult, Status};
use alloc::collections::BTreeMap;
use alloc::string::String;

/// The value assigned to a key with no `=` (spec: "yes" will be assigned
/// to any key without an equals symbol").
pub const CONFIG_YES: &str = "yes";

/// A parsed boot command line: an ordered map from key to value.
#[derive(Debug, Default)]
pub struct BootConfig {
	entries: BTreeMap<String, String>,
}

impl BootConfig {
	/// Parses `line` according to the grammar above.
	pub fn parse(line: &str) -> EResult<Self> {
		let mut entries = BTreeMap::new();
		let bytes = line.as_bytes();
		let mut i = 0;
		while i < bytes.len() {
			while i < bytes.len() && bytes[i] == b' ' {
				i += 1;
			}
			if i >= bytes.len() {
				break;
			}
			let key_start = i;
			while i < bytes.len() && bytes[i] != b'=' && bytes[i] != b' ' {
				i += 1;
			}
			let key = core::str::from_utf8(&bytes[key_start..i]).map_err(|_| Status::InvalidParameter)?;
			if i >= bytes.len() || bytes[i] == b' ' {
				entries.insert(String::from(key), String::from(CONFIG_YES));
				if i < bytes.len() {
					i += 1;
				}
				continue;
			}
			// bytes[i] == b'='
			i += 1;
			let mut value = String::new();
			loop {
				if i >= bytes.len() {
					return Err(Status::InvalidParameter);
				}
				match bytes[i] {
					b'\\' => {
						i += 1;
						if i >= bytes.len() {
							return Err(Status::InvalidParameter);
						}
						value.push(bytes[i] as char);
						i += 1;
					}
					q @ (b'"' | b'\'') => {
						i += 1;
						let mut closed = false;
						while i < bytes.len() {
							if bytes[i] == q {
								closed = true;
								i += 1;
								break;
							}
							value.push(bytes[i] as char);
							i += 1;
						}
						if !closed {
							return Err(Status::InvalidParameter);
						}
					}
					b' ' => {
						i += 1;
						break;
					}
					c => {
						value.push(c as char);
						i += 1;
					}
				}
				if i >= bytes.len() {
					break;
				}
			}
			entries.insert(String::from(key), value);
		}
		Ok(Self { entries })
	}

	/// Returns the value for `key`, or `default` if unset.
	pub fn get<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
		self.entries.get(key).map(String::as_str).unwrap_or(default)
	}

	/// Returns whether `key` is present at all (set to any value,
	/// including the implicit `"yes"`).
	pub fn is_set(&self, key: &str) -> bool {
		self.entries.contains_key(key)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn plain_and_quoted_and_escaped() {
		let cfg = BootConfig::parse(
			r#"Root=/Mount/Nvme0Disk1Part0 Init="/Root/Init.exe" Label=My\ Folder Verbose"#,
		)
		.unwrap();
		assert_eq!(cfg.get("Root", ""), "/Mount/Nvme0Disk1Part0");
		assert_eq!(cfg.get("Init", ""), "/Root/Init.exe");
		assert_eq!(cfg.get("Label", ""), "My Folder");
		assert_eq!(cfg.get("Verbose", ""), CONFIG_YES);
		assert!(cfg.is_set("Verbose"));
		assert!(!cfg.is_set("Nonexistent"));
	}

	#[test]
	fn unterminated_quote_is_an_error() {
		assert!(BootConfig::parse(r#"Root="/unterminated"#).is_err());
	}

	#[test]
	fn trailing_backslash_is_an_error() {
		assert!(BootConfig::parse("Root=/a\\").is_err());
	}

	#[test]
	fn empty_line_parses_to_nothing() {
		let cfg = BootConfig::parse("   ").unwrap();
		assert_eq!(cfg.iter().count(), 0);
	}
}
