//! Split a rendered log into chat-message-sized chunks.
//!
//! The character budget accounts for server emoji tags costing far more
//! once rendered than their text length suggests. Chunks never break in
//! the middle of a second-level bullet, and continuation chunks repeat
//! the toplevel line with a "cont." marker.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Message budget; the real limit is 2000 but a header is prepended.
const MESSAGE_LIMIT: usize = 1900;
/// Rendered width of one `:emoji:` tag beyond its text length.
const EMOJI_COST: usize = 21;

pub struct Splitter {
    entries: Vec<String>,
    toplevel: String,
    cur_length: usize,
    files: Vec<String>,
    force_commit_on_toplevel: bool,
}

impl Splitter {
    pub fn new(force_commit_on_toplevel: bool) -> Self {
        Self {
            entries: Vec::new(),
            toplevel: String::new(),
            cur_length: 0,
            files: Vec::new(),
            force_commit_on_toplevel,
        }
    }

    /// Close the current chunk. `next_nest` is the bullet depth of the
    /// line that triggered the overflow: when it is nested, trailing
    /// second-level bullets move to the next chunk so a sub-list is not
    /// cut mid-way, and the toplevel line is repeated.
    fn commit(&mut self, next_nest: i32) {
        if self.entries.is_empty() {
            return;
        }

        let mut upto = self.entries.len();
        if next_nest > 1 {
            for i in (1..self.entries.len()).rev() {
                if self.entries[i].starts_with("  -") {
                    upto = i;
                    break;
                }
            }
        }
        self.files.push(self.entries[..upto].join("\n"));
        let leftover: Vec<String> = self.entries.split_off(upto);

        self.cur_length = 0;
        self.entries.clear();

        if next_nest > 0 {
            let cont = format!("{} - cont.", self.toplevel);
            self.append(&cont);
        }
        for entry in leftover {
            self.append(&entry);
        }
    }

    /// Ensure every `:emoji:` tag is surrounded by spaces so the chat
    /// renderer picks it up.
    fn space_emojis(line: &str) -> String {
        let mut bytes = line.as_bytes().to_vec();
        let mut idx = 0;
        while let Some(start) = find_byte(&bytes, b':', idx) {
            if start + 1 < bytes.len() && bytes[start + 1] != b' ' {
                let Some(close) = find_byte(&bytes, b':', start + 1) else {
                    break;
                };
                let end = close + 1;
                let after = end < bytes.len() && bytes[end] != b' ';
                let before = start > 0 && bytes[start - 1] != b' ';
                if after {
                    bytes.insert(end, b' ');
                }
                if before {
                    bytes.insert(start, b' ');
                }
                idx = end + usize::from(before) + usize::from(after);
            } else {
                idx = start + 1;
            }
        }
        // Only ASCII spaces were inserted at ASCII boundaries.
        String::from_utf8(bytes).unwrap_or_else(|_| line.to_string())
    }

    pub fn append(&mut self, line: &str) {
        let line = Self::space_emojis(line);
        let real_length = line.len() + 1 + line.matches(':').count() / 2 * EMOJI_COST;
        if self.cur_length + real_length > MESSAGE_LIMIT {
            let nest = line.find('-').unwrap_or(0) as i32 / 2;
            self.commit(nest);
        }
        self.cur_length += real_length;
        self.entries.push(line);
    }

    /// Split `log` into `msgNN.md` files under `directory`, each headed
    /// by `"{prefix} [i/n]{suffix}"`.
    pub fn run(mut self, log: &str, directory: &Path, prefix: &str, suffix: &str) -> Result<()> {
        if directory.exists() {
            fs::remove_dir_all(directory)
                .with_context(|| format!("clearing {}", directory.display()))?;
        }
        fs::create_dir_all(directory)
            .with_context(|| format!("creating {}", directory.display()))?;

        for line in log.lines() {
            if line.starts_with('-') {
                self.toplevel = crate::render::cut_toplevel(line).to_string();
                if self.force_commit_on_toplevel {
                    self.commit(0);
                }
            }
            self.append(line);
        }
        self.commit(-1);

        let total = self.files.len();
        for (i, content) in self.files.iter().enumerate() {
            let path = directory.join(format!("msg{:02}.md", i + 1));
            let text = format!("{} [{}/{}]{}\n{}", prefix, i + 1, total, suffix, content);
            fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
        }
        Ok(())
    }
}

fn find_byte(haystack: &[u8], needle: u8, from: usize) -> Option<usize> {
    haystack[from.min(haystack.len())..]
        .iter()
        .position(|&b| b == needle)
        .map(|i| i + from)
}
