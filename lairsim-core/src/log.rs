//! The action log: an ordered, indentable, forkable record of what the
//! engine did, with structural merging of consecutive homogeneous
//! entries.
//!
//! Entries are plain data; turning them into text is the presentation
//! layer's job, so the same committed log renders identically every time.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Comment,
    Gather,
    Add,
    Destroy,
    Downgrade,
    Manual,
}

/// One unit batch moved by an entry: source piece name, piece name it
/// arrives as (differs for downgrades and military responses), count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PieceMove {
    pub src: String,
    pub tgt: String,
    pub count: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub kind: ActionKind,
    pub text: Option<String>,
    /// Display name of the source land.
    pub src_land: Option<String>,
    /// Display name of the destination land.
    pub tgt_land: Option<String>,
    /// Intermediate hop lands for multi-hop gathers.
    pub via: Vec<String>,
    pub moves: Vec<PieceMove>,
    /// Per-unit budget cost (hop cost) of this transfer.
    pub mult: i32,
    /// Original CSV row, kept verbatim for manual ledger entries.
    pub csv_row: Option<Vec<String>>,
}

impl LogEntry {
    pub fn comment(text: impl Into<String>) -> Self {
        Self {
            kind: ActionKind::Comment,
            text: Some(text.into()),
            src_land: None,
            tgt_land: None,
            via: Vec::new(),
            moves: Vec::new(),
            mult: 1,
            csv_row: None,
        }
    }

    pub fn action(kind: ActionKind) -> Self {
        Self {
            kind,
            text: None,
            src_land: None,
            tgt_land: None,
            via: Vec::new(),
            moves: Vec::new(),
            mult: 1,
            csv_row: None,
        }
    }

    pub fn total_count(&self) -> i32 {
        self.moves.iter().map(|m| m.count).sum()
    }

    /// Two entries merge when they describe the same action between the
    /// same lands along the same route.
    fn merges_with(&self, other: &Self) -> bool {
        self.kind != ActionKind::Comment
            && self.kind != ActionKind::Manual
            && self.kind == other.kind
            && self.src_land == other.src_land
            && self.tgt_land == other.tgt_land
            && self.via == other.via
            && self.mult == other.mult
    }
}

/// Ordered log with explicit nesting depths.
///
/// Child scopes are created with [`ActionLog::fork`] and folded back in
/// with [`ActionLog::absorb`]; there is no implicit stack.
#[derive(Debug, Clone, Default)]
pub struct ActionLog {
    indent: usize,
    entries: Vec<(usize, LogEntry)>,
}

impl ActionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry at the current depth, merging it into the
    /// previous entry when both describe the same action.
    pub fn push(&mut self, entry: LogEntry) {
        if let Some((depth, last)) = self.entries.last_mut() {
            if *depth == self.indent && last.merges_with(&entry) {
                last.moves.extend(entry.moves);
                return;
            }
        }
        self.entries.push((self.indent, entry));
    }

    pub fn comment(&mut self, text: impl Into<String>) {
        self.push(LogEntry::comment(text));
    }

    /// Run `f` with the log one level deeper.
    pub fn indented<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.indent += 1;
        let out = f(self);
        self.indent -= 1;
        out
    }

    /// Start a child scope one level deeper than this log.
    pub fn fork(&self) -> ActionLog {
        ActionLog {
            indent: self.indent + 1,
            entries: Vec::new(),
        }
    }

    /// Fold a child scope's entries back into this log.
    pub fn absorb(&mut self, child: ActionLog) {
        self.entries.extend(child.entries);
    }

    pub fn entries(&self) -> &[(usize, LogEntry)] {
        &self.entries
    }
}
