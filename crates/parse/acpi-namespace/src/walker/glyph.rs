//! Tree-branch glyphs.
//!
//! Each line is prefixed with one column per ancestor level followed by
//! the branch for its own level. A column is drawn as a continuing line
//! only while that ancestor still has siblings left to print below it.

/// Branch for an entry with more siblings after it.
pub const CONTINUING_BRANCH: &str = "|-- ";
/// Branch for the last entry at its level.
pub const FINAL_BRANCH: &str = "`-- ";
/// Column under an ancestor that has more siblings to come.
pub const CONTINUING_COLUMN: &str = "|   ";
/// Column under an ancestor that was the last at its level.
pub const BLANK_COLUMN: &str = "    ";

fn column(remaining: usize) -> &'static str {
    if remaining > 1 {
        CONTINUING_COLUMN
    } else {
        BLANK_COLUMN
    }
}

/// Builds the prefix for an entry.
///
/// `ancestors` holds the remaining-sibling count of every enclosing level,
/// outermost first, each still counting the ancestor itself. `remaining`
/// is the count at the entry's own level, including the entry.
#[must_use]
pub fn branch_prefix(ancestors: &[usize], remaining: usize) -> String {
    let mut prefix: String = ancestors.iter().map(|&r| column(r)).collect();
    match remaining {
        0 => {}
        1 => prefix.push_str(FINAL_BRANCH),
        _ => prefix.push_str(CONTINUING_BRANCH),
    }
    prefix
}

/// Builds the prefix for extra rows printed beneath an entry, such as a
/// hex dump, so they stay inside the entry's column.
#[must_use]
pub fn continuation_prefix(ancestors: &[usize], remaining: usize) -> String {
    let mut prefix: String = ancestors.iter().map(|&r| column(r)).collect();
    prefix.push_str(column(remaining));
    prefix
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_level_branches() {
        assert_eq!(branch_prefix(&[], 2), "|-- ");
        assert_eq!(branch_prefix(&[], 1), "`-- ");
    }

    #[test]
    fn ancestor_columns() {
        // Parent has a sibling after it; grandparent was last.
        assert_eq!(branch_prefix(&[1, 3], 1), "    |   `-- ");
        assert_eq!(branch_prefix(&[2, 1], 4), "|       |-- ");
    }

    #[test]
    fn continuation_rows() {
        assert_eq!(continuation_prefix(&[2], 2), "|   |   ");
        assert_eq!(continuation_prefix(&[2], 1), "|       ");
    }
}
