// Author: Dustin Pilgrim
// License: MIT

pub fn pluralize(count: usize, word: &str) -> String {
    format!("{} {}{}", count, word, if count != 1 { "s" } else { "" })
}

/// One-line summary printed after a check, e.g. `3 files, 2 errors`.
pub fn format_summary(files: usize, errors: usize) -> String {
    format!("{}, {}", pluralize(files, "file"), pluralize(errors, "error"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_summary() {
        assert_eq!(format_summary(1, 0), "1 file, 0 errors");
        assert_eq!(format_summary(3, 1), "3 files, 1 error");
    }
}
