/// Describes the file type as represented in a tree object.
///
/// Git uses a variation on the Unix file permissions flags to denote a file's
/// intended type on disk. The following values are recognized:
///
/// * `0o100644` - normal file
/// * `0o100755` - executable file
/// * `0o120000` - symbolic link
/// * `0o040000` - tree (subdirectory)
/// * `0o160000` - submodule (aka gitlink)
///
/// Tree entries carry the raw integer so that unrecognized modes are still
/// re-emitted unchanged.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FileMode {
    Normal,
    Executable,
    SymbolicLink,
    Tree,
    Submodule,
}

impl FileMode {
    /// Convert from git file-mode integer to `FileMode` enum.
    ///
    /// Returns `None` if the value is not one of the recognized constants.
    pub fn from_value(value: u32) -> Option<FileMode> {
        match value {
            0o100644 => Some(FileMode::Normal),
            0o100755 => Some(FileMode::Executable),
            0o120000 => Some(FileMode::SymbolicLink),
            0o040000 => Some(FileMode::Tree),
            0o160000 => Some(FileMode::Submodule),
            _ => None,
        }
    }

    /// Convert from `FileMode` enum to git file-mode integer.
    pub fn to_value(self) -> u32 {
        match self {
            FileMode::Normal => 0o100644,
            FileMode::Executable => 0o100755,
            FileMode::SymbolicLink => 0o120000,
            FileMode::Tree => 0o040000,
            FileMode::Submodule => 0o160000,
        }
    }
}

/// Parse the octal text form of a mode (`"100644"`, `"040000"`).
///
/// Returns `None` for empty input, non-octal digits, or values that
/// don't fit in 32 bits.
pub fn parse_octal(text: &str) -> Option<u32> {
    if text.is_empty() || !text.bytes().all(|b| (b'0'..=b'7').contains(&b)) {
        return None;
    }

    u32::from_str_radix(text, 8).ok()
}

/// Returns true if the raw mode denotes a subdirectory.
pub fn is_tree(mode: u32) -> bool {
    FileMode::from_value(mode) == Some(FileMode::Tree)
}

/// Returns true if the raw mode denotes a submodule (gitlink).
pub fn is_submodule(mode: u32) -> bool {
    FileMode::from_value(mode) == Some(FileMode::Submodule)
}
