use std::fmt::{self, Display, Formatter};

/// Describes the git object types this tool materializes (blob or tree).
/// We use the word `kind` here to avoid conflict with the Rust reserved word `type`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Kind {
    Blob,
    Tree,
}

impl Kind {
    /// Returns the name used in the object header (`blob` or `tree`).
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Blob => "blob",
            Kind::Tree => "tree",
        }
    }
}

impl Display for Kind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
