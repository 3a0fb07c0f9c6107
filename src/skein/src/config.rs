use bitflags::bitflags;

bitflags! {
    /// Engine-wide switches that influence the produced documents.
    #[derive(Default)]
    pub struct SerializerFlags: u32 {
        /// Indents the output with four spaces per nesting level.
        ///
        /// This only affects whitespace and has no effect on how
        /// documents are read.
        const PRETTY_PRINT = 1 << 0;
        /// Writes every shared object once and refers back to it
        /// with `$ref` markers on repeated occurrences.
        ///
        /// When unset, `$ref` markers are ignored on reading.
        const PRESERVE_REFERENCES = 1 << 1;
    }
}

/// Serializer configuration.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// The [`SerializerFlags`] to use.
    pub flags: SerializerFlags,
    /// The maximum nesting depth of composite values on writing.
    ///
    /// This turns a cyclic graph written without reference
    /// preservation into an error rather than a stack overflow.
    pub recursion_limit: u32,
}

impl Config {
    /// Whether reference preservation is enabled.
    #[inline]
    pub fn preserve_references(&self) -> bool {
        self.flags.contains(SerializerFlags::PRESERVE_REFERENCES)
    }

    /// Whether pretty printing is enabled.
    #[inline]
    pub fn pretty_print(&self) -> bool {
        self.flags.contains(SerializerFlags::PRETTY_PRINT)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            flags: SerializerFlags::empty(),
            recursion_limit: 128,
        }
    }
}
