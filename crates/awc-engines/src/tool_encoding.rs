//! Engine-specific tool-permission encoding (spec §4.9).

/// How a given engine expresses "allow these tools" — flag sequences for
/// CLI-style engines, an array for the SDK engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolEncoding {
    /// `--allow-tool <spec>` flags, one per entry, in order.
    CliFlags(Vec<String>),
    /// SDK `available_tools` array. `["*"]` alone means "everything" (spec
    /// §8 invariant: wildcard bash short-circuits to the engine's all-tools
    /// form).
    SdkArray(Vec<String>),
}

impl ToolEncoding {
    pub fn is_wildcard(&self) -> bool {
        match self {
            ToolEncoding::CliFlags(flags) => flags.iter().any(|f| f == "--allow-tool=*"),
            ToolEncoding::SdkArray(arr) => arr.len() == 1 && arr[0] == "*",
        }
    }
}
