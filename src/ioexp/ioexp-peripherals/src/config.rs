use ioexp_core::constants::DEFAULT_ADDRESS;

/// Per-expander settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpanderConfig {
    pub name: String,                     // Worker thread name, also used in logs
    pub address: u8,                      // 7-bit bus address
    pub worker_stack_size: Option<usize>, // None keeps the platform default
}

impl ExpanderConfig {
    pub fn new(name: &str, address: u8) -> Self {
        Self {
            name: name.to_string(),
            address,
            ..Self::default()
        }
    }
}

impl Default for ExpanderConfig {
    fn default() -> Self {
        Self {
            name: "io-expander".to_string(),
            address: DEFAULT_ADDRESS,
            worker_stack_size: None,
        }
    }
}
