//! IEEE 488.2 common commands.

/// Identification
pub const IDN: &str = "*IDN";
/// Reset
pub const RST: &str = "*RST";
/// Clear status
pub const CLS: &str = "*CLS";
/// Operation complete
pub const OPC: &str = "*OPC";
/// Wait to complete
pub const WAI: &str = "*WAI";
/// Self-test
pub const TST: &str = "*TST";
/// Event status enable
pub const ESE: &str = "*ESE";
/// Event status register
pub const ESR: &str = "*ESR";
/// Service request enable
pub const SRE: &str = "*SRE";
/// Read status byte
pub const STB: &str = "*STB";
