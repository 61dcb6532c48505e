//! Moisture probe calibration.
//!
//! Capacitive probes read high when dry and low when wet.

/// Moisture probe selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    M1,
    M2,
}

impl Probe {
    /// Both probes, in order
    pub const ALL: [Probe; 2] = [Probe::M1, Probe::M2];

    /// Parse the console name (`M1` / `M2`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "M1" => Some(Probe::M1),
            "M2" => Some(Probe::M2),
            _ => None,
        }
    }

    /// Index into per-probe tables
    pub fn index(self) -> usize {
        match self {
            Probe::M1 => 0,
            Probe::M2 => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Probe::M1 => "M1",
            Probe::M2 => "M2",
        }
    }
}

/// Raw ADC endpoints of one probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calibration {
    /// Reading in dry soil (0%).
    pub dry: u16,
    /// Reading in saturated soil (100%).
    pub wet: u16,
}

impl Calibration {
    /// Valid if dry reads strictly above wet
    pub fn is_valid(&self) -> bool {
        self.dry > self.wet
    }
}

/// Convert a raw reading to percent moisture.
pub fn moisture_pct(raw: u16, cal: Calibration) -> u8 {
    if raw >= cal.dry {
        return 0;
    }
    if raw <= cal.wet {
        return 100;
    }
    let span = u32::from(cal.dry - cal.wet);
    (100 * u32::from(cal.dry - raw) / span) as u8
}
