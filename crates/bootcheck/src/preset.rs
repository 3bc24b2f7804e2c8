//! Named check configurations for the emulator's boot tests.

use std::path::PathBuf;

use bootcheck_trace::TraceConfig;

/// A stock boot check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Full register dump of the boot ROM, first 501 instructions.
    BootRegs,
    /// Per-instruction boot states; the first record is logged before the
    /// stub attaches and is skipped.
    BootStates,
}

impl Preset {
    pub const fn trace_path(self) -> &'static str {
        match self {
            Self::BootRegs => "golden_regs.csv",
            Self::BootStates => "tests/golden_files/boot_states.txt",
        }
    }

    pub const fn trace_config(self) -> TraceConfig {
        match self {
            Self::BootRegs => TraceConfig::new(0, Some(501)),
            Self::BootStates => TraceConfig::new(1, Some(50)),
        }
    }
}

/// Values that may override a preset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub trace_path: Option<PathBuf>,
    pub skip_count: Option<usize>,
    pub max_records: Option<usize>,
}

/// Combine an optional preset with explicit values; explicit values win.
///
/// Returns `None` if neither names a trace file.
pub fn resolve(preset: Option<Preset>, overrides: Overrides) -> Option<(PathBuf, TraceConfig)> {
    let base = preset.map(Preset::trace_config).unwrap_or_default();
    let trace_path = overrides
        .trace_path
        .or_else(|| preset.map(|p| PathBuf::from(p.trace_path())))?;

    let config = TraceConfig {
        skip_count: overrides.skip_count.unwrap_or(base.skip_count),
        max_records: overrides.max_records.or(base.max_records),
    };
    Some((trace_path, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_values() {
        let (path, config) = resolve(Some(Preset::BootStates), Overrides::default()).unwrap();
        assert_eq!(path, PathBuf::from("tests/golden_files/boot_states.txt"));
        assert_eq!(config, TraceConfig::new(1, Some(50)));

        let (path, config) = resolve(Some(Preset::BootRegs), Overrides::default()).unwrap();
        assert_eq!(path, PathBuf::from("golden_regs.csv"));
        assert_eq!(config, TraceConfig::new(0, Some(501)));
    }

    #[test]
    fn test_overrides_win() {
        let overrides = Overrides {
            trace_path: Some(PathBuf::from("other.txt")),
            skip_count: Some(0),
            max_records: None,
        };
        let (path, config) = resolve(Some(Preset::BootStates), overrides).unwrap();
        assert_eq!(path, PathBuf::from("other.txt"));
        assert_eq!(config, TraceConfig::new(0, Some(50)));
    }

    #[test]
    fn test_no_preset_needs_trace() {
        assert_eq!(resolve(None, Overrides::default()), None);
        let overrides = Overrides {
            trace_path: Some(PathBuf::from("t.txt")),
            ..Overrides::default()
        };
        assert_eq!(
            resolve(None, overrides),
            Some((PathBuf::from("t.txt"), TraceConfig::default()))
        );
    }
}
