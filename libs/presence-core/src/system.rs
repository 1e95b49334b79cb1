//! Host-side signals fed into the persona: system state and load metrics

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse health of the host application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemState {
    Stable,
    Processing,
    Warning,
    Danger,
    /// No signal at all; serialized as the string `"null"`
    Null,
    Offline,
}

impl SystemState {
    /// Whole-page intensity used by the visual propagation sink (0-100)
    pub fn intensity(self) -> u8 {
        match self {
            Self::Stable => 50,
            Self::Processing => 75,
            Self::Warning => 85,
            Self::Danger => 95,
            Self::Null => 10,
            Self::Offline => 5,
        }
    }

    /// Wire spelling, also used as the style-variable value
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::Processing => "processing",
            Self::Warning => "warning",
            Self::Danger => "danger",
            Self::Null => "null",
            Self::Offline => "offline",
        }
    }

    /// Map a cognitive load in `[0, 1]` onto a system state
    pub fn from_cognitive_load(load: f64) -> Self {
        if load > 0.8 {
            Self::Danger
        } else if load > 0.6 {
            Self::Warning
        } else {
            Self::Stable
        }
    }
}

impl Default for SystemState {
    fn default() -> Self {
        Self::Stable
    }
}

impl fmt::Display for SystemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SystemState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stable" => Ok(Self::Stable),
            "processing" => Ok(Self::Processing),
            "warning" => Ok(Self::Warning),
            "danger" => Ok(Self::Danger),
            "null" => Ok(Self::Null),
            "offline" => Ok(Self::Offline),
            other => Err(format!("unknown system state: {}", other)),
        }
    }
}

/// Load metrics sent with every `update`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SystemMetrics {
    /// CPU usage percentage
    pub cpu: f64,
    /// Memory usage percentage
    pub memory: f64,
    /// Error count since the previous update
    pub errors: u32,
}

impl SystemMetrics {
    pub fn new(cpu: f64, memory: f64, errors: u32) -> Self {
        Self { cpu, memory, errors }
    }

    /// Metrics implied by a bare cognitive load value
    pub fn for_cognitive_load(load: f64) -> Self {
        Self {
            cpu: load * 100.0,
            memory: 60.0,
            errors: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intensity_table() {
        assert_eq!(SystemState::Stable.intensity(), 50);
        assert_eq!(SystemState::Processing.intensity(), 75);
        assert_eq!(SystemState::Warning.intensity(), 85);
        assert_eq!(SystemState::Danger.intensity(), 95);
        assert_eq!(SystemState::Null.intensity(), 10);
        assert_eq!(SystemState::Offline.intensity(), 5);
    }

    #[test]
    fn test_null_state_serializes_as_string() {
        let json = serde_json::to_string(&SystemState::Null).unwrap();
        assert_eq!(json, "\"null\"");
        let parsed: SystemState = serde_json::from_str("\"null\"").unwrap();
        assert_eq!(parsed, SystemState::Null);
    }

    #[test]
    fn test_cognitive_load_thresholds() {
        assert_eq!(SystemState::from_cognitive_load(0.9), SystemState::Danger);
        assert_eq!(SystemState::from_cognitive_load(0.8), SystemState::Warning);
        assert_eq!(SystemState::from_cognitive_load(0.61), SystemState::Warning);
        assert_eq!(SystemState::from_cognitive_load(0.6), SystemState::Stable);

        let metrics = SystemMetrics::for_cognitive_load(0.5);
        assert_eq!(metrics.cpu, 50.0);
        assert_eq!(metrics.memory, 60.0);
        assert_eq!(metrics.errors, 0);
    }

    #[test]
    fn test_parse_system_state() {
        assert_eq!("Warning".parse::<SystemState>(), Ok(SystemState::Warning));
        assert!("meltdown".parse::<SystemState>().is_err());
    }
}
