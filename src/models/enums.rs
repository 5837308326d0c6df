use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid {field} value: {value}")]
pub struct InvalidEnum {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = InvalidEnum;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(DeviceStatus {
    Connected => "Connected",
    Disconnected => "Disconnected",
});

str_enum!(PrescriptionStatus {
    Generated => "Generated",
});

str_enum!(LabTestStatus {
    Ordered => "Ordered",
});

str_enum!(AssistantFlow {
    Appointment => "appointment",
    Prescription => "prescription",
    Chat => "chat",
    Insights => "insights",
    TrendSummary => "trend-summary",
});

impl DeviceStatus {
    pub fn toggled(self) -> Self {
        match self {
            DeviceStatus::Connected => DeviceStatus::Disconnected,
            DeviceStatus::Disconnected => DeviceStatus::Connected,
        }
    }
}
