use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
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

str_enum!(Sex {
    Female => "female",
    Male => "male",
});

str_enum!(ContraceptiveMethod {
    OralPill => "oral_pill",
    Injectable => "injectable",
    Implant => "implant",
    Iud => "iud",
    Condom => "condom",
    Emergency => "emergency",
    Other => "other",
});

str_enum!(LongActingMethod {
    Implant => "implant",
    Iud => "iud",
});

str_enum!(FollowUpStatus {
    Protected => "protected",
    LostToFollowUp => "lost_to_follow_up",
    Abandoned => "abandoned",
    Discontinued => "discontinued",
    Unclassified => "unclassified",
});

str_enum!(ClinicalDomain {
    FamilyPlanning => "family_planning",
    Obstetric => "obstetric",
    HivCare => "hiv_care",
});

impl ContraceptiveMethod {
    /// The long-acting family this method belongs to, if any.
    pub fn long_acting(&self) -> Option<LongActingMethod> {
        match self {
            Self::Implant => Some(LongActingMethod::Implant),
            Self::Iud => Some(LongActingMethod::Iud),
            _ => None,
        }
    }
}
