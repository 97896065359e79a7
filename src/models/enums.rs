//! Closed string enums persisted as VARCHAR columns.

use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::str::FromStr;

macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, AsExpression, FromSqlRow)]
        #[diesel(sql_type = Text)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!("Invalid {} '{}'", stringify!($name), other)),
                }
            }
        }

        impl ToSql<Text, Pg> for $name {
            fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
                out.write_all(self.as_str().as_bytes())?;
                Ok(IsNull::No)
            }
        }

        impl FromSql<Text, Pg> for $name {
            fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
                let raw = std::str::from_utf8(bytes.as_bytes())?;
                raw.parse::<$name>().map_err(Into::into)
            }
        }
    };
}

text_enum! {
    /// Ordered so that `Admin > Manager > User`.
    Role {
        User => "user",
        Manager => "manager",
        Admin => "admin",
    }
}

impl Role {
    pub fn at_least(&self, required: Role) -> bool {
        *self >= required
    }
}

text_enum! {
    OrderType {
        Purchase => "purchase",
        Rental => "rental",
        Reservation => "reservation",
    }
}

text_enum! {
    OrderStatus {
        Pending => "pending",
        Confirmed => "confirmed",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

text_enum! {
    TestDriveStatus {
        Pending => "pending",
        Confirmed => "confirmed",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

text_enum! {
    ServiceStatus {
        Scheduled => "scheduled",
        InProgress => "in_progress",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

text_enum! {
    EventStatus {
        Upcoming => "upcoming",
        InProgress => "in_progress",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

text_enum! {
    RegistrationStatus {
        Registered => "registered",
        Attended => "attended",
        Cancelled => "cancelled",
    }
}

text_enum! {
    ContactStatus {
        New => "new",
        InProgress => "in_progress",
        Responded => "responded",
        Closed => "closed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_ordering() {
        assert!(Role::Admin.at_least(Role::Manager));
        assert!(Role::Manager.at_least(Role::Manager));
        assert!(!Role::User.at_least(Role::Manager));
    }

    #[test]
    fn parses_wire_names() {
        assert_eq!("in_progress".parse::<ServiceStatus>(), Ok(ServiceStatus::InProgress));
        assert_eq!(OrderType::Reservation.as_str(), "reservation");
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn serde_uses_snake_case_names() {
        let json = serde_json::to_string(&ContactStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        let status: EventStatus = serde_json::from_str("\"upcoming\"").unwrap();
        assert_eq!(status, EventStatus::Upcoming);
    }
}
