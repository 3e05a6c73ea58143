use std::fmt;
use std::str::FromStr;

use serde::de::{value, Error};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Topic {
    Sensors,
    Status,
    Quotes,
    EmailNotifications,
    EmailPriority,
}

impl Topic {
    pub const fn inbound() -> [Topic; 2] {
        [Topic::Sensors, Topic::Status]
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Topic::Sensors => "auralink/sensors",
            Topic::Status => "auralink/status",
            Topic::Quotes => "auralink/quotes",
            Topic::EmailNotifications => "iot/email/notifications",
            Topic::EmailPriority => "iot/email/priority",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Topic {
    type Err = value::Error;

    fn from_str(s: &str) -> std::result::Result<Topic, Self::Err> {
        const ERROR_MSG: &str = "supported topics are auralink/sensors, auralink/status, \
            auralink/quotes, iot/email/notifications and iot/email/priority";

        match s {
            "auralink/sensors" => Ok(Topic::Sensors),
            "auralink/status" => Ok(Topic::Status),
            "auralink/quotes" => Ok(Topic::Quotes),
            "iot/email/notifications" => Ok(Topic::EmailNotifications),
            "iot/email/priority" => Ok(Topic::EmailPriority),
            _ => Err(value::Error::custom(ERROR_MSG)),
        }
    }
}
