//! Defines the token stored in the auth cookie and how to serialize/deserialize it.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::api::SessionToken;

mod datetime_format {
    //! Serializes a [time::OffsetDateTime] in a fixed-width format.
    //!
    //! The default serializer for [time::OffsetDateTime] writes
    //! "00:00:00.000000" as "0:00:00.0", which the deserializer then rejects
    //! because it expects two digit hours.
    use serde::{Deserialize, Deserializer, Serializer};
    use time::{
        OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description,
    };

    /// Date time format for the cookie expiry, e.g. "2021-01-01 00:00:00.000000 +00:00:00".
    const DATE_TIME_FORMAT: &[BorrowedFormatItem] = format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond] [offset_hour \
             sign:mandatory]:[offset_minute]:[offset_second]"
    );

    pub fn serialize<S>(date_time: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = date_time
            .format(DATE_TIME_FORMAT)
            .map_err(serde::ser::Error::custom)?;

        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;

        OffsetDateTime::parse(&text, DATE_TIME_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// The contents of the auth cookie: the remote API's session token and when
/// the cookie stops being accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub session: SessionToken,
    #[serde(with = "datetime_format")]
    pub expires_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use crate::api::SessionToken;

    use super::Token;

    #[test]
    fn token_survives_json_at_midnight() {
        let token = Token {
            session: SessionToken::new("abc"),
            expires_at: datetime!(2024-03-10 00:00:00 UTC),
        };

        let json = serde_json::to_string(&token).unwrap();
        let got: Token = serde_json::from_str(&json).unwrap();

        assert_eq!(got, token);
        assert!(json.contains("2024-03-10 00:00:00.0"), "got {json}");
    }
}
