use time::{format_description::FormatItem, macros::format_description, Date, OffsetDateTime};

pub const ISO_DATE: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

pub fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

pub fn parse_date(text: &str) -> Result<Date, time::error::Parse> {
    Date::parse(text.trim(), ISO_DATE)
}

/// Serde adapter for `YYYY-MM-DD` dates.
pub mod iso_date {
    use serde::{de::Error as _, ser::Error as _, Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S: Serializer>(date: &Date, s: S) -> Result<S::Ok, S::Error> {
        let text = date.format(super::ISO_DATE).map_err(S::Error::custom)?;
        s.serialize_str(&text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Date, D::Error> {
        let text = String::deserialize(d)?;
        super::parse_date(&text).map_err(D::Error::custom)
    }

    pub mod option {
        use serde::{de::Error as _, Deserialize, Deserializer, Serializer};
        use time::Date;

        pub fn serialize<S: Serializer>(date: &Option<Date>, s: S) -> Result<S::Ok, S::Error> {
            match date {
                Some(d) => super::serialize(d, s),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Date>, D::Error> {
            Option::<String>::deserialize(d)?
                .map(|text| super::super::parse_date(&text).map_err(D::Error::custom))
                .transpose()
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use time::macros::date;

    #[derive(Serialize, Deserialize)]
    struct Holder {
        #[serde(with = "super::iso_date")]
        on: time::Date,
        #[serde(default, with = "super::iso_date::option")]
        maybe: Option<time::Date>,
    }

    #[test]
    fn dates_use_iso_format() {
        let json = serde_json::to_string(&Holder { on: date!(2026 - 01 - 31), maybe: None }).unwrap();
        assert_eq!(json, r#"{"on":"2026-01-31","maybe":null}"#);

        let h: Holder = serde_json::from_str(r#"{"on":"2025-06-30"}"#).unwrap();
        assert_eq!(h.on, date!(2025 - 06 - 30));
        assert!(h.maybe.is_none());

        assert!(serde_json::from_str::<Holder>(r#"{"on":"30/06/2025"}"#).is_err());
    }
}
