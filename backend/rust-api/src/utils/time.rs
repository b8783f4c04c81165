use chrono::{DateTime, Utc};
use mongodb::bson::DateTime as BsonDateTime;

pub fn chrono_to_bson(dt: DateTime<Utc>) -> BsonDateTime {
    BsonDateTime::from_millis(dt.timestamp_millis())
}

/// Current time at millisecond precision, the resolution MongoDB stores.
pub fn now_bson() -> BsonDateTime {
    chrono_to_bson(Utc::now())
}
