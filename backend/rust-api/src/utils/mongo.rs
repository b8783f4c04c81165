use mongodb::error::{Error, ErrorKind, WriteFailure};

/// MongoDB server code for a unique index violation.
pub const DUPLICATE_KEY_CODE: i32 = 11000;

pub fn is_duplicate_key(err: &Error) -> bool {
    match *err.kind {
        ErrorKind::Write(WriteFailure::WriteError(ref we)) => we.code == DUPLICATE_KEY_CODE,
        ErrorKind::Command(ref ce) => ce.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}
